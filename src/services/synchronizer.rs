// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sync orchestrator.
//!
//! Ties the proxy, the local store and the codecs together:
//! 1. Upload locally collected data (user points, telemetries)
//! 2. Download the server snapshot
//! 3. Replace the synced local tables with it, atomically
//!
//! Any failure triggers a best-effort disconnect and is returned unchanged.

use crate::db::{DumpSink, ExperienceSource};
use crate::error::{Result, SyncError};
use crate::services::dump::DumpBuilder;
use crate::services::inbound::InboundParser;
use crate::services::net_proxy::NetProxy;
use crate::services::outbound::OutboundStreamBuilder;

/// Drives a full pairing and sync against the cloud service.
pub struct Synchronizer<P, K, S> {
    proxy: P,
    sink: K,
    source: S,
    parser: InboundParser,
}

impl<P, K, S> Synchronizer<P, K, S>
where
    P: NetProxy,
    K: DumpSink,
    S: ExperienceSource,
{
    pub fn new(proxy: P, sink: K, source: S) -> Self {
        Self {
            proxy,
            sink,
            source,
            parser: InboundParser::new(),
        }
    }

    /// Start pairing; returns the token to show to the user.
    pub async fn pre_auth(&mut self) -> Result<String> {
        self.proxy.pre_auth().await
    }

    /// Complete pairing once the user has confirmed the token.
    pub async fn auth(&mut self) -> Result<()> {
        self.proxy.auth().await
    }

    /// Upload local data, then replace local state with the server snapshot.
    pub async fn sync(&mut self) -> Result<()> {
        tracing::info!("Starting sync");

        if let Err(e) = self.send().await {
            return Err(self.abort("send", e));
        }
        if let Err(e) = self.get().await {
            return Err(self.abort("get", e));
        }

        tracing::info!("Sync complete");
        Ok(())
    }

    pub fn proxy(&self) -> &P {
        &self.proxy
    }

    /// Give back the collaborators, e.g. to inspect them after a sync.
    pub fn into_parts(self) -> (P, K, S) {
        (self.proxy, self.sink, self.source)
    }

    async fn send(&mut self) -> Result<()> {
        let experiences = self.source.experiences()?;

        let mut builder = OutboundStreamBuilder::new();
        for exp in &experiences {
            builder.add_experience(exp)?;
        }

        let stream = self.proxy.write()?;
        builder.stream(stream)?;
        self.check_success().await?;
        self.proxy.disconnect()?;

        tracing::info!(experiences = experiences.len(), "Uploaded local data");
        Ok(())
    }

    async fn get(&mut self) -> Result<()> {
        let stream = self.proxy.read().await?;
        let root = self
            .parser
            .parse(stream)?
            .ok_or_else(|| SyncError::Unreachable("Server returned an empty document".to_string()))?;

        let dump = DumpBuilder::new(&root).build()?;
        self.sink.load(&dump)?;
        self.check_success().await?;
        self.proxy.disconnect()?;

        tracing::info!(
            experiences = root.experiences.len(),
            contacts = root.emergency_data.len(),
            forecasts = root.weather_data.len(),
            "Replaced local data with server snapshot"
        );
        Ok(())
    }

    /// A proxy answering `false` without an error still fails the phase.
    async fn check_success(&mut self) -> Result<()> {
        if !self.proxy.success().await? {
            return Err(SyncError::Unreachable("Unknown network error".to_string()));
        }
        Ok(())
    }

    /// Close any open connection and hand back the original error.
    fn abort(&mut self, phase: &str, err: SyncError) -> SyncError {
        match self.proxy.disconnect() {
            Ok(()) => {}
            Err(e) if e.is_not_connected() => {}
            Err(e) => tracing::warn!(error = %e, "Disconnect after failure also failed"),
        }
        tracing::warn!(phase, error = %err, "Sync failed");
        err
    }
}
