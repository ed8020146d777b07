// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outbound document builder.
//!
//! Collects the locally recorded data of each experience (user points and
//! telemetries) into the document uploaded to the cloud service. The same
//! document can be rendered to a string or streamed onto any writer.

use std::io::Write;

use crate::error::{Result, SyncError};
use crate::models::wire::{OutboundExperienceData, OutboundRoot, OutboundTelemetry, UserPointEntity};
use crate::models::{Experience, Track};
use crate::time_utils::secs_to_millis;

/// Name given to user points that have none.
fn default_point_name(n: usize) -> String {
    format!("Custom point #{}", n)
}

/// Builds the outbound document from local experiences.
#[derive(Debug, Default, Clone)]
pub struct OutboundStreamBuilder {
    root: OutboundRoot,
}

impl OutboundStreamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one experience's locally collected data.
    ///
    /// User points are numbered per experience from 0; the number is only
    /// used for points without a name. Fails with `IllegalInput` if an event
    /// timestamp cannot be expressed in milliseconds.
    pub fn add_experience(&mut self, exp: &Experience) -> Result<()> {
        let user_points = exp
            .user_points
            .iter()
            .enumerate()
            .map(|(n, up)| UserPointEntity {
                latitude: up.point.latitude,
                longitude: up.point.longitude,
                name: Some(up.name.clone().unwrap_or_else(|| default_point_name(n))),
            })
            .collect();

        let mut telemetry_data = Vec::new();
        for track in &exp.tracks {
            for t in &track.telemetries {
                let events = t
                    .events
                    .iter()
                    .map(|e| event_millis(e.timestamp(), track))
                    .collect::<Result<Vec<_>>>()?;
                telemetry_data.push(OutboundTelemetry {
                    events,
                    track: track.uuid,
                });
            }
        }

        self.root.data.push(OutboundExperienceData {
            experience: exp.uuid,
            user_points,
            telemetry_data,
        });
        Ok(())
    }

    pub fn root(&self) -> &OutboundRoot {
        &self.root
    }

    /// Render the document as a JSON string.
    pub fn build(&self) -> Result<String> {
        serde_json::to_string(&self.root).map_err(encode_error)
    }

    /// Stream the document onto a writer. Output matches `build()` byte for
    /// byte before any transport escaping applied by the writer itself.
    pub fn stream<W: Write>(&self, mut out: W) -> Result<()> {
        serde_json::to_writer(&mut out, &self.root).map_err(encode_error)?;
        out.flush()?;
        Ok(())
    }
}

fn event_millis(secs: i64, track: &Track) -> Result<i64> {
    secs_to_millis(secs).ok_or_else(|| {
        SyncError::IllegalInput(format!(
            "Event timestamp {} on track {} is out of range",
            secs, track.uuid
        ))
    })
}

fn encode_error(e: serde_json::Error) -> SyncError {
    if e.is_io() {
        SyncError::Unreachable(e.to_string())
    } else {
        SyncError::IllegalInput(format!("Unable to encode outbound document: {}", e))
    }
}
