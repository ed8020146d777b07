// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use std::time::Duration;

use trail_sync::error::{Result, SyncError};
use trail_sync::models::{Experience, GeoPoint, Region, Telemetry, Track, UserPoint};
use trail_sync::services::{HttpNetProxy, InboundStream, NetProxy, OutboundStream, ProxyState};
use uuid::Uuid;
use wiremock::MockServer;

pub const EXPERIENCE_UUID: &str = "b989daae-9102-409b-abac-e428afe38baf";
pub const TRACK_UUID: &str = "af024d00-e2d5-4fae-8bad-8b16f823a2cc";

/// 2015-07-21T00:00:00Z in epoch milliseconds.
#[allow(dead_code)]
pub const MIDNIGHT_MS: i64 = 1_437_436_800_000;

#[allow(dead_code)]
pub fn region(nw_lat: f64, nw_lon: f64, se_lat: f64, se_lon: f64) -> Region {
    Region::new(GeoPoint::new(nw_lat, nw_lon), GeoPoint::new(se_lat, se_lon))
}

/// The reference experience: one unnamed user point and one track with two
/// recorded traversals.
#[allow(dead_code)]
pub fn sample_experience() -> Experience {
    Experience {
        id: 1,
        uuid: Uuid::parse_str(EXPERIENCE_UUID).expect("valid uuid"),
        name: "Experience_1".to_string(),
        region: None,
        tracks: vec![Track {
            id: 1,
            uuid: Uuid::parse_str(TRACK_UUID).expect("valid uuid"),
            name: "Track_1".to_string(),
            checkpoints: vec![],
            telemetries: vec![
                Telemetry::from_checkpoint_times(&[123456, 654321]),
                Telemetry::from_checkpoint_times(&[56789, 98765]),
            ],
        }],
        user_points: vec![UserPoint::new(GeoPoint::new(13.0, 73.0))],
    }
}

/// A complete inbound snapshot with one experience, one contact and one
/// forecast.
#[allow(dead_code)]
pub fn sample_inbound_json() -> String {
    format!(
        r#"{{
            "experiences": [{{
                "id": "{exp}",
                "name": "Experience_1",
                "boundingRect": {{"topLeft": {{"latitude": 46.0, "longitude": 11.0}},
                                  "bottomRight": {{"latitude": 45.0, "longitude": 12.0}}}},
                "userPoints": [{{"latitude": 45.5, "longitude": 11.5, "name": "Hut"}}],
                "tracks": [{{
                    "id": "{track}",
                    "name": "Track_1",
                    "checkPoints": [
                        {{"id": 1, "latitude": 45.1, "longitude": 11.1}},
                        {{"id": 2, "latitude": 45.2, "longitude": 11.2}}
                    ],
                    "bestTelemetry": {{"events": [1437505820000, 1437506420000]}}
                }}]
            }}],
            "emergencyData": [{{
                "name": "Soccorso Alpino",
                "number": "118",
                "boundingRect": {{"topLeft": {{"latitude": 46.0, "longitude": 11.0}},
                                  "bottomRight": {{"latitude": 45.0, "longitude": 12.0}}}}
            }}],
            "weatherData": [{{
                "date": {date},
                "boundingRect": {{"topLeft": {{"latitude": 46.0, "longitude": 11.0}},
                                  "bottomRight": {{"latitude": 45.0, "longitude": 12.0}}}},
                "morning": {{"forecast": "SUNNY", "temperature": 20.4}},
                "afternoon": {{"forecast": "CLOUDY", "temperature": 22.6}},
                "night": {{"forecast": "RAINY", "temperature": 11.0}}
            }}]
        }}"#,
        exp = EXPERIENCE_UUID,
        track = TRACK_UUID,
        date = MIDNIGHT_MS
    )
}

/// HTTP proxy pointed at a mock server.
#[allow(dead_code)]
pub fn http_proxy(server: &MockServer) -> HttpNetProxy {
    HttpNetProxy::new(format!("{}/", server.uri()), "device-42", Duration::from_secs(5))
        .expect("client builds")
}

/// In-memory proxy with scripted responses, for orchestrator tests.
#[allow(dead_code)]
#[derive(Default)]
pub struct ScriptedProxy {
    /// Body returned by `read()`
    pub inbound: String,
    /// Error returned by `read()` instead of a body
    pub fail_read: Option<fn() -> SyncError>,
    /// Error returned by `success()` on the outbound connection
    pub fail_upload: Option<fn() -> SyncError>,
    /// Make `success()` answer `Ok(false)` on the outbound connection
    pub unconfirmed_upload: bool,
    /// Make `success()` answer `Ok(false)` on the inbound connection
    pub unconfirmed_download: bool,
    /// Outbound bodies, in submission order
    pub uploads: Vec<Vec<u8>>,
    pub disconnects: usize,
    outbound: Option<OutboundStream>,
    inbound_open: bool,
}

#[allow(dead_code)]
impl ScriptedProxy {
    pub fn serving(inbound: impl Into<String>) -> Self {
        Self {
            inbound: inbound.into(),
            ..Self::default()
        }
    }

    fn connected(&self) -> bool {
        self.outbound.is_some() || self.inbound_open
    }
}

impl NetProxy for ScriptedProxy {
    async fn pre_auth(&mut self) -> Result<String> {
        Ok("123456".to_string())
    }

    async fn auth(&mut self) -> Result<()> {
        Ok(())
    }

    fn write(&mut self) -> Result<&mut OutboundStream> {
        if self.connected() {
            return Err(SyncError::programmer("already connected"));
        }
        Ok(self.outbound.insert(OutboundStream::new()))
    }

    async fn read(&mut self) -> Result<InboundStream> {
        if self.connected() {
            return Err(SyncError::programmer("already connected"));
        }
        if let Some(fail) = self.fail_read {
            return Err(fail());
        }
        self.inbound_open = true;
        Ok(InboundStream::from(self.inbound.as_str()))
    }

    async fn success(&mut self) -> Result<bool> {
        if let Some(stream) = &self.outbound {
            self.uploads.push(stream.body().to_vec());
            if let Some(fail) = self.fail_upload {
                return Err(fail());
            }
            return Ok(!self.unconfirmed_upload);
        }
        if self.inbound_open {
            return Ok(!self.unconfirmed_download);
        }
        Err(SyncError::programmer("no connection"))
    }

    fn disconnect(&mut self) -> Result<()> {
        if !self.connected() {
            return Err(SyncError::NotConnected);
        }
        self.outbound = None;
        self.inbound_open = false;
        self.disconnects += 1;
        Ok(())
    }

    fn state(&self) -> ProxyState {
        if self.connected() {
            ProxyState::Connected
        } else {
            ProxyState::Authorized
        }
    }
}
