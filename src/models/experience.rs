// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Experiences, tracks, checkpoints and user points as held in the local store.

use uuid::Uuid;

use crate::models::telemetry::{Telemetry, TelemetryError};
use crate::models::{GeoPoint, Region};

/// A named collection of tracks and user points.
#[derive(Debug, Clone, PartialEq)]
pub struct Experience {
    /// Local surrogate id (not stable across syncs)
    pub id: i64,
    /// Stable cross-device identifier
    pub uuid: Uuid,
    pub name: String,
    pub region: Option<Region>,
    pub tracks: Vec<Track>,
    pub user_points: Vec<UserPoint>,
}

/// An ordered path of checkpoints, with recorded traversals.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub checkpoints: Vec<Checkpoint>,
    pub telemetries: Vec<Telemetry>,
}

impl Track {
    /// The telemetry with the shortest total duration.
    pub fn best_telemetry(&self) -> Result<&Telemetry, TelemetryError> {
        self.telemetries
            .iter()
            .min_by_key(|t| t.duration())
            .ok_or_else(|| TelemetryError::NotFound(self.uuid.to_string()))
    }
}

/// A waypoint on a track, identified by its ordinal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Checkpoint {
    pub num: i64,
    pub point: GeoPoint,
}

/// A user-placed point of interest.
#[derive(Debug, Clone, PartialEq)]
pub struct UserPoint {
    pub point: GeoPoint,
    pub name: Option<String>,
}

impl UserPoint {
    pub fn new(point: GeoPoint) -> Self {
        Self { point, name: None }
    }
}
