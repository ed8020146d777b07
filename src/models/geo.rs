// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Geographic points and NW/SE bounding regions.

use serde::{Deserialize, Serialize};

/// A point on the globe, in floating point degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Rectangular region delimited by its north-west and south-east corners.
///
/// On the wire both corners are required (`topLeft`, `bottomRight`); a
/// rectangle with a missing corner never gets past deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    #[serde(rename = "topLeft")]
    pub north_west: GeoPoint,
    #[serde(rename = "bottomRight")]
    pub south_east: GeoPoint,
}

impl Region {
    pub fn new(north_west: GeoPoint, south_east: GeoPoint) -> Self {
        Self {
            north_west,
            south_east,
        }
    }

    /// Check whether a point lies inside the region (edges included).
    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.latitude <= self.north_west.latitude
            && point.latitude >= self.south_east.latitude
            && point.longitude >= self.north_west.longitude
            && point.longitude <= self.south_east.longitude
    }
}
