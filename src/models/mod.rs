// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod contact;
pub mod experience;
pub mod geo;
pub mod raster;
pub mod telemetry;
pub mod weather;
pub mod wire;

pub use contact::EmergencyContact;
pub use experience::{Checkpoint, Experience, Track, UserPoint};
pub use geo::{GeoPoint, Region};
pub use raster::Raster;
pub use telemetry::{Telemetry, TelemetryError, TelemetryEvent};
pub use weather::{DayPartForecast, WeatherCondition, WeatherForecast};
pub use wire::{InboundRoot, OutboundRoot};
