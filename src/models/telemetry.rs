// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recorded traversals of a track.

use crate::models::GeoPoint;

/// A timestamped event recorded during a traversal. Timestamps are epoch seconds.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    CheckpointReached { timestamp: i64, checkpoint: i64 },
    HeartRate { timestamp: i64, bpm: u32 },
    Location { timestamp: i64, point: GeoPoint },
}

impl TelemetryEvent {
    pub fn timestamp(&self) -> i64 {
        match self {
            TelemetryEvent::CheckpointReached { timestamp, .. }
            | TelemetryEvent::HeartRate { timestamp, .. }
            | TelemetryEvent::Location { timestamp, .. } => *timestamp,
        }
    }
}

/// One traversal of a track: an ordered list of events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Telemetry {
    pub events: Vec<TelemetryEvent>,
}

impl Telemetry {
    pub fn new(events: Vec<TelemetryEvent>) -> Self {
        Self { events }
    }

    /// Build a telemetry made only of checkpoint-reached events, numbered from 0.
    pub fn from_checkpoint_times(timestamps: &[i64]) -> Self {
        let events = timestamps
            .iter()
            .enumerate()
            .map(|(i, &timestamp)| TelemetryEvent::CheckpointReached {
                timestamp,
                checkpoint: i as i64,
            })
            .collect();
        Self { events }
    }

    /// Total duration in seconds, from the first to the last event.
    pub fn duration(&self) -> i64 {
        match (self.events.first(), self.events.last()) {
            (Some(first), Some(last)) => last.timestamp() - first.timestamp(),
            _ => 0,
        }
    }

    /// Only the checkpoint-reached events, in recording order.
    pub fn checkpoint_events(&self) -> impl Iterator<Item = &TelemetryEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, TelemetryEvent::CheckpointReached { .. }))
    }
}

/// Errors from telemetry queries.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("No telemetry recorded for track {0}")]
    NotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_spans_first_to_last() {
        let t = Telemetry::from_checkpoint_times(&[100, 150, 400]);
        assert_eq!(t.duration(), 300);
    }

    #[test]
    fn test_duration_of_empty_telemetry() {
        assert_eq!(Telemetry::default().duration(), 0);
    }

    #[test]
    fn test_checkpoint_events_filter() {
        let t = Telemetry::new(vec![
            TelemetryEvent::CheckpointReached {
                timestamp: 10,
                checkpoint: 0,
            },
            TelemetryEvent::HeartRate {
                timestamp: 11,
                bpm: 120,
            },
            TelemetryEvent::Location {
                timestamp: 12,
                point: GeoPoint::new(1.0, 2.0),
            },
        ]);
        assert_eq!(t.checkpoint_events().count(), 1);
        assert_eq!(t.duration(), 2);
    }
}
