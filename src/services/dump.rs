// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dump builder: turns an inbound snapshot into an ordered batch of typed
//! local-store mutations.
//!
//! The batch always has the same shape:
//!
//! 1. `Begin`
//! 2. a `Flush` of every synced table
//! 3. experiences, each followed by its user points, rasters and tracks
//!    (each track followed by its checkpoints and best telemetry)
//! 4. emergency contacts
//! 5. weather forecasts
//! 6. `Commit`
//!
//! Statements are plain data; the local store decides how to apply them and
//! must do so atomically. Validation happens while the batch is built, so a
//! rejected snapshot never yields a partial batch.

use uuid::Uuid;

use crate::db::tables;
use crate::error::{Result, SyncError};
use crate::models::wire::{
    ExperienceEntity, ForecastEntity, InboundRoot, TrackEntity, WeatherDataEntity,
};
use crate::models::{DayPartForecast, GeoPoint, Region};
use crate::time_utils::{is_utc_midnight, millis_to_secs};

/// Tables replaced by a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Experiences,
    UserPoints,
    Tracks,
    Checkpoints,
    Rasters,
    TelemetryEventsCheckp,
    Telemetries,
    WeatherForecasts,
    Contacts,
}

impl Table {
    /// Flush order: dependent tables never outlive their parents.
    pub const ALL: [Table; 9] = [
        Table::Experiences,
        Table::UserPoints,
        Table::Tracks,
        Table::Checkpoints,
        Table::Rasters,
        Table::TelemetryEventsCheckp,
        Table::Telemetries,
        Table::WeatherForecasts,
        Table::Contacts,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::Experiences => tables::EXPERIENCES,
            Table::UserPoints => tables::USER_POINTS,
            Table::Tracks => tables::TRACKS,
            Table::Checkpoints => tables::CHECKPOINTS,
            Table::Rasters => tables::RASTERS,
            Table::TelemetryEventsCheckp => tables::TELEMETRY_EVENTS_CHECKP,
            Table::Telemetries => tables::TELEMETRIES,
            Table::WeatherForecasts => tables::WEATHER_FORECASTS,
            Table::Contacts => tables::CONTACTS,
        }
    }
}

/// One mutation of the local store.
#[derive(Debug, Clone, PartialEq)]
pub enum DumpStatement {
    Begin,
    Flush(Table),
    InsertExperience {
        id: i64,
        uuid: Uuid,
        name: String,
        region: Option<Region>,
    },
    InsertUserPoint {
        experience_id: i64,
        point: GeoPoint,
        name: Option<String>,
    },
    InsertRaster {
        experience_id: i64,
        region: Region,
        image: String,
    },
    InsertTrack {
        id: i64,
        uuid: Uuid,
        name: String,
        experience_id: i64,
    },
    InsertCheckpoint {
        track_id: i64,
        num: i64,
        point: GeoPoint,
    },
    InsertTelemetry {
        id: i64,
        track_id: i64,
    },
    /// `timestamp` is in epoch seconds
    InsertCheckpointEvent {
        telemetry_id: i64,
        timestamp: i64,
        checkpoint: i64,
    },
    InsertContact {
        name: String,
        number: String,
        region: Region,
    },
    /// `date` is midnight UTC in epoch seconds
    InsertWeather {
        date: i64,
        morning: DayPartForecast,
        afternoon: DayPartForecast,
        night: DayPartForecast,
        region: Region,
    },
    Commit,
}

/// An ordered batch of statements to apply as one unit of work.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dump {
    statements: Vec<DumpStatement>,
}

impl Dump {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stmt: DumpStatement) {
        self.statements.push(stmt);
    }

    pub fn statements(&self) -> &[DumpStatement] {
        &self.statements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DumpStatement> {
        self.statements.iter()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Whether the batch is wrapped in `Begin` ... `Commit`.
    pub fn is_framed(&self) -> bool {
        matches!(self.statements.first(), Some(DumpStatement::Begin))
            && matches!(self.statements.last(), Some(DumpStatement::Commit))
            && self.statements.len() >= 2
    }
}

impl<'a> IntoIterator for &'a Dump {
    type Item = &'a DumpStatement;
    type IntoIter = std::slice::Iter<'a, DumpStatement>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.iter()
    }
}

impl From<Vec<DumpStatement>> for Dump {
    fn from(statements: Vec<DumpStatement>) -> Self {
        Self { statements }
    }
}

/// Builds the replacement dump for one inbound snapshot.
pub struct DumpBuilder<'a> {
    root: &'a InboundRoot,
    next_experience_id: i64,
    next_track_id: i64,
    next_telemetry_id: i64,
}

impl<'a> DumpBuilder<'a> {
    pub fn new(root: &'a InboundRoot) -> Self {
        Self {
            root,
            next_experience_id: 1,
            next_track_id: 1,
            next_telemetry_id: 1,
        }
    }

    /// Produce the full batch, or fail without producing anything.
    ///
    /// Fails with `IllegalInput` when a track carries more than one best
    /// telemetry, and with `InvalidSchedule` when a weather entry is not at
    /// midnight UTC.
    pub fn build(mut self) -> Result<Dump> {
        let mut dump = Dump::new();
        dump.push(DumpStatement::Begin);
        for table in Table::ALL {
            dump.push(DumpStatement::Flush(table));
        }

        let root = self.root;
        for exp in &root.experiences {
            self.push_experience(&mut dump, exp)?;
        }

        for contact in &root.emergency_data {
            dump.push(DumpStatement::InsertContact {
                name: contact.name.clone(),
                number: contact.number.clone(),
                region: contact.bounding_rect,
            });
        }

        for weather in &root.weather_data {
            dump.push(weather_statement(weather)?);
        }

        dump.push(DumpStatement::Commit);

        tracing::debug!(
            statements = dump.len(),
            experiences = self.next_experience_id - 1,
            tracks = self.next_track_id - 1,
            "Built replacement dump"
        );

        Ok(dump)
    }

    fn push_experience(&mut self, dump: &mut Dump, exp: &ExperienceEntity) -> Result<()> {
        let experience_id = self.next_experience_id;
        self.next_experience_id += 1;
        let uuid = exp.stable_id();

        dump.push(DumpStatement::InsertExperience {
            id: experience_id,
            uuid,
            name: exp.name.clone(),
            region: exp.bounding_rect,
        });

        for up in &exp.user_points {
            dump.push(DumpStatement::InsertUserPoint {
                experience_id,
                point: GeoPoint::new(up.latitude, up.longitude),
                name: up.name.clone(),
            });
        }

        for raster in &exp.raster_data {
            dump.push(DumpStatement::InsertRaster {
                experience_id,
                region: raster.bounding_rect,
                image: raster.image.trim().to_string(),
            });
        }

        for (position, track) in exp.tracks.iter().enumerate() {
            self.push_track(dump, track, &uuid, position, experience_id)?;
        }

        Ok(())
    }

    fn push_track(
        &mut self,
        dump: &mut Dump,
        track: &TrackEntity,
        experience: &Uuid,
        position: usize,
        experience_id: i64,
    ) -> Result<()> {
        let track_id = self.next_track_id;
        self.next_track_id += 1;

        dump.push(DumpStatement::InsertTrack {
            id: track_id,
            uuid: track.stable_id(experience, position),
            name: track.name.clone(),
            experience_id,
        });

        for cp in &track.checkpoints {
            dump.push(DumpStatement::InsertCheckpoint {
                track_id,
                num: cp.id,
                point: GeoPoint::new(cp.latitude, cp.longitude),
            });
        }

        let best = match track.best_telemetry.as_slice() {
            [] => return Ok(()),
            [best] => best,
            many => {
                return Err(SyncError::IllegalInput(format!(
                    "Track '{}' has {} best telemetries, expected at most one",
                    track.name,
                    many.len()
                )))
            }
        };

        let telemetry_id = self.next_telemetry_id;
        self.next_telemetry_id += 1;

        dump.push(DumpStatement::InsertTelemetry {
            id: telemetry_id,
            track_id,
        });
        for (n, &millis) in best.events.iter().enumerate() {
            dump.push(DumpStatement::InsertCheckpointEvent {
                telemetry_id,
                timestamp: millis_to_secs(millis),
                checkpoint: n as i64,
            });
        }

        Ok(())
    }
}

fn weather_statement(w: &WeatherDataEntity) -> Result<DumpStatement> {
    if !is_utc_midnight(w.date) {
        return Err(SyncError::InvalidSchedule(format!(
            "Weather date {} is not midnight UTC",
            w.date
        )));
    }

    Ok(DumpStatement::InsertWeather {
        date: millis_to_secs(w.date),
        morning: day_part(&w.morning),
        afternoon: day_part(&w.afternoon),
        night: day_part(&w.night),
        region: w.bounding_rect,
    })
}

fn day_part(f: &ForecastEntity) -> DayPartForecast {
    DayPartForecast {
        condition: f.forecast,
        temperature: f.temperature.round() as i64,
    }
}
