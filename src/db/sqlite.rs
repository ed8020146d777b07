// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite local store.
//!
//! Serves both directions of a sync: it is the source of locally recorded
//! experiences and the sink that applies replacement dumps. Dumps run in a
//! single transaction, so other connections only ever see the old or the
//! new snapshot.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use uuid::Uuid;

use crate::db::schema::{CURRENT_VERSION, SCHEMA, SCHEMA_VERSION_TABLE};
use crate::db::{DumpSink, ExperienceSource};
use crate::error::{Result, SyncError};
use crate::models::{
    Checkpoint, DayPartForecast, EmergencyContact, Experience, GeoPoint, Raster, Region, Telemetry,
    TelemetryEvent, Track, UserPoint, WeatherCondition, WeatherForecast,
};
use crate::services::dump::{Dump, DumpStatement, Table};
use crate::time_utils::midnight_secs;

/// Handle to the local store. Clones share one connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| SyncError::Storage(format!("{}: {}", parent.display(), e)))?;
            }
        }

        Self::initialize(Connection::open(path)?)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA_VERSION_TABLE)?;

        let version: i32 = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )?;

        if version < 1 {
            conn.execute_batch(SCHEMA)?;
            conn.execute(
                "INSERT INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
                [CURRENT_VERSION],
            )?;
            tracing::info!(version = CURRENT_VERSION, "Local store schema created");
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SyncError::Storage("Connection lock poisoned".to_string()))
    }

    /// Number of rows currently in a synced table.
    pub fn row_count(&self, table: Table) -> Result<i64> {
        let conn = self.lock()?;
        let sql = format!("SELECT COUNT(*) FROM {}", table.name());
        Ok(conn.query_row(&sql, [], |row| row.get(0))?)
    }

    // ========== Local writes ==========

    /// Insert an experience; returns its local id.
    pub fn create_experience(&self, uuid: Uuid, name: &str, region: Option<Region>) -> Result<i64> {
        let conn = self.lock()?;
        insert_experience(&conn, None, &uuid, name, region.as_ref())?;
        Ok(conn.last_insert_rowid())
    }

    /// Insert a track under an experience; returns its local id.
    pub fn create_track(&self, experience_id: i64, uuid: Uuid, name: &str) -> Result<i64> {
        let conn = self.lock()?;
        insert_track(&conn, None, &uuid, name, experience_id)?;
        Ok(conn.last_insert_rowid())
    }

    pub fn add_checkpoint(&self, track_id: i64, checkpoint: &Checkpoint) -> Result<()> {
        let conn = self.lock()?;
        insert_checkpoint(&conn, track_id, checkpoint.num, &checkpoint.point)
    }

    /// Add a user point to an experience; returns its local id.
    pub fn add_user_point(&self, experience_id: i64, point: &UserPoint) -> Result<i64> {
        let conn = self.lock()?;
        insert_user_point(&conn, experience_id, &point.point, point.name.as_deref())?;
        Ok(conn.last_insert_rowid())
    }

    /// Store a recorded traversal of a track; returns the telemetry id.
    ///
    /// Only checkpoint-reached events are kept.
    pub fn record_telemetry(&self, track_id: i64, telemetry: &Telemetry) -> Result<i64> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO telemetries (telem_track) VALUES (?1)",
            params![track_id],
        )?;
        let telemetry_id = tx.last_insert_rowid();

        for event in telemetry.checkpoint_events() {
            if let TelemetryEvent::CheckpointReached {
                timestamp,
                checkpoint,
            } = event
            {
                insert_checkpoint_event(&tx, telemetry_id, *timestamp, *checkpoint)?;
            }
        }

        tx.commit()?;
        tracing::debug!(track_id, telemetry_id, "Recorded telemetry");
        Ok(telemetry_id)
    }

    // ========== Reads ==========

    /// Emergency contacts whose jurisdiction covers `point`.
    pub fn contacts_at(&self, point: GeoPoint) -> Result<Vec<EmergencyContact>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT contact_name, contact_value,
                    contact_nw_corner_latitude, contact_nw_corner_longitude,
                    contact_se_corner_latitude, contact_se_corner_longitude
             FROM contacts ORDER BY contact_id",
        )?;

        let contacts = stmt
            .query_map([], |row| {
                Ok(EmergencyContact {
                    name: row.get(0)?,
                    number: row.get(1)?,
                    region: region_at(row, 2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(contacts
            .into_iter()
            .filter(|c| c.region.contains(&point))
            .collect())
    }

    /// The forecast covering `point` on `date`, if any.
    pub fn weather_at(&self, point: GeoPoint, date: NaiveDate) -> Result<Option<WeatherForecast>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT weather_condition_morning, weather_temperature_morning,
                    weather_condition_afternoon, weather_temperature_afternoon,
                    weather_condition_night, weather_temperature_night,
                    weather_nw_corner_latitude, weather_nw_corner_longitude,
                    weather_se_corner_latitude, weather_se_corner_longitude
             FROM weather_forecasts WHERE weather_date = ?1 ORDER BY weather_id",
        )?;

        let rows = stmt
            .query_map(params![midnight_secs(date)], |row| {
                Ok((
                    [
                        (row.get::<_, i64>(0)?, row.get::<_, i64>(1)?),
                        (row.get::<_, i64>(2)?, row.get::<_, i64>(3)?),
                        (row.get::<_, i64>(4)?, row.get::<_, i64>(5)?),
                    ],
                    region_at(row, 6)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for ([morning, afternoon, night], region) in rows {
            if region.contains(&point) {
                return Ok(Some(WeatherForecast {
                    date,
                    morning: day_part(morning)?,
                    afternoon: day_part(afternoon)?,
                    night: day_part(night)?,
                    region,
                }));
            }
        }
        Ok(None)
    }

    /// Map tiles of an experience, in insertion order.
    pub fn rasters_for(&self, experience_id: i64) -> Result<Vec<Raster>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT raster_nw_corner_latitude, raster_nw_corner_longitude,
                    raster_se_corner_latitude, raster_se_corner_longitude, raster_base64
             FROM rasters WHERE raster_experience = ?1 ORDER BY raster_id",
        )?;

        let rasters = stmt
            .query_map(params![experience_id], |row| {
                Ok(Raster {
                    region: region_at(row, 0)?,
                    base64: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rasters)
    }

    /// Look up an experience's local id by its stable id.
    pub fn experience_id(&self, uuid: &Uuid) -> Result<Option<i64>> {
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                "SELECT experience_id FROM experiences WHERE experience_uuid = ?1",
                params![uuid.to_string()],
                |row| row.get(0),
            )
            .optional()?)
    }
}

impl DumpSink for SqliteStore {
    fn load(&self, dump: &Dump) -> Result<()> {
        if !dump.is_framed() {
            return Err(SyncError::IllegalInput(
                "Dump must start with Begin and end with Commit".to_string(),
            ));
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let body = &dump.statements()[1..dump.len() - 1];
        for stmt in body {
            // Dropping the transaction on error rolls everything back.
            apply(&tx, stmt)?;
        }

        tx.commit()?;
        tracing::info!(statements = dump.len(), "Applied dump to local store");
        Ok(())
    }
}

impl ExperienceSource for SqliteStore {
    fn experiences(&self) -> Result<Vec<Experience>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT experience_id, experience_uuid, experience_name,
                    experience_nw_corner_latitude, experience_nw_corner_longitude,
                    experience_se_corner_latitude, experience_se_corner_longitude
             FROM experiences ORDER BY experience_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    optional_region_at(row, 3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut experiences = Vec::with_capacity(rows.len());
        for (id, uuid, name, region) in rows {
            experiences.push(Experience {
                id,
                uuid: parse_uuid(&uuid)?,
                name,
                region,
                tracks: load_tracks(&conn, id)?,
                user_points: load_user_points(&conn, id)?,
            });
        }

        Ok(experiences)
    }
}

fn apply(tx: &Transaction<'_>, stmt: &DumpStatement) -> Result<()> {
    match stmt {
        DumpStatement::Begin | DumpStatement::Commit => {
            return Err(SyncError::IllegalInput(
                "Transaction markers are only allowed at the edges of a dump".to_string(),
            ))
        }
        DumpStatement::Flush(table) => {
            tx.execute(&format!("DELETE FROM {}", table.name()), [])?;
        }
        DumpStatement::InsertExperience {
            id,
            uuid,
            name,
            region,
        } => insert_experience(tx, Some(*id), uuid, name, region.as_ref())?,
        DumpStatement::InsertUserPoint {
            experience_id,
            point,
            name,
        } => insert_user_point(tx, *experience_id, point, name.as_deref())?,
        DumpStatement::InsertRaster {
            experience_id,
            region,
            image,
        } => {
            tx.execute(
                "INSERT INTO rasters (raster_experience,
                    raster_nw_corner_latitude, raster_nw_corner_longitude,
                    raster_se_corner_latitude, raster_se_corner_longitude, raster_base64)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    experience_id,
                    region.north_west.latitude,
                    region.north_west.longitude,
                    region.south_east.latitude,
                    region.south_east.longitude,
                    image
                ],
            )?;
        }
        DumpStatement::InsertTrack {
            id,
            uuid,
            name,
            experience_id,
        } => insert_track(tx, Some(*id), uuid, name, *experience_id)?,
        DumpStatement::InsertCheckpoint {
            track_id,
            num,
            point,
        } => insert_checkpoint(tx, *track_id, *num, point)?,
        DumpStatement::InsertTelemetry { id, track_id } => {
            tx.execute(
                "INSERT INTO telemetries (telem_id, telem_track) VALUES (?1, ?2)",
                params![id, track_id],
            )?;
        }
        DumpStatement::InsertCheckpointEvent {
            telemetry_id,
            timestamp,
            checkpoint,
        } => insert_checkpoint_event(tx, *telemetry_id, *timestamp, *checkpoint)?,
        DumpStatement::InsertContact {
            name,
            number,
            region,
        } => {
            tx.execute(
                "INSERT INTO contacts (contact_name, contact_value,
                    contact_nw_corner_latitude, contact_nw_corner_longitude,
                    contact_se_corner_latitude, contact_se_corner_longitude)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    name,
                    number,
                    region.north_west.latitude,
                    region.north_west.longitude,
                    region.south_east.latitude,
                    region.south_east.longitude
                ],
            )?;
        }
        DumpStatement::InsertWeather {
            date,
            morning,
            afternoon,
            night,
            region,
        } => {
            tx.execute(
                "INSERT INTO weather_forecasts (weather_date,
                    weather_condition_morning, weather_temperature_morning,
                    weather_condition_afternoon, weather_temperature_afternoon,
                    weather_condition_night, weather_temperature_night,
                    weather_nw_corner_latitude, weather_nw_corner_longitude,
                    weather_se_corner_latitude, weather_se_corner_longitude)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    date,
                    morning.condition.code(),
                    morning.temperature,
                    afternoon.condition.code(),
                    afternoon.temperature,
                    night.condition.code(),
                    night.temperature,
                    region.north_west.latitude,
                    region.north_west.longitude,
                    region.south_east.latitude,
                    region.south_east.longitude
                ],
            )?;
        }
    }
    Ok(())
}

fn insert_experience(
    conn: &Connection,
    id: Option<i64>,
    uuid: &Uuid,
    name: &str,
    region: Option<&Region>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO experiences (experience_id, experience_uuid, experience_name,
            experience_nw_corner_latitude, experience_nw_corner_longitude,
            experience_se_corner_latitude, experience_se_corner_longitude)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id,
            uuid.to_string(),
            name,
            region.map(|r| r.north_west.latitude),
            region.map(|r| r.north_west.longitude),
            region.map(|r| r.south_east.latitude),
            region.map(|r| r.south_east.longitude)
        ],
    )?;
    Ok(())
}

fn insert_user_point(
    conn: &Connection,
    experience_id: i64,
    point: &GeoPoint,
    name: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO user_points (userpoint_x, userpoint_y, userpoint_name, userpoint_experience)
         VALUES (?1, ?2, ?3, ?4)",
        params![point.latitude, point.longitude, name, experience_id],
    )?;
    Ok(())
}

fn insert_track(
    conn: &Connection,
    id: Option<i64>,
    uuid: &Uuid,
    name: &str,
    experience_id: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO tracks (track_id, track_uuid, track_name, track_experience)
         VALUES (?1, ?2, ?3, ?4)",
        params![id, uuid.to_string(), name, experience_id],
    )?;
    Ok(())
}

fn insert_checkpoint(conn: &Connection, track_id: i64, num: i64, point: &GeoPoint) -> Result<()> {
    conn.execute(
        "INSERT INTO checkpoints (checkpoint_num, checkpoint_latitude, checkpoint_longitude,
            checkpoint_track)
         VALUES (?1, ?2, ?3, ?4)",
        params![num, point.latitude, point.longitude, track_id],
    )?;
    Ok(())
}

fn insert_checkpoint_event(
    conn: &Connection,
    telemetry_id: i64,
    timestamp: i64,
    checkpoint: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO telemetry_events_checkp (eventc_timestamp, eventc_value, eventc_telem)
         VALUES (?1, ?2, ?3)",
        params![timestamp, checkpoint, telemetry_id],
    )?;
    Ok(())
}

fn load_user_points(conn: &Connection, experience_id: i64) -> Result<Vec<UserPoint>> {
    let mut stmt = conn.prepare(
        "SELECT userpoint_x, userpoint_y, userpoint_name FROM user_points
         WHERE userpoint_experience = ?1 ORDER BY userpoint_id",
    )?;
    let points = stmt
        .query_map(params![experience_id], |row| {
            Ok(UserPoint {
                point: GeoPoint::new(row.get(0)?, row.get(1)?),
                name: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(points)
}

fn load_tracks(conn: &Connection, experience_id: i64) -> Result<Vec<Track>> {
    let mut stmt = conn.prepare(
        "SELECT track_id, track_uuid, track_name FROM tracks
         WHERE track_experience = ?1 ORDER BY track_id",
    )?;
    let rows = stmt
        .query_map(params![experience_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut tracks = Vec::with_capacity(rows.len());
    for (id, uuid, name) in rows {
        tracks.push(Track {
            id,
            uuid: parse_uuid(&uuid)?,
            name,
            checkpoints: load_checkpoints(conn, id)?,
            telemetries: load_telemetries(conn, id)?,
        });
    }
    Ok(tracks)
}

fn load_checkpoints(conn: &Connection, track_id: i64) -> Result<Vec<Checkpoint>> {
    let mut stmt = conn.prepare(
        "SELECT checkpoint_num, checkpoint_latitude, checkpoint_longitude FROM checkpoints
         WHERE checkpoint_track = ?1 ORDER BY checkpoint_num, checkpoint_id",
    )?;
    let checkpoints = stmt
        .query_map(params![track_id], |row| {
            Ok(Checkpoint {
                num: row.get(0)?,
                point: GeoPoint::new(row.get(1)?, row.get(2)?),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(checkpoints)
}

fn load_telemetries(conn: &Connection, track_id: i64) -> Result<Vec<Telemetry>> {
    let mut stmt =
        conn.prepare("SELECT telem_id FROM telemetries WHERE telem_track = ?1 ORDER BY telem_id")?;
    let ids = stmt
        .query_map(params![track_id], |row| row.get::<_, i64>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut events_stmt = conn.prepare(
        "SELECT eventc_timestamp, eventc_value FROM telemetry_events_checkp
         WHERE eventc_telem = ?1 ORDER BY eventc_id",
    )?;

    let mut telemetries = Vec::with_capacity(ids.len());
    for id in ids {
        let events = events_stmt
            .query_map(params![id], |row| {
                Ok(TelemetryEvent::CheckpointReached {
                    timestamp: row.get(0)?,
                    checkpoint: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        telemetries.push(Telemetry::new(events));
    }
    Ok(telemetries)
}

fn region_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Region> {
    Ok(Region::new(
        GeoPoint::new(row.get(idx)?, row.get(idx + 1)?),
        GeoPoint::new(row.get(idx + 2)?, row.get(idx + 3)?),
    ))
}

fn optional_region_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Region>> {
    let corners: [Option<f64>; 4] = [
        row.get(idx)?,
        row.get(idx + 1)?,
        row.get(idx + 2)?,
        row.get(idx + 3)?,
    ];
    Ok(match corners {
        [Some(nw_lat), Some(nw_lon), Some(se_lat), Some(se_lon)] => Some(Region::new(
            GeoPoint::new(nw_lat, nw_lon),
            GeoPoint::new(se_lat, se_lon),
        )),
        _ => None,
    })
}

fn day_part((code, temperature): (i64, i64)) -> Result<DayPartForecast> {
    let condition = WeatherCondition::from_code(code)
        .ok_or_else(|| SyncError::Storage(format!("Unknown weather condition code {}", code)))?;
    Ok(DayPartForecast {
        condition,
        temperature,
    })
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| SyncError::Storage(format!("Bad stored id '{}': {}", s, e)))
}
