// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local store schema.
//!
//! Every synced table hangs off `experiences` (or stands alone) with
//! `ON DELETE CASCADE`, so flushing a parent never leaves orphans behind.

/// Current schema version.
pub const CURRENT_VERSION: i32 = 1;

/// Schema version bookkeeping.
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// SQL schema for creating all tables.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS experiences (
    experience_id INTEGER PRIMARY KEY,
    experience_uuid TEXT NOT NULL,
    experience_name TEXT NOT NULL,
    experience_nw_corner_latitude REAL,
    experience_nw_corner_longitude REAL,
    experience_se_corner_latitude REAL,
    experience_se_corner_longitude REAL
);

CREATE TABLE IF NOT EXISTS user_points (
    userpoint_id INTEGER PRIMARY KEY,
    userpoint_x REAL NOT NULL,
    userpoint_y REAL NOT NULL,
    userpoint_name TEXT,
    userpoint_experience INTEGER NOT NULL
        REFERENCES experiences(experience_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS rasters (
    raster_id INTEGER PRIMARY KEY,
    raster_experience INTEGER NOT NULL
        REFERENCES experiences(experience_id) ON DELETE CASCADE,
    raster_nw_corner_latitude REAL NOT NULL,
    raster_nw_corner_longitude REAL NOT NULL,
    raster_se_corner_latitude REAL NOT NULL,
    raster_se_corner_longitude REAL NOT NULL,
    raster_base64 TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tracks (
    track_id INTEGER PRIMARY KEY,
    track_uuid TEXT NOT NULL,
    track_name TEXT NOT NULL,
    track_experience INTEGER NOT NULL
        REFERENCES experiences(experience_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS checkpoints (
    checkpoint_id INTEGER PRIMARY KEY,
    checkpoint_num INTEGER NOT NULL,
    checkpoint_latitude REAL NOT NULL,
    checkpoint_longitude REAL NOT NULL,
    checkpoint_track INTEGER NOT NULL
        REFERENCES tracks(track_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS telemetries (
    telem_id INTEGER PRIMARY KEY,
    telem_track INTEGER NOT NULL
        REFERENCES tracks(track_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS telemetry_events_checkp (
    eventc_id INTEGER PRIMARY KEY,
    eventc_timestamp INTEGER NOT NULL,
    eventc_value INTEGER NOT NULL,
    eventc_telem INTEGER NOT NULL
        REFERENCES telemetries(telem_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS contacts (
    contact_id INTEGER PRIMARY KEY,
    contact_name TEXT NOT NULL,
    contact_value TEXT NOT NULL,
    contact_nw_corner_latitude REAL NOT NULL,
    contact_nw_corner_longitude REAL NOT NULL,
    contact_se_corner_latitude REAL NOT NULL,
    contact_se_corner_longitude REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS weather_forecasts (
    weather_id INTEGER PRIMARY KEY,
    weather_date INTEGER NOT NULL,
    weather_condition_morning INTEGER NOT NULL,
    weather_temperature_morning INTEGER NOT NULL,
    weather_condition_afternoon INTEGER NOT NULL,
    weather_temperature_afternoon INTEGER NOT NULL,
    weather_condition_night INTEGER NOT NULL,
    weather_temperature_night INTEGER NOT NULL,
    weather_nw_corner_latitude REAL NOT NULL,
    weather_nw_corner_longitude REAL NOT NULL,
    weather_se_corner_latitude REAL NOT NULL,
    weather_se_corner_longitude REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tracks_experience ON tracks(track_experience);
CREATE INDEX IF NOT EXISTS idx_checkpoints_track ON checkpoints(checkpoint_track);
CREATE INDEX IF NOT EXISTS idx_telemetries_track ON telemetries(telem_track);
CREATE INDEX IF NOT EXISTS idx_events_telem ON telemetry_events_checkp(eventc_telem);
CREATE INDEX IF NOT EXISTS idx_weather_date ON weather_forecasts(weather_date);
"#;
