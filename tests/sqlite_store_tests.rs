// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tests for applying dumps to the local store.

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use trail_sync::db::{DumpSink, ExperienceSource, SqliteStore};
use trail_sync::error::SyncError;
use trail_sync::models::wire::ExperienceEntity;
use trail_sync::models::{GeoPoint, InboundRoot, UserPoint, WeatherCondition};
use trail_sync::services::{Dump, DumpBuilder, DumpStatement, InboundParser, Table};
use uuid::Uuid;

mod common;
use common::{region, sample_experience, sample_inbound_json};

fn load_json(store: &SqliteStore, doc: &str) {
    let root = InboundParser::new().parse(doc.as_bytes()).unwrap().unwrap();
    let dump = DumpBuilder::new(&root).build().unwrap();
    store.load(&dump).unwrap();
}

#[test]
fn test_snapshot_is_readable() {
    let store = SqliteStore::open_in_memory().unwrap();
    load_json(&store, &sample_inbound_json());

    let experiences = store.experiences().unwrap();
    assert_eq!(experiences.len(), 1);
    let exp = &experiences[0];
    assert_eq!(exp.name, "Experience_1");
    assert_eq!(exp.region, Some(region(46.0, 11.0, 45.0, 12.0)));
    assert_eq!(exp.user_points[0].name.as_deref(), Some("Hut"));

    let track = &exp.tracks[0];
    assert_eq!(track.checkpoints.len(), 2);
    assert_eq!(track.best_telemetry().unwrap().duration(), 600);

    let contacts = store.contacts_at(GeoPoint::new(45.5, 11.5)).unwrap();
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].number, "118");
    assert!(store.contacts_at(GeoPoint::new(10.0, 10.0)).unwrap().is_empty());

    let day = NaiveDate::from_ymd_opt(2015, 7, 21).unwrap();
    let weather = store
        .weather_at(GeoPoint::new(45.5, 11.5), day)
        .unwrap()
        .expect("forecast for the day");
    assert_eq!(weather.morning.temperature, 20);
    assert_eq!(weather.afternoon.temperature, 23);
    assert_eq!(weather.afternoon.condition, WeatherCondition::Cloudy);
    assert_eq!(weather.night.condition, WeatherCondition::Rainy);

    let other_day = NaiveDate::from_ymd_opt(2015, 7, 22).unwrap();
    assert!(store
        .weather_at(GeoPoint::new(45.5, 11.5), other_day)
        .unwrap()
        .is_none());
}

#[test]
fn test_destructive_replace() {
    let store = SqliteStore::open_in_memory().unwrap();
    load_json(&store, &sample_inbound_json());
    load_json(
        &store,
        r#"{"experiences": [{"name": "Second", "tracks": [{"name": "Only"}]}]}"#,
    );

    let experiences = store.experiences().unwrap();
    assert_eq!(experiences.len(), 1);
    assert_eq!(experiences[0].name, "Second");
    assert_eq!(experiences[0].tracks.len(), 1);
    assert_eq!(store.row_count(Table::Checkpoints).unwrap(), 0);
    assert_eq!(store.row_count(Table::Telemetries).unwrap(), 0);
    assert_eq!(store.row_count(Table::TelemetryEventsCheckp).unwrap(), 0);
    assert_eq!(store.row_count(Table::Contacts).unwrap(), 0);
    assert_eq!(store.row_count(Table::WeatherForecasts).unwrap(), 0);
}

#[test]
fn test_failed_dump_leaves_previous_state() {
    let store = SqliteStore::open_in_memory().unwrap();
    load_json(&store, &sample_inbound_json());
    let before = store.experiences().unwrap();

    // Flushes succeed, then a checkpoint points at a track that does not exist.
    let mut statements = vec![DumpStatement::Begin];
    statements.extend(Table::ALL.iter().map(|t| DumpStatement::Flush(*t)));
    statements.push(DumpStatement::InsertContact {
        name: "New".to_string(),
        number: "112".to_string(),
        region: region(1.0, 0.0, 0.0, 1.0),
    });
    statements.push(DumpStatement::InsertCheckpoint {
        track_id: 999,
        num: 1,
        point: GeoPoint::new(0.5, 0.5),
    });
    statements.push(DumpStatement::Commit);

    let err = store.load(&Dump::from(statements)).unwrap_err();
    assert!(matches!(err, SyncError::Storage(_)));

    assert_eq!(store.experiences().unwrap(), before);
    assert_eq!(store.row_count(Table::Contacts).unwrap(), 1);
    assert_eq!(store.row_count(Table::WeatherForecasts).unwrap(), 1);
}

#[test]
fn test_rejected_snapshot_applies_nothing() {
    let store = SqliteStore::open_in_memory().unwrap();
    load_json(&store, &sample_inbound_json());

    let doc = r#"{"experiences": [{"name": "E", "tracks": [{"name": "T",
        "bestTelemetry": [{"events": [1000]}, {"events": [2000]}]}]}]}"#;
    let root = InboundParser::new().parse(doc.as_bytes()).unwrap().unwrap();
    assert!(DumpBuilder::new(&root).build().is_err());

    assert_eq!(store.experiences().unwrap()[0].name, "Experience_1");
}

#[test]
fn test_other_connection_sees_old_or_new_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");
    let writer = SqliteStore::open(&path).unwrap();
    let reader = SqliteStore::open(&path).unwrap();

    load_json(&writer, &sample_inbound_json());
    assert_eq!(reader.experiences().unwrap().len(), 1);

    let mut statements = vec![DumpStatement::Begin];
    statements.extend(Table::ALL.iter().map(|t| DumpStatement::Flush(*t)));
    statements.push(DumpStatement::InsertTelemetry { id: 1, track_id: 42 });
    statements.push(DumpStatement::Commit);
    assert!(writer.load(&Dump::from(statements)).is_err());

    assert_eq!(reader.experiences().unwrap()[0].name, "Experience_1");
}

#[test]
fn test_round_trip_through_snapshot() {
    let store = SqliteStore::open_in_memory().unwrap();
    let original = sample_experience();

    let exp_id = store
        .create_experience(original.uuid, &original.name, Some(region(14.0, 72.0, 12.0, 74.0)))
        .unwrap();
    for up in &original.user_points {
        store.add_user_point(exp_id, up).unwrap();
    }
    store
        .add_user_point(
            exp_id,
            &UserPoint {
                point: GeoPoint::new(13.5, 73.5),
                name: Some("Spring".to_string()),
            },
        )
        .unwrap();
    let track = &original.tracks[0];
    let track_id = store.create_track(exp_id, track.uuid, &track.name).unwrap();
    for t in &track.telemetries {
        store.record_telemetry(track_id, t).unwrap();
    }

    let local = store.experiences().unwrap();
    let root = InboundRoot {
        experiences: local
            .iter()
            .map(ExperienceEntity::try_from)
            .collect::<Result<Vec<_>, _>>()
            .unwrap(),
        ..InboundRoot::default()
    };
    let doc = serde_json::to_string(&root).unwrap();

    let replica = SqliteStore::open_in_memory().unwrap();
    load_json(&replica, &doc);
    let replicated = replica.experiences().unwrap();

    assert_eq!(replicated.len(), 1);
    let (a, b) = (&local[0], &replicated[0]);
    assert_eq!(a.uuid, b.uuid);
    assert_eq!(a.name, b.name);
    assert_eq!(a.region, b.region);
    assert_eq!(a.user_points, b.user_points);
    assert_eq!(a.tracks[0].uuid, b.tracks[0].uuid);
    assert_eq!(a.tracks[0].checkpoints, b.tracks[0].checkpoints);
    assert_eq!(
        a.tracks[0].best_telemetry().unwrap(),
        b.tracks[0].best_telemetry().unwrap()
    );
}

#[test]
fn test_rasters_stored_per_experience() {
    let store = SqliteStore::open_in_memory().unwrap();
    let doc = r#"{"experiences": [{"id": "5f0e3a52-6b1a-4c8e-9d6f-0d7c1b2a3e4f", "name": "E",
        "rasterData": [{
            "boundingRect": {"topLeft": {"latitude": 2.0, "longitude": 1.0},
                             "bottomRight": {"latitude": 1.0, "longitude": 2.0}},
            "image": "iVBORw0KGgo="}]}]}"#;
    load_json(&store, doc);

    let uuid = Uuid::parse_str("5f0e3a52-6b1a-4c8e-9d6f-0d7c1b2a3e4f").unwrap();
    let id = store.experience_id(&uuid).unwrap().expect("experience stored");
    let rasters = store.rasters_for(id).unwrap();
    assert_eq!(rasters.len(), 1);
    assert_eq!(rasters[0].region, region(2.0, 1.0, 1.0, 2.0));
    assert_eq!(rasters[0].decode().unwrap().len(), 8);
}
