// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tests for the outbound document builder.

use pretty_assertions::assert_eq;
use trail_sync::models::{GeoPoint, UserPoint};
use trail_sync::services::{OutboundStream, OutboundStreamBuilder};

mod common;
use common::{sample_experience, EXPERIENCE_UUID, TRACK_UUID};

#[test]
fn test_reference_experience_document() {
    let mut builder = OutboundStreamBuilder::new();
    builder.add_experience(&sample_experience()).unwrap();

    let expected = format!(
        concat!(
            r#"{{"data":[{{"experience":"{exp}","#,
            r#""userPoints":[{{"latitude":13.0,"longitude":73.0,"name":"Custom point #0"}}],"#,
            r#""telemetryData":[{{"events":[123456000,654321000],"track":"{track}"}},"#,
            r#"{{"events":[56789000,98765000],"track":"{track}"}}]}}]}}"#
        ),
        exp = EXPERIENCE_UUID,
        track = TRACK_UUID
    );

    assert_eq!(builder.build().unwrap(), expected);
}

#[test]
fn test_stream_is_url_encoded_build() {
    let mut exp = sample_experience();
    exp.user_points.push(UserPoint {
        point: GeoPoint::new(45.5, 11.25),
        name: Some("Rifugio & bivacco".to_string()),
    });

    let mut builder = OutboundStreamBuilder::new();
    builder.add_experience(&exp).unwrap();

    let mut stream = OutboundStream::new();
    builder.stream(&mut stream).unwrap();

    let body = String::from_utf8(stream.body().to_vec()).unwrap();
    let encoded = body.strip_prefix("data=").expect("form field prefix");
    assert!(!encoded.contains('&'));
    assert!(!encoded.contains(' '));
    assert_eq!(urlencoding::decode(encoded).unwrap(), builder.build().unwrap());
}

#[test]
fn test_multiple_experiences_keep_order() {
    let first = sample_experience();
    let mut second = sample_experience();
    second.uuid = uuid::Uuid::new_v4();
    second.tracks.clear();

    let mut builder = OutboundStreamBuilder::new();
    builder.add_experience(&first).unwrap();
    builder.add_experience(&second).unwrap();

    let data = &builder.root().data;
    assert_eq!(data.len(), 2);
    assert_eq!(data[0].experience, first.uuid);
    assert_eq!(data[1].experience, second.uuid);
    assert!(data[1].telemetry_data.is_empty());
    assert_eq!(data[1].user_points[0].name.as_deref(), Some("Custom point #0"));
}
