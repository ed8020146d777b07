// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wire entities exchanged with the cloud service.
//!
//! Inbound entities mirror the server snapshot (experiences, weather,
//! emergency contacts). Outbound entities carry only what the device
//! collected locally (user points and telemetry).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::SyncError;
use crate::models::weather::WeatherCondition;
use crate::models::{Experience, Region, Track};
use crate::time_utils::secs_to_millis;

// ─────────────────────────────────────────────────────────────────────────────
// Inbound
// ─────────────────────────────────────────────────────────────────────────────

/// Root of the inbound document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundRoot {
    #[serde(default)]
    pub experiences: Vec<ExperienceEntity>,
    #[serde(default)]
    pub emergency_data: Vec<EmergencyDataEntity>,
    #[serde(default)]
    pub weather_data: Vec<WeatherDataEntity>,
}

/// Experience as sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_rect: Option<Region>,
    #[serde(default, alias = "user_points")]
    pub user_points: Vec<UserPointEntity>,
    #[serde(default)]
    pub tracks: Vec<TrackEntity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub raster_data: Vec<RasterDataEntity>,
}

impl ExperienceEntity {
    /// Stable identifier: the server's, or one derived from the name.
    pub fn stable_id(&self) -> Uuid {
        self.id
            .unwrap_or_else(|| Uuid::new_v5(&Uuid::NAMESPACE_OID, self.name.as_bytes()))
    }
}

/// Track as sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "checkPoints")]
    pub checkpoints: Vec<CheckpointEntity>,
    /// Zero, one or (ambiguously) several best telemetries.
    #[serde(
        default,
        rename = "bestTelemetry",
        deserialize_with = "one_or_many",
        serialize_with = "serialize_one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub best_telemetry: Vec<TelemetryEntity>,
}

impl TrackEntity {
    /// Stable identifier: the server's, or one derived from the owning
    /// experience and the track's position within it.
    pub fn stable_id(&self, experience: &Uuid, position: usize) -> Uuid {
        self.id.unwrap_or_else(|| {
            let key = format!("{}/{}/{}", experience, position, self.name);
            Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckpointEntity {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
}

/// A recorded traversal: checkpoint-reached times in epoch milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEntity {
    #[serde(default)]
    pub events: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,
}

/// User point, shared by both directions. Outbound points always carry a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPointEntity {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Map tile covering part of an experience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RasterDataEntity {
    pub bounding_rect: Region,
    /// Base64-encoded image
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyDataEntity {
    pub name: String,
    pub number: String,
    pub bounding_rect: Region,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherDataEntity {
    /// Epoch milliseconds; must be midnight UTC
    #[serde(alias = "time")]
    pub date: i64,
    pub bounding_rect: Region,
    pub morning: ForecastEntity,
    pub afternoon: ForecastEntity,
    pub night: ForecastEntity,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntity {
    #[serde(with = "condition_wire")]
    pub forecast: WeatherCondition,
    /// Degrees Celsius, rounded when stored
    pub temperature: f64,
}

mod condition_wire {
    use super::*;

    pub fn serialize<S: Serializer>(c: &WeatherCondition, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(c.wire_name())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<WeatherCondition, D::Error> {
        let name = String::deserialize(d)?;
        WeatherCondition::from_wire(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown forecast '{}'", name)))
    }
}

/// Accept an absent/null value, a single telemetry object, or a list of them.
fn one_or_many<'de, D>(d: D) -> Result<Vec<TelemetryEntity>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(TelemetryEntity),
        Many(Vec<TelemetryEntity>),
    }

    Ok(match Option::<OneOrMany>::deserialize(d)? {
        None => Vec::new(),
        Some(OneOrMany::One(t)) => vec![t],
        Some(OneOrMany::Many(v)) => v,
    })
}

#[allow(clippy::ptr_arg)]
fn serialize_one_or_many<S: Serializer>(
    v: &Vec<TelemetryEntity>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match v.as_slice() {
        [single] => single.serialize(s),
        many => many.serialize(s),
    }
}

/// Snapshot entity for a local experience, as the server would send it back.
impl TryFrom<&Experience> for ExperienceEntity {
    type Error = SyncError;

    fn try_from(exp: &Experience) -> Result<Self, SyncError> {
        Ok(Self {
            id: Some(exp.uuid),
            name: exp.name.clone(),
            bounding_rect: exp.region,
            user_points: exp
                .user_points
                .iter()
                .map(|up| UserPointEntity {
                    latitude: up.point.latitude,
                    longitude: up.point.longitude,
                    name: up.name.clone(),
                })
                .collect(),
            tracks: exp
                .tracks
                .iter()
                .map(TrackEntity::try_from)
                .collect::<Result<_, _>>()?,
            raster_data: Vec::new(),
        })
    }
}

impl TryFrom<&Track> for TrackEntity {
    type Error = SyncError;

    fn try_from(track: &Track) -> Result<Self, SyncError> {
        let best_telemetry = match track.best_telemetry() {
            Ok(t) => vec![TelemetryEntity {
                events: t
                    .checkpoint_events()
                    .map(|e| {
                        secs_to_millis(e.timestamp()).ok_or_else(|| {
                            SyncError::IllegalInput(format!(
                                "Event timestamp {} on track {} is out of range",
                                e.timestamp(),
                                track.uuid
                            ))
                        })
                    })
                    .collect::<Result<_, _>>()?,
                track: Some(track.uuid.to_string()),
            }],
            Err(_) => Vec::new(),
        };

        Ok(Self {
            id: Some(track.uuid),
            name: track.name.clone(),
            checkpoints: track
                .checkpoints
                .iter()
                .map(|cp| CheckpointEntity {
                    id: cp.num,
                    latitude: cp.point.latitude,
                    longitude: cp.point.longitude,
                })
                .collect(),
            best_telemetry,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Outbound
// ─────────────────────────────────────────────────────────────────────────────

/// Root of the outbound document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutboundRoot {
    pub data: Vec<OutboundExperienceData>,
}

/// Locally collected data for one experience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundExperienceData {
    pub experience: Uuid,
    pub user_points: Vec<UserPointEntity>,
    pub telemetry_data: Vec<OutboundTelemetry>,
}

/// One recorded telemetry with millisecond timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundTelemetry {
    pub events: Vec<i64>,
    pub track: Uuid,
}
