// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weather forecast model.

use chrono::NaiveDate;

use crate::models::Region;

/// Categorical forecast. The discriminant is the code stored locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherCondition {
    Sunny = 0,
    Cloudy = 1,
    Rainy = 2,
    Stormy = 3,
    Snowy = 4,
}

impl WeatherCondition {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Sunny),
            1 => Some(Self::Cloudy),
            2 => Some(Self::Rainy),
            3 => Some(Self::Stormy),
            4 => Some(Self::Snowy),
            _ => None,
        }
    }

    /// Parse the wire name (`SUNNY`, `cloudy`, ...), ignoring case.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "SUNNY" => Some(Self::Sunny),
            "CLOUDY" => Some(Self::Cloudy),
            "RAINY" => Some(Self::Rainy),
            "STORMY" => Some(Self::Stormy),
            "SNOWY" => Some(Self::Snowy),
            _ => None,
        }
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Sunny => "SUNNY",
            Self::Cloudy => "CLOUDY",
            Self::Rainy => "RAINY",
            Self::Stormy => "STORMY",
            Self::Snowy => "SNOWY",
        }
    }
}

/// Forecast for one part of the day. Temperature in whole degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayPartForecast {
    pub condition: WeatherCondition,
    pub temperature: i64,
}

/// A day's forecast for a region.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherForecast {
    pub date: NaiveDate,
    pub morning: DayPartForecast,
    pub afternoon: DayPartForecast,
    pub night: DayPartForecast,
    pub region: Region,
}
