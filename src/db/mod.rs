//! Database layer (SQLite).

pub mod schema;
pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::models::Experience;
use crate::services::dump::Dump;

/// Table names as constants.
pub mod tables {
    pub const EXPERIENCES: &str = "experiences";
    pub const USER_POINTS: &str = "user_points";
    pub const TRACKS: &str = "tracks";
    pub const CHECKPOINTS: &str = "checkpoints";
    /// Map tiles (keyed by local experience id)
    pub const RASTERS: &str = "rasters";
    pub const TELEMETRIES: &str = "telemetries";
    /// Checkpoint-reached events of a telemetry
    pub const TELEMETRY_EVENTS_CHECKP: &str = "telemetry_events_checkp";
    pub const CONTACTS: &str = "contacts";
    pub const WEATHER_FORECASTS: &str = "weather_forecasts";
}

/// Write target for inbound data.
pub trait DumpSink {
    /// Apply a whole dump atomically: either every statement or none.
    fn load(&self, dump: &Dump) -> Result<()>;
}

/// Read source for outbound data.
pub trait ExperienceSource {
    /// Every locally known experience, with tracks and user points.
    fn experiences(&self) -> Result<Vec<Experience>>;
}

impl<T: DumpSink + ?Sized> DumpSink for &T {
    fn load(&self, dump: &Dump) -> Result<()> {
        (**self).load(dump)
    }
}

impl<T: ExperienceSource + ?Sized> ExperienceSource for &T {
    fn experiences(&self) -> Result<Vec<Experience>> {
        (**self).experiences()
    }
}
