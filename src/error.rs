// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sync error taxonomy shared by every layer.
//!
//! Each layer returns these unchanged; the synchronizer only adds a
//! best-effort disconnect before handing them back to the caller.

/// Errors raised while pairing with or synchronizing against the cloud service.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Transport failure, no response, or a bad status that is not auth related.
    #[error("Remote service unreachable: {0}")]
    Unreachable(String),

    /// The remote service rejected our credentials or pairing.
    #[error("Authorization denied: {0}")]
    AuthDenied(String),

    /// A token endpoint answered 200 with something other than plain text.
    #[error("Unexpected content type: {0}")]
    UnexpectedContentType(String),

    /// The inbound document failed structural parsing.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// A weather entry is not aligned to midnight UTC.
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    /// Semantic violation detected while building a dump.
    #[error("Illegal input: {0}")]
    IllegalInput(String),

    /// Proxy lifecycle misuse: no connection is open.
    #[error("Not connected")]
    NotConnected,

    /// Calls made out of order (auth before pre-auth, second connection, ...).
    #[error("Programmer error: {0}")]
    ProgrammerError(String),

    /// The local store failed to read or apply data.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl SyncError {
    /// Classify a non-success HTTP status returned by the cloud service.
    pub fn from_status(status: u16, context: &str) -> Self {
        match status {
            401 | 403 | 405 => SyncError::AuthDenied(format!("{}: got HTTP {}", context, status)),
            _ => SyncError::Unreachable(format!("{}: got HTTP {}", context, status)),
        }
    }

    /// Build a programmer error, logging it loudly.
    pub fn programmer(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!(error = %msg, "Sync API misuse");
        SyncError::ProgrammerError(msg)
    }

    /// Whether the remote service refused our credentials.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, SyncError::AuthDenied(_))
    }

    pub fn is_programmer_error(&self) -> bool {
        matches!(self, SyncError::ProgrammerError(_))
    }

    pub fn is_not_connected(&self) -> bool {
        matches!(self, SyncError::NotConnected)
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        SyncError::Unreachable(e.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(e: std::io::Error) -> Self {
        SyncError::Unreachable(e.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::MalformedPayload(e.to_string())
    }
}

impl From<rusqlite::Error> for SyncError {
    fn from(e: rusqlite::Error) -> Self {
        SyncError::Storage(e.to_string())
    }
}

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(SyncError::from_status(401, "get").is_auth_error());
        assert!(SyncError::from_status(403, "get").is_auth_error());
        assert!(SyncError::from_status(405, "get").is_auth_error());
        assert!(matches!(
            SyncError::from_status(500, "get"),
            SyncError::Unreachable(_)
        ));
        assert!(matches!(
            SyncError::from_status(404, "get"),
            SyncError::Unreachable(_)
        ));
    }

    #[test]
    fn test_status_message_carries_context() {
        let err = SyncError::from_status(502, "Data download");
        assert_eq!(
            err.to_string(),
            "Remote service unreachable: Data download: got HTTP 502"
        );
    }
}
