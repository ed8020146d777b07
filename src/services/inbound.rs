// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Inbound document parser.
//!
//! Decodes the raw snapshot returned by the cloud service into wire
//! entities. Structural problems (missing required fields, wrong types,
//! unknown forecast names, undecodable raster tiles) are reported as
//! `MalformedPayload`. Semantic checks such as weather alignment are left
//! to the dump builder.

use std::io::Read;

use base64::Engine;

use crate::error::{Result, SyncError};
use crate::models::InboundRoot;

/// Parser for the inbound JSON document.
#[derive(Debug, Default, Clone, Copy)]
pub struct InboundParser;

impl InboundParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a full document from `reader`.
    ///
    /// Returns `Ok(None)` when the document is a literal `null`.
    pub fn parse<R: Read>(&self, mut reader: R) -> Result<Option<InboundRoot>> {
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;
        self.parse_slice(&raw)
    }

    /// Parse a document already held in memory.
    pub fn parse_slice(&self, raw: &[u8]) -> Result<Option<InboundRoot>> {
        let root: Option<InboundRoot> = serde_json::from_slice(raw)
            .map_err(|e| SyncError::MalformedPayload(format!("Inbound document: {}", e)))?;

        if let Some(root) = &root {
            validate_rasters(root)?;
            tracing::debug!(
                experiences = root.experiences.len(),
                contacts = root.emergency_data.len(),
                forecasts = root.weather_data.len(),
                "Parsed inbound document"
            );
        }

        Ok(root)
    }
}

fn validate_rasters(root: &InboundRoot) -> Result<()> {
    let engine = base64::engine::general_purpose::STANDARD;
    for exp in &root.experiences {
        for (n, raster) in exp.raster_data.iter().enumerate() {
            engine.decode(raster.image.trim()).map_err(|e| {
                SyncError::MalformedPayload(format!(
                    "Raster {} of experience '{}' is not base64: {}",
                    n, exp.name, e
                ))
            })?;
        }
    }
    Ok(())
}
