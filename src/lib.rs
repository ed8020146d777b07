// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trail-Sync: cloud synchronization core for a hiking companion app
//!
//! This crate pairs a device with the cloud service, uploads locally
//! recorded user points and telemetries, and replaces the local store
//! with the server's snapshot of experiences, weather and emergency
//! contacts.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;

use config::Config;
use db::SqliteStore;
use services::{HttpNetProxy, Synchronizer};

/// The synchronizer wired to its production collaborators.
pub type AppSynchronizer = Synchronizer<HttpNetProxy, SqliteStore, SqliteStore>;

/// Build a synchronizer from configuration, opening the local store.
pub fn build_synchronizer(config: &Config) -> error::Result<AppSynchronizer> {
    let store = SqliteStore::open(&config.database_path)?;
    let proxy = HttpNetProxy::from_config(config)?;
    Ok(Synchronizer::new(proxy, store.clone(), store))
}
