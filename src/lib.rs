//! Motor telemetry ingestion.
//!
//! Receives free-form text messages from motor controllers, extracts
//! structured telemetry, stores it locally with a sync flag and relays each
//! event to a remote endpoint.

pub mod common;
pub mod config;
pub mod entity;
pub mod error;
pub mod ingest;
pub mod notify;
pub mod parser;
pub mod registry;
pub mod relay;
pub mod routes;
pub mod store;
pub mod sync;
