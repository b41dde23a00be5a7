//! # Event Catalog Library
//!
//! This library provides the core functionality for the Event Catalog service:
//! feed ingestion and reconciliation, persistence, and the public HTTP API.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod models;
pub mod repositories;
pub mod scheduler;
pub mod server;
pub mod telemetry;
pub use migration;
