//! # Community Meta
//!
//! Event aggregation and reporting for a trading card game community site.
//!
//! ## Architecture
//!
//! - **models**: Event records, calendar helpers and aggregate shapes
//! - **storage**: Month-partitioned event store and asset paths
//! - **fetch**: HTTP event source for a deployed site
//! - **ingest**: Merging, deduplication and load reports
//! - **calculate**: Top players, deck distributions, host activity and charts
//! - **listing**: Search, filter and sort for the events table
//! - **submission**: Event drafts from the submission form
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod fetch;
pub mod ingest;
pub mod listing;
pub mod models;
pub mod storage;
pub mod submission;

pub use models::*;
