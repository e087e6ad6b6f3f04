//! Core data models: event records, calendar buckets and derived statistics.

mod calendar;
mod event;
mod ids;
mod stats;

pub use calendar::*;
pub use event::*;
pub use ids::*;
pub use stats::*;
