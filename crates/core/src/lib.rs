//! Plowline domain core.
//!
//! Pure types and functions shared by the persistence layer, the dispatcher
//! and the HTTP server. This crate has no internal dependencies and performs
//! no I/O.

pub mod day_bucket;
pub mod dispatch_options;
pub mod error;
pub mod thresholds;
pub mod types;
pub mod weather;
pub mod work_order;
