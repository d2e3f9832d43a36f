//! Data models shared by commands, services and storage

pub mod rate;
pub mod visit;

pub use rate::{RateLookup, RateSnapshot};
pub use visit::VisitStats;
