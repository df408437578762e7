//! # deskd-core
//!
//! Booking rules for shared desks: day/slot conflict detection,
//! ownership-scoped cancellation, and the natural ordering used to
//! present desk names ("desk2" before "desk10").

pub mod client;
pub mod conflict;
pub mod directory;
pub mod engine;
pub mod error;
pub mod infrastructure;
#[cfg(feature = "file")]
#[path = "infrastructure_file.rs"]
pub mod infrastructure_file;
#[path = "infrastructure_in_memory.rs"]
pub mod infrastructure_in_memory;
#[cfg(feature = "sqlite")]
#[path = "infrastructure_sqlite.rs"]
pub mod infrastructure_sqlite;
pub mod natural;
pub mod types;

#[cfg(test)]
mod engine_test;
