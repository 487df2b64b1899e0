//! innovate/crates/domains/src/lib.rs
//!
//! The central domain model and port definitions for Innovate.
//! This crate performs no I/O: services depend on the traits in [`ports`],
//! adapters implement them.

pub mod errors;
pub mod ids;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use ids::*;
pub use models::*;
pub use ports::*;
