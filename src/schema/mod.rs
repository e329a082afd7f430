//! Input record schema
//!
//! This module defines the per-domain record shapes accepted by the pipeline
//! (health, fitness, sleep, journal) and the adapter that parses them from
//! JSON, either as a bare array or wrapped in a user envelope.

mod adapter;
mod records;

pub use adapter::*;
pub use records::*;
