//! Certificate lookup for training and internship programs.
//!
//! The [`ingest`] module turns CSV exports into normalized JSON and loads them into a
//! [`store::DocumentStore`]; the [`certificates`] module serves read-only lookups over
//! the same store.

pub mod certificates;
pub mod config;
pub mod error;
pub mod ingest;
pub mod store;
pub mod telemetry;
