//! # recordform Library
//!
//! This library exposes the recordform modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod cli;
pub mod config;
pub mod controller;
pub mod logging;
pub mod notify;
pub mod teardown;

// Re-export the engine and client for convenience
pub use recordform_client;
pub use recordform_core;
