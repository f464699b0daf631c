//! Job board core shared by the HTTP service and its command line.

pub mod admin;
pub mod config;
pub mod error;
pub mod jobs;
pub mod telemetry;
