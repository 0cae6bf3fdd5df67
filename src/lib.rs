pub mod adapters;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod query;
pub mod sources;
pub mod translate;
pub mod types;

// Layered boundaries: ports the pipeline depends on, and their adapters
pub mod app;
pub mod infra;
