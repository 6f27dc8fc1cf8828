//! Client engine for the LeadScout scraping backend.
//!
//! The engine drives a page shell (navigation over fetched HTML partials
//! with per-page initializers) and the live progress pipeline: an SSE
//! stream client with exponential-backoff reconnection, followed by a
//! guarded one-shot fetch of the finalized record set.

pub mod api;
pub mod cli;
pub mod config;
pub mod engine;
pub mod progress;
pub mod shell;
