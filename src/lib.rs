//! nalmux - H.264 Annex-B to MP4 muxing
//!
//! This library crate exposes the ingestion driver and configuration for the
//! binary and for integration testing.

pub mod config;
pub mod ingest;
pub mod inspect;
pub mod mux;
