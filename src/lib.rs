//! A small service that takes applicant submissions, stores them and lets the team know by email.
//!
//! `POST /v1/subscribe` runs every submission through decode -> validate -> persist -> notify.

pub mod app;
pub mod config;
pub mod database;
pub mod email_client;
mod error;
pub mod templ_manager;
pub mod web;

pub use app::{serve, App, AppState};
pub use error::{Error, Result};

use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

/// Verbose, compact logging for local development.
pub fn init_dbg_tracing() {
    tracing_subscriber::fmt()
        .without_time()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_env_filter(EnvFilter::new("enlist=debug,tower_http=debug,info"))
        .compact()
        .init();
}

/// Logging for release builds, the level comes from `RUST_LOG` and defaults to `info`.
pub fn init_production_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(filter)
        .init();
}
