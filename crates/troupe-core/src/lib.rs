//! Core types and error definitions for the Troupe orchestration engine.
//!
//! This crate provides the foundational pieces shared across all Troupe
//! crates: the unified error type and the worker-binding boundary that the
//! engine dispatches against.
//!
//! # Main types
//!
//! - [`TroupeError`] — Unified error enum for all Troupe subsystems.
//! - [`TroupeResult`] — Convenience alias for `Result<T, TroupeError>`.
//! - [`Worker`] — The capability interface a bound worker exposes.
//! - [`WorkerFactory`] — External resolver from a worker kind to a bound worker.

/// Worker capability interface and binding types.
pub mod worker;

pub use worker::{capability, Worker, WorkerFactory};

/// Top-level error type for the Troupe engine.
///
/// Each variant corresponds to a subsystem that can produce errors.
#[derive(Debug, thiserror::Error)]
pub enum TroupeError {
    /// An error from the team execution lifecycle.
    #[error("Team error: {0}")]
    Team(String),

    /// An error from plan construction.
    #[error("Planner error: {0}")]
    Planner(String),

    /// An error from the team registry/manager.
    #[error("Registry error: {0}")]
    Registry(String),

    /// An error raised by a worker during capability invocation.
    #[error("Worker error: {0}")]
    Worker(String),

    /// An error in configuration validation.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`TroupeError`].
pub type TroupeResult<T> = Result<T, TroupeError>;
