use crate::TroupeResult;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Names of the capabilities a worker may expose.
///
/// The dispatch layer only ever probes this closed vocabulary; a worker
/// implements any subset and reports `None` for the rest.
pub mod capability {
    /// Decompose or analyze an incoming task.
    pub const ANALYZE_TASK: &str = "analyze_task";
    /// Gather information relevant to the task.
    pub const RESEARCH: &str = "research";
    /// Answer a direct query.
    pub const QUERY: &str = "query";
    /// Analyze previously gathered material.
    pub const ANALYZE: &str = "analyze";
    /// Produce content from accumulated outputs.
    pub const CREATE_CONTENT: &str = "create_content";
    /// Generic generation entry point.
    pub const GENERATE: &str = "generate";
    /// Carry out a side-effecting action.
    pub const EXECUTE: &str = "execute";
    /// Review accumulated outputs.
    pub const REVIEW: &str = "review";
    /// Generic processing fallback.
    pub const PROCESS: &str = "process";
    /// Last-resort generic entry point.
    pub const RUN: &str = "run";
}

/// A bound worker: the only boundary the engine depends on.
///
/// Workers expose zero or more named capabilities from the
/// [`capability`] vocabulary. The engine never inspects a worker beyond
/// calling [`Worker::invoke`] with a capability name; returning
/// `Ok(None)` signals the capability is not exposed and the dispatcher
/// falls through to the next candidate.
#[async_trait]
pub trait Worker: Send + Sync {
    /// The worker kind this instance was bound from.
    fn kind(&self) -> &str;

    /// Capability tags this worker advertises.
    fn capabilities(&self) -> Vec<String>;

    /// Invoke a named capability with the task text and auxiliary data.
    ///
    /// `aux` is the caller-supplied context for analysis/execution
    /// capabilities, or the accumulated worker outputs for generation and
    /// review capabilities. Returns `Ok(None)` when the capability is not
    /// exposed, `Ok(Some(value))` with an opaque result on success, and
    /// `Err` when the capability was attempted and failed.
    async fn invoke(
        &self,
        capability: &str,
        task: &str,
        aux: &Map<String, Value>,
    ) -> TroupeResult<Option<Value>>;
}

/// External resolver from a worker kind to a bound worker instance.
///
/// `None` covers both "unknown kind" and "could not be constructed"; the
/// team layer decides whether that aborts the run (required role) or
/// leaves the role absent (optional role).
pub type WorkerFactory = Arc<dyn Fn(&str) -> Option<Arc<dyn Worker>> + Send + Sync>;
