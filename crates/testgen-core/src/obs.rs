//! Structured lifecycle events for one generation run.
//!
//! Every event carries `event = "<stage>.<what>"` and the `run_id`, so a
//! JSON log of a run can be filtered and reassembled downstream.

use std::path::Path;

use tracing::{error, info, warn};

/// Run-scoped span; attach it to the run's future with
/// [`tracing::Instrument`].
pub struct PipelineSpan {
    span: tracing::Span,
}

impl PipelineSpan {
    pub fn new(run_id: &str) -> Self {
        Self {
            span: tracing::info_span!("testgen.run", run_id = %run_id),
        }
    }

    pub fn span(&self) -> tracing::Span {
        self.span.clone()
    }
}

pub fn emit_pipeline_started(run_id: &str, file_name: Option<&str>, nodes: usize) {
    info!(
        event = "pipeline.started",
        run_id = %run_id,
        file_name = file_name.unwrap_or("<unnamed>"),
        nodes = nodes,
    );
}

pub fn emit_retrieval_completed(run_id: &str, documents: usize) {
    info!(event = "retrieval.completed", run_id = %run_id, documents = documents);
}

pub fn emit_retrieval_skipped(run_id: &str, reason: &str) {
    info!(event = "retrieval.skipped", run_id = %run_id, reason = %reason);
}

pub fn emit_generation_parsed(run_id: &str, records: usize) {
    info!(event = "generation.parsed", run_id = %run_id, records = records);
}

/// Warn-level: the run produced nothing usable.
pub fn emit_generation_failed(run_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "generation.failed", run_id = %run_id, error = %error);
}

pub fn emit_export_written(run_id: &str, path: &Path, records: usize) {
    info!(
        event = "export.written",
        run_id = %run_id,
        path = %path.display(),
        records = records,
    );
}

pub fn emit_export_failed(run_id: &str, error: &dyn std::fmt::Display) {
    error!(event = "export.failed", run_id = %run_id, error = %error);
}

pub fn emit_pipeline_finished(run_id: &str, duration_ms: u64, success: bool) {
    info!(
        event = "pipeline.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        success = success,
    );
}
