use std::sync::Arc;

use crate::context::WorkerContext;
use crate::handlers::{self, TaskOutcome};
use crate::models::{
    CoreError, CoreErrorKind, CoreResult, TaskEnvelope, TaskKind, TaskRequest, attribute_error,
};
use crate::registry;
use crate::task_context::with_task_kind;
use crate::telemetry::TelemetryBatch;

/// Entry point for one delivered envelope.
#[derive(Clone)]
pub struct TaskRouter {
    context: Arc<WorkerContext>,
}

impl TaskRouter {
    pub fn new(context: Arc<WorkerContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &WorkerContext {
        &self.context
    }

    /// Validates the envelope, makes sure the collaborators its kind needs
    /// exist, and runs the handler. Nothing is uploaded here.
    pub fn dispatch(&self, envelope: &TaskEnvelope) -> CoreResult<TaskOutcome> {
        let request = TaskRequest::from_envelope(envelope)?;
        let kind = request.kind();
        let api_kind = request.api_kind();
        let descriptor = registry::task_descriptor(kind);
        let subscription = request
            .address()
            .map(|address| address.subscription_id().to_string());

        with_task_kind(kind, || {
            for collaborator in descriptor.collaborators {
                self.context
                    .clients
                    .ensure(*collaborator, subscription.as_deref())?;
            }
            handlers::handle(&self.context, request)
        })
        .map_err(|error| attribute_error(error, kind, api_kind))
    }

    /// Dispatches, uploads the task's telemetry, and only then releases its
    /// follow-ups. A failed upload fails the task and discards the follow-ups.
    pub fn execute(&self, envelope: &TaskEnvelope) -> CoreResult<Vec<TaskEnvelope>> {
        let outcome = self.dispatch(envelope)?;

        if let Some(batch) = &outcome.telemetry {
            self.upload(batch).map_err(|error| {
                let error = match envelope.task().parse::<TaskKind>() {
                    Ok(kind) => error.with_task(kind),
                    Err(_) => error,
                };
                tracing::warn!(
                    task = envelope.task(),
                    rid = envelope.rid().unwrap_or_default(),
                    stream = batch.stream().as_str(),
                    error = %error,
                    "telemetry upload failed"
                );
                error
            })?;
        }

        tracing::info!(
            task = envelope.task(),
            rid = envelope.rid().unwrap_or_default(),
            follow_ups = outcome.follow_ups.len(),
            telemetry_rows = outcome.telemetry.as_ref().map_or(0, TelemetryBatch::len),
            "task completed"
        );
        Ok(outcome.follow_ups)
    }

    /// Wire-level form of [`TaskRouter::execute`].
    pub fn execute_message(&self, message: &str) -> CoreResult<Vec<String>> {
        let envelope = TaskEnvelope::from_message(message)?;
        self.execute(&envelope)?
            .iter()
            .map(TaskEnvelope::to_message)
            .collect()
    }

    fn upload(&self, batch: &TelemetryBatch) -> CoreResult<()> {
        if batch.is_empty() {
            tracing::debug!(stream = batch.stream().as_str(), "no telemetry rows to upload");
            return Ok(());
        }

        let target = self.context.config.stream_target(batch.stream());
        let rows = batch.rows()?;
        let sink = self.context.clients.telemetry_sink()?;
        sink.upload(target, &rows).map_err(|error| {
            CoreError::new(
                CoreErrorKind::TelemetryUpload,
                format!(
                    "failed to upload {} rows to stream '{}': {error}",
                    rows.len(),
                    target.stream_name
                ),
            )
        })
    }
}
