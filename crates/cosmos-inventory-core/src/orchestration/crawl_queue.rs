use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::config::CrawlQueueConfig;
use crate::models::{CoreError, CoreErrorKind, CoreResult, TaskEnvelope};
use crate::orchestration::OrchestrationResult;
use crate::persistence::{DeadLetter, DeadLetterStore};
use crate::router::TaskRouter;

const UNDECODABLE_TASK: &str = "<undecodable>";

#[derive(Clone, Debug)]
struct QueuedMessage {
    message: String,
    task: String,
    attempt: u32,
}

impl QueuedMessage {
    fn first_delivery(message: String) -> Self {
        let task = TaskEnvelope::from_message(&message)
            .map(|envelope| envelope.task().to_string())
            .unwrap_or_else(|_| UNDECODABLE_TASK.to_string());
        Self {
            message,
            task,
            attempt: 1,
        }
    }

    fn redelivery(self) -> Self {
        Self {
            attempt: self.attempt.saturating_add(1),
            ..self
        }
    }
}

/// What a finished crawl did, counted per delivery.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CrawlReport {
    pub processed: usize,
    pub failed_attempts: usize,
    pub retried: usize,
    pub dead_letters: Vec<DeadLetter>,
    pub completed_by_kind: BTreeMap<String, usize>,
}

impl CrawlReport {
    pub fn completed(&self, task: &str) -> usize {
        self.completed_by_kind.get(task).copied().unwrap_or(0)
    }
}

/// Drives a whole crawl in process: each delivery runs the router on the
/// blocking pool, successful follow-ups are enqueued, retryable failures are
/// redelivered until `max_attempts`, and the rest are dead-lettered.
pub struct InMemoryCrawlQueue {
    router: TaskRouter,
    config: CrawlQueueConfig,
    dead_letter_store: Option<Arc<dyn DeadLetterStore>>,
}

impl InMemoryCrawlQueue {
    pub fn new(router: TaskRouter, config: CrawlQueueConfig) -> Self {
        Self {
            router,
            config,
            dead_letter_store: None,
        }
    }

    pub fn with_dead_letter_store(mut self, store: Arc<dyn DeadLetterStore>) -> Self {
        self.dead_letter_store = Some(store);
        self
    }

    pub async fn run(
        &self,
        seeds: impl IntoIterator<Item = TaskEnvelope>,
    ) -> OrchestrationResult<CrawlReport> {
        let messages = seeds
            .into_iter()
            .map(|envelope| envelope.to_message())
            .collect::<CoreResult<Vec<_>>>()?;
        self.run_messages(messages).await
    }

    /// Runs until no message is queued or in flight.
    pub async fn run_messages(
        &self,
        messages: impl IntoIterator<Item = String>,
    ) -> OrchestrationResult<CrawlReport> {
        let mut pending: VecDeque<QueuedMessage> = messages
            .into_iter()
            .map(QueuedMessage::first_delivery)
            .collect();
        let mut in_flight = JoinSet::new();
        let mut report = CrawlReport::default();
        let max_in_flight = self.config.max_in_flight.max(1);

        loop {
            while in_flight.len() < max_in_flight
                && let Some(queued) = pending.pop_front()
            {
                let router = self.router.clone();
                in_flight.spawn(async move {
                    let message = queued.message.clone();
                    let result =
                        tokio::task::spawn_blocking(move || router.execute_message(&message))
                            .await
                            .map_err(|join_error| {
                                CoreError::new(
                                    CoreErrorKind::Internal,
                                    format!("crawl worker join failure: {join_error}"),
                                )
                            })
                            .and_then(|result| result);
                    (queued, result)
                });
            }

            let Some(joined) = in_flight.join_next().await else {
                break;
            };
            let (queued, result) = joined.map_err(|join_error| {
                CoreError::new(
                    CoreErrorKind::Internal,
                    format!("crawl delivery join failure: {join_error}"),
                )
            })?;

            match result {
                Ok(follow_ups) => {
                    report.processed += 1;
                    *report
                        .completed_by_kind
                        .entry(queued.task.clone())
                        .or_default() += 1;
                    pending.extend(follow_ups.into_iter().map(QueuedMessage::first_delivery));
                }
                Err(error) => {
                    report.failed_attempts += 1;
                    if error.is_retryable() && queued.attempt < self.config.max_attempts {
                        tracing::warn!(
                            task = queued.task.as_str(),
                            attempt = queued.attempt,
                            kind = ?error.kind,
                            message = %error.message,
                            "requeueing failed delivery"
                        );
                        report.retried += 1;
                        pending.push_back(queued.redelivery());
                    } else {
                        let dead_letter = self.dead_letter(queued, &error).await?;
                        report.dead_letters.push(dead_letter);
                    }
                }
            }
        }

        tracing::info!(
            processed = report.processed,
            failed_attempts = report.failed_attempts,
            dead_letters = report.dead_letters.len(),
            "crawl finished"
        );
        Ok(report)
    }

    async fn dead_letter(
        &self,
        queued: QueuedMessage,
        error: &CoreError,
    ) -> OrchestrationResult<DeadLetter> {
        tracing::error!(
            task = queued.task.as_str(),
            attempts = queued.attempt,
            kind = ?error.kind,
            message = %error.message,
            "dead-lettering delivery"
        );

        let dead_letter = DeadLetter::from_failure(
            queued.message,
            error,
            queued.attempt,
            self.router.context().clock.now(),
        );

        if let Some(store) = &self.dead_letter_store {
            let store = store.clone();
            let record = dead_letter.clone();
            tokio::task::spawn_blocking(move || store.record_dead_letter(&record))
                .await
                .map_err(|join_error| {
                    CoreError::new(
                        CoreErrorKind::Internal,
                        format!("dead-letter persistence join failure: {join_error}"),
                    )
                })??;
        }

        Ok(dead_letter)
    }
}
