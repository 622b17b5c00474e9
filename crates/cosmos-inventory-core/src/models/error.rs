use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::models::{ApiKind, TaskKind};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CoreErrorKind {
    MalformedAddress,
    InvalidInput,
    UnrecognizedTask,
    ParseFailure,
    ProviderFailure,
    Transient,
    TelemetryUpload,
    StorageFailure,
    Internal,
}

impl CoreErrorKind {
    /// Whether a failed delivery should go back to the queue instead of the
    /// dead-letter store.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Transient | Self::TelemetryUpload | Self::StorageFailure | Self::Internal
        )
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CoreError {
    pub task: Option<TaskKind>,
    pub api_kind: Option<ApiKind>,
    pub kind: CoreErrorKind,
    pub message: String,
}

impl CoreError {
    pub fn new(kind: CoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            task: None,
            api_kind: None,
            kind,
            message: message.into(),
        }
    }

    pub fn with_task(mut self, task: TaskKind) -> Self {
        self.task = Some(task);
        self
    }

    pub fn with_api_kind(mut self, api_kind: ApiKind) -> Self {
        self.api_kind = Some(api_kind);
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.task {
            Some(task) => write!(f, "{:?} [{}]: {}", self.kind, task.as_str(), self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for CoreError {}

pub type CoreResult<T> = Result<T, CoreError>;

/// Fills in task and dialect attribution that lower layers could not know.
pub fn attribute_error(
    error: CoreError,
    task: TaskKind,
    api_kind: Option<ApiKind>,
) -> CoreError {
    CoreError {
        task: error.task.or(Some(task)),
        api_kind: error.api_kind.or(api_kind),
        kind: error.kind,
        message: error.message,
    }
}
