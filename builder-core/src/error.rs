//! Error types for editor operations.

use thiserror::Error;

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Errors that can occur while editing a document.
///
/// Every failing operation leaves the document, history and selection
/// exactly as they were before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    /// The widget type is not registered.
    #[error("Widget type unavailable: {0}")]
    UnknownWidget(String),

    /// A widget with this name is already registered.
    #[error("Widget already registered: {0}")]
    DuplicateWidget(String),

    /// The insert/move destination is missing or cannot hold children.
    #[error("Invalid parent: {0}")]
    InvalidParent(String),

    /// The node (or one of its descendants) already exists in the document.
    #[error("Duplicate element id: {0}")]
    DuplicateId(String),

    /// A move would place a node inside its own subtree.
    #[error("Cannot move element into its own subtree: {0}")]
    CycleDetected(String),

    /// Element not found in the document.
    #[error("Element not found: {0}")]
    NotFound(String),

    /// History index outside the recorded range.
    #[error("History index {index} out of range (length {len})")]
    HistoryOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of recorded entries.
        len: usize,
    },

    /// No checkpoint with this label.
    #[error("Checkpoint not found: {0}")]
    CheckpointNotFound(String),

    /// Persisted markup could not be read back into a document.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Another operation (e.g. a page load) is still pending.
    #[error("Editor busy: {0} in progress")]
    Busy(String),
}

/// Broad error category, used by the UI to decide how to report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input at the control that caused it.
    Validation,
    /// Operation on a stale or deleted target.
    NotFound,
    /// Persisted markup unreadable.
    Serialization,
    /// Rejected because another operation is in flight.
    Busy,
    /// Pages API unreachable or failing.
    Network,
}

/// How a failure is surfaced to the merchant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    /// Inline message next to the control.
    Inline,
    /// Non-fatal toast.
    Toast,
    /// Dismissible banner with a manual retry action.
    Banner,
    /// Persistent warning shown above the canvas.
    Warning,
}

impl ErrorKind {
    /// Presentation used for this kind of failure.
    #[must_use]
    pub const fn presentation(self) -> Presentation {
        match self {
            Self::Validation => Presentation::Inline,
            Self::NotFound | Self::Busy => Presentation::Toast,
            Self::Network => Presentation::Banner,
            Self::Serialization => Presentation::Warning,
        }
    }
}

impl EditorError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownWidget(_)
            | Self::DuplicateWidget(_)
            | Self::InvalidParent(_)
            | Self::DuplicateId(_)
            | Self::CycleDetected(_) => ErrorKind::Validation,
            Self::NotFound(_) | Self::HistoryOutOfRange { .. } | Self::CheckpointNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Busy(_) => ErrorKind::Busy,
        }
    }
}
