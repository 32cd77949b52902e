//! Snapshot-based undo/redo history.
//!
//! Every successful mutation records a full copy of the document. The
//! history is linear: recording after an undo discards the redo branch.
//! When more than `cap` entries exist the oldest is dropped.

use std::collections::{BTreeMap, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{Document, EditorError, EditorResult};

/// Default number of snapshots kept.
pub const DEFAULT_HISTORY_CAP: usize = 50;

/// One recorded document state.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Document as it was after the mutation.
    pub document: Document,
    /// When the entry was recorded (ms since epoch).
    pub timestamp: u64,
    /// Short description of the mutation, e.g. `add heading`.
    pub label: String,
    /// Checkpoint label, if this entry was marked as one.
    pub checkpoint: Option<String>,
}

/// Linear snapshot history with a capacity limit.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    current: usize,
    cap: usize,
    checkpoints: BTreeMap<String, Document>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(Document::new())
    }
}

impl History {
    /// Create a history whose single entry is `initial`.
    #[must_use]
    pub fn new(initial: Document) -> Self {
        Self::with_cap(initial, DEFAULT_HISTORY_CAP)
    }

    /// Create a history with a custom capacity (at least 1).
    #[must_use]
    pub fn with_cap(initial: Document, cap: usize) -> Self {
        let mut history = Self {
            entries: VecDeque::new(),
            current: 0,
            cap: cap.max(1),
            checkpoints: BTreeMap::new(),
        };
        history.reset(initial);
        history
    }

    /// Drop all entries and checkpoints and start over from `document`.
    pub fn reset(&mut self, document: Document) {
        self.entries.clear();
        self.checkpoints.clear();
        self.entries.push_back(HistoryEntry {
            document,
            timestamp: now_ms(),
            label: "initial".to_string(),
            checkpoint: None,
        });
        self.current = 0;
    }

    /// Record a new state after the current one, discarding any redo branch.
    pub fn record(&mut self, document: Document, label: impl Into<String>) {
        self.entries.truncate(self.current + 1);
        self.entries.push_back(HistoryEntry {
            document,
            timestamp: now_ms(),
            label: label.into(),
            checkpoint: None,
        });
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
        self.current = self.entries.len() - 1;
    }

    /// Step back one entry. Returns the state to restore, or `None` at the start.
    pub fn undo(&mut self) -> Option<&Document> {
        if !self.can_undo() {
            return None;
        }
        self.current -= 1;
        self.entries.get(self.current).map(|e| &e.document)
    }

    /// Step forward one entry. Returns the state to restore, or `None` at the end.
    pub fn redo(&mut self) -> Option<&Document> {
        if !self.can_redo() {
            return None;
        }
        self.current += 1;
        self.entries.get(self.current).map(|e| &e.document)
    }

    /// Jump to an arbitrary entry (history panel click).
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::HistoryOutOfRange`] if `index` is not recorded.
    pub fn go_to(&mut self, index: usize) -> EditorResult<&Document> {
        let len = self.entries.len();
        if index >= len {
            return Err(EditorError::HistoryOutOfRange { index, len });
        }
        self.current = index;
        Ok(&self.entries[index].document)
    }

    /// Mark the current entry as a named checkpoint. The snapshot is kept
    /// even after the entry itself is evicted. Reusing a label replaces it.
    pub fn mark_checkpoint(&mut self, label: impl Into<String>) {
        let label = label.into();
        if let Some(entry) = self.entries.get_mut(self.current) {
            entry.checkpoint = Some(label.clone());
            self.checkpoints.insert(label, entry.document.clone());
        }
    }

    /// Snapshot stored under a checkpoint label.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::CheckpointNotFound`] if no such checkpoint exists.
    pub fn checkpoint(&self, label: &str) -> EditorResult<&Document> {
        self.checkpoints
            .get(label)
            .ok_or_else(|| EditorError::CheckpointNotFound(label.to_string()))
    }

    /// Checkpoint labels in name order.
    pub fn checkpoints(&self) -> impl Iterator<Item = &str> {
        self.checkpoints.keys().map(String::as_str)
    }

    /// The state at the current position.
    #[must_use]
    pub fn current(&self) -> &HistoryEntry {
        // `entries` is never empty: `reset` always pushes and `record` keeps at least one.
        &self.entries[self.current]
    }

    /// Recorded entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Index of the current entry.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`; a history holds at least its initial entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries kept.
    #[must_use]
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Check if undo is possible.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.current > 0
    }

    /// Check if redo is possible.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.current + 1 < self.entries.len()
    }
}

/// Current time in milliseconds since the Unix epoch.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Timestamps won't exceed u64 for billions of years
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
