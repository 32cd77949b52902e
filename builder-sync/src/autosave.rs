//! Debounced auto-save.
//!
//! Every change notification restarts a quiet-period timer; when it expires
//! the most recent markup is saved once. Each save is stamped with a
//! generation number, and its completion is only reported while that
//! generation is still the newest, so a slow older save can never announce
//! "saved" after a newer one has started. The markup of a failed save is kept
//! until the next flush, which retries it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::pages::PagesApi;

/// Default quiet period before a save.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Save progress, broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveEvent {
    /// A save started.
    Saving {
        /// Save generation.
        generation: u64,
    },
    /// The save succeeded and is still the newest.
    Saved {
        /// Save generation.
        generation: u64,
    },
    /// The save failed and is still the newest.
    Failed {
        /// Save generation.
        generation: u64,
        /// Error description.
        error: String,
    },
}

enum Command {
    Changed(String),
    Flush,
}

/// A newest-generation save that failed, reported back to the worker.
struct FailedSave {
    generation: u64,
    markup: String,
}

/// Handle to the auto-save task of one page.
pub struct AutoSaver {
    commands: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<SaveEvent>,
    latest: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl AutoSaver {
    /// Spawn the auto-save task for `page_id`.
    #[must_use]
    pub fn spawn(api: Arc<dyn PagesApi>, page_id: impl Into<String>, debounce: Duration) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(64);
        let latest = Arc::new(AtomicU64::new(0));
        let closed = Arc::new(AtomicBool::new(false));
        let (failures, failed_rx) = mpsc::unbounded_channel();

        let worker = Worker {
            api,
            page_id: page_id.into(),
            debounce,
            events: events.clone(),
            latest: Arc::clone(&latest),
            closed: Arc::clone(&closed),
            failures,
        };
        let task = tokio::spawn(worker.run(rx, failed_rx));

        Self {
            commands,
            events,
            latest,
            closed,
            task,
        }
    }

    /// Report that the document changed; `markup` is its current serialization.
    pub fn notify(&self, markup: String) {
        if self.commands.send(Command::Changed(markup)).is_err() {
            debug!("auto-saver stopped, change dropped");
        }
    }

    /// Save pending changes now instead of waiting for the quiet period. With
    /// nothing pending, retries the newest save if it failed.
    pub fn flush(&self) {
        let _ = self.commands.send(Command::Flush);
    }

    /// Subscribe to save progress.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SaveEvent> {
        self.events.subscribe()
    }

    /// Generation of the newest save started so far (0 before the first).
    #[must_use]
    pub fn latest_generation(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Stop the task. Pending changes and queued flushes are discarded and
    /// in-flight saves will not report completion.
    pub async fn shutdown(self) {
        self.closed.store(true, Ordering::SeqCst);
        self.latest.fetch_add(1, Ordering::SeqCst);
        drop(self.commands);
        if let Err(e) = self.task.await {
            warn!("auto-save task ended abnormally: {e}");
        }
    }
}

struct Worker {
    api: Arc<dyn PagesApi>,
    page_id: String,
    debounce: Duration,
    events: broadcast::Sender<SaveEvent>,
    latest: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
    failures: mpsc::UnboundedSender<FailedSave>,
}

impl Worker {
    async fn run(
        self,
        mut rx: mpsc::UnboundedReceiver<Command>,
        mut failed_rx: mpsc::UnboundedReceiver<FailedSave>,
    ) {
        let mut pending: Option<String> = None;
        let mut retry: Option<String> = None;
        let mut deadline = Instant::now();

        loop {
            let command = tokio::select! {
                command = rx.recv() => command,
                () = sleep_until(deadline), if pending.is_some() => Some(Command::Flush),
                Some(failed) = failed_rx.recv() => {
                    if failed.generation == self.latest.load(Ordering::SeqCst) {
                        retry = Some(failed.markup);
                    }
                    continue;
                }
            };

            if self.closed.load(Ordering::SeqCst) {
                debug!(page_id = %self.page_id, "auto-saver closed, discarding changes");
                return;
            }

            match command {
                Some(Command::Changed(markup)) => {
                    pending = Some(markup);
                    deadline = Instant::now() + self.debounce;
                }
                Some(Command::Flush) => {
                    if let Some(markup) = pending.take().or_else(|| retry.take()) {
                        retry = None;
                        self.start_save(markup);
                    }
                }
                None => {
                    debug!(page_id = %self.page_id, "auto-saver shut down");
                    return;
                }
            }
        }
    }

    fn start_save(&self, markup: String) {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.events.send(SaveEvent::Saving { generation });
        debug!(page_id = %self.page_id, generation, bytes = markup.len(), "saving page");

        let api = Arc::clone(&self.api);
        let page_id = self.page_id.clone();
        let events = self.events.clone();
        let latest = Arc::clone(&self.latest);
        let closed = Arc::clone(&self.closed);
        let failures = self.failures.clone();
        tokio::spawn(async move {
            let result = api.save_page(&page_id, &markup).await;
            if closed.load(Ordering::SeqCst) || latest.load(Ordering::SeqCst) != generation {
                debug!(%page_id, generation, "discarding result of superseded save");
                return;
            }
            let event = match result {
                Ok(()) => {
                    info!(%page_id, generation, "page saved");
                    SaveEvent::Saved { generation }
                }
                Err(e) => {
                    warn!(%page_id, generation, "page save failed: {e}");
                    let _ = failures.send(FailedSave { generation, markup });
                    SaveEvent::Failed {
                        generation,
                        error: e.to_string(),
                    }
                }
            };
            let _ = events.send(event);
        });
    }
}
