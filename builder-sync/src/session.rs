//! An editing session bound to one stored page.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use builder_core::{EditorContext, EditorResult, WidgetRegistry};
use tokio::sync::broadcast;
use tracing::info;

use crate::autosave::{AutoSaver, SaveEvent};
use crate::config::BridgeConfig;
use crate::loader::{load_page, LoadedPage};
use crate::pages::{BridgeError, PagesApi};

/// Editor plus persistence for one page.
///
/// The editor lives behind a mutex that is never held across an `.await`.
/// Every edit that changes the document is forwarded to the auto-saver.
pub struct PageSession {
    editor: Arc<Mutex<EditorContext>>,
    api: Arc<dyn PagesApi>,
    page_id: String,
    saver: AutoSaver,
}

impl PageSession {
    /// Open a session with an empty document. Call [`PageSession::load`] to
    /// read the stored page.
    #[must_use]
    pub fn new(
        api: Arc<dyn PagesApi>,
        page_id: impl Into<String>,
        registry: Arc<WidgetRegistry>,
        config: &BridgeConfig,
    ) -> Self {
        let page_id = page_id.into();
        let saver = AutoSaver::spawn(Arc::clone(&api), page_id.clone(), config.debounce);
        Self {
            editor: Arc::new(Mutex::new(EditorContext::new(registry))),
            api,
            page_id,
            saver,
        }
    }

    /// Page this session edits.
    #[must_use]
    pub fn page_id(&self) -> &str {
        &self.page_id
    }

    /// Shared handle to the editor.
    #[must_use]
    pub fn editor(&self) -> Arc<Mutex<EditorContext>> {
        Arc::clone(&self.editor)
    }

    fn lock(&self) -> MutexGuard<'_, EditorContext> {
        self.editor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load the stored page. Edits are refused with `Busy` until it completes.
    /// Unreadable stored markup loads as an empty document; the returned
    /// page's `warning` says why.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError`] if a load is already pending or the API fails.
    /// The current document is kept on error.
    pub async fn load(&self) -> Result<LoadedPage, BridgeError> {
        let registry = {
            let mut editor = self.lock();
            editor.begin_pending("load")?;
            Arc::clone(editor.registry())
        };

        let result = load_page(self.api.as_ref(), &self.page_id, &registry).await;

        let mut editor = self.lock();
        editor.finish_pending();
        let loaded = result?;
        editor.replace_document(loaded.document.clone());
        info!(page_id = %self.page_id, title = %loaded.title, "session ready");
        Ok(loaded)
    }

    /// Run an editing operation. If it changes the document, an auto-save is
    /// scheduled.
    ///
    /// # Errors
    ///
    /// Returns the operation's error wrapped in [`BridgeError::Editor`].
    pub fn edit<R>(
        &self,
        operation: impl FnOnce(&mut EditorContext) -> EditorResult<R>,
    ) -> Result<R, BridgeError> {
        let mut editor = self.lock();
        let revision = editor.revision();
        let result = operation(&mut *editor)?;
        if editor.revision() != revision {
            self.saver.notify(editor.serialize());
        }
        Ok(result)
    }

    /// Current page markup.
    #[must_use]
    pub fn markup(&self) -> String {
        self.lock().serialize()
    }

    /// Save pending changes without waiting for the quiet period, or retry
    /// the last save if it failed.
    pub fn save_now(&self) {
        self.saver.flush();
    }

    /// Subscribe to save progress.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SaveEvent> {
        self.saver.subscribe()
    }

    /// Leave the page. Unsaved changes are dropped and in-flight saves stop
    /// reporting.
    pub async fn close(self) {
        self.saver.shutdown().await;
    }
}
