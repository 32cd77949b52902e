//! In-memory Pages API for driving sessions and the auto-saver in tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use builder_sync::{BridgeError, Page, PageResponse, PagesApi};

/// Records every save; fetches return a fixed page.
#[derive(Default)]
pub struct MemoryPages {
    body_html: Option<String>,
    fetch_delay: Duration,
    save_delays: Mutex<VecDeque<Duration>>,
    save_failures: Mutex<usize>,
    saves: Mutex<Vec<String>>,
}

impl MemoryPages {
    /// A store whose page has `body_html`.
    pub fn with_body(body_html: &str) -> Self {
        Self {
            body_html: Some(body_html.to_string()),
            ..Self::default()
        }
    }

    /// Delay every fetch by `delay`.
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    /// Delay the next saves, in order, by the given durations.
    pub fn with_save_delays(self, delays: &[Duration]) -> Self {
        *self.save_delays.lock().expect("lock") = delays.iter().copied().collect();
        self
    }

    /// Fail the next `count` saves.
    pub fn with_save_failures(self, count: usize) -> Self {
        *self.save_failures.lock().expect("lock") = count;
        self
    }

    /// Contents saved so far, in call order.
    pub fn saved(&self) -> Vec<String> {
        self.saves.lock().expect("lock").clone()
    }
}

#[async_trait]
impl PagesApi for MemoryPages {
    async fn fetch_page(&self, _page_id: &str) -> Result<PageResponse, BridgeError> {
        tokio::time::sleep(self.fetch_delay).await;
        Ok(PageResponse {
            success: true,
            page: Some(Page {
                title: "Landing".into(),
                body_html: self.body_html.clone(),
                handle: "landing".into(),
                updated_at: None,
            }),
            error: None,
        })
    }

    async fn save_page(&self, _page_id: &str, content: &str) -> Result<(), BridgeError> {
        self.saves.lock().expect("lock").push(content.to_string());
        let delay = self
            .save_delays
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_default();
        tokio::time::sleep(delay).await;
        let mut failures = self.save_failures.lock().expect("lock");
        if *failures > 0 {
            *failures -= 1;
            return Err(BridgeError::Rejected("store unavailable".into()));
        }
        Ok(())
    }
}
