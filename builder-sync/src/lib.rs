//! # Page Builder Sync
//!
//! Persistence bridge between the editing engine in `builder-core` and the
//! storefront Pages API. Shared by the `page-builder` binary and the
//! integration tests.
//!
//! - [`PagesClient`] - HTTP client with bounded fixed-backoff retry
//! - [`load_page`] - fetch a page and read its body into a document
//! - [`AutoSaver`] - debounced saves with stale-result suppression
//! - [`PageSession`] - editor plus persistence for one page

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod autosave;
pub mod commands;
pub mod config;
pub mod loader;
pub mod pages;
pub mod session;

pub use autosave::{AutoSaver, SaveEvent, DEFAULT_DEBOUNCE};
pub use config::{BridgeConfig, CliArgs, Command};
pub use loader::{load_page, normalize_markup, LoadedPage};
pub use pages::{BridgeError, Page, PageResponse, PagesApi, PagesClient, RetryConfig, SaveResponse};
pub use session::PageSession;
