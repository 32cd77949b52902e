//! # Page Builder Core
//!
//! Editing engine for a widget-based page builder: merchants compose a page
//! from widgets and containers, and the resulting element tree is persisted
//! as the page's HTML body.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                EditorContext                │
//! ├─────────────────────────────────────────────┤
//! │  Widget Registry  │  Canvas Controller      │
//! │  - Definitions    │  - Drag state machine   │
//! │  - Render/parse   │  - Click-to-add         │
//! ├─────────────────────────────────────────────┤
//! │  Document         │  History                │
//! │  - Element tree   │  - Snapshots (cap 50)   │
//! │  - Validated ops  │  - Checkpoints          │
//! ├─────────────────────────────────────────────┤
//! │  Selection/Panel  │  Serializer             │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The crate is synchronous and performs no I/O; `builder-sync` bridges it
//! to the Pages API.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod canvas;
pub mod context;
pub mod document;
pub mod element;
pub mod error;
pub mod history;
pub mod html;
pub mod selection;
pub mod serializer;
pub mod widget;

pub use canvas::{
    CanvasController, CanvasEvent, DragState, DropIndicator, DropOutcome, HoverTarget,
    KeyModifiers,
};
pub use context::{EditorContext, EventResponse};
pub use document::Document;
pub use element::{Element, ElementId, SettingValue, Settings};
pub use error::{EditorError, EditorResult, ErrorKind, Presentation};
pub use history::{History, HistoryEntry, DEFAULT_HISTORY_CAP};
pub use selection::{FormControl, NodeRender, PanelView, Selection};
pub use serializer::{deserialize, render_element, serialize};
pub use widget::{
    builtin_widgets, Control, SettingField, WidgetCategory, WidgetDefinition, WidgetRegistry,
};

/// Page builder core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
