//! Implementations of the page-builder CLI commands.
//!
//! Each command returns the text to print so the binary stays a thin shell.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;
use builder_core::{serialize, WidgetRegistry};

use crate::loader::{load_page, normalize_markup};
use crate::pages::PagesApi;

/// List registered widgets grouped by palette category.
#[must_use]
pub fn widgets(registry: &WidgetRegistry) -> String {
    let mut out = String::new();
    for (category, definitions) in registry.by_category() {
        let _ = writeln!(out, "{category:?}");
        for definition in definitions {
            let container = if definition.accepts_children {
                " (container)"
            } else {
                ""
            };
            let _ = writeln!(
                out,
                "  {:<18} {}{container}",
                definition.name, definition.label
            );
        }
    }
    out
}

/// Read a local HTML file and return it in canonical form.
///
/// # Errors
///
/// Returns an error if the file cannot be read or its markup is malformed.
pub async fn normalize(path: &Path, registry: &WidgetRegistry) -> anyhow::Result<String> {
    let markup = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    normalize_markup(&markup, registry).with_context(|| format!("failed to parse {}", path.display()))
}

/// Load a page and return its markup, or its element tree as JSON.
///
/// # Errors
///
/// Returns an error if the page cannot be loaded.
pub async fn fetch(
    api: &dyn PagesApi,
    page_id: &str,
    json: bool,
    registry: &WidgetRegistry,
) -> anyhow::Result<String> {
    let loaded = load_page(api, page_id, registry)
        .await
        .with_context(|| format!("failed to load page {page_id}"))?;
    if let Some(warning) = &loaded.warning {
        tracing::warn!(page_id, "page body could not be read: {warning}");
    }
    if json {
        Ok(loaded.document.to_json()?)
    } else {
        Ok(serialize(&loaded.document, registry))
    }
}

/// Normalize a local HTML file and save it as the page body. Returns the
/// number of bytes saved.
///
/// # Errors
///
/// Returns an error if the file is unreadable or malformed, or the save fails.
pub async fn push(
    api: &dyn PagesApi,
    page_id: &str,
    path: &Path,
    registry: &WidgetRegistry,
) -> anyhow::Result<usize> {
    let markup = normalize(path, registry).await?;
    api.save_page(page_id, &markup)
        .await
        .with_context(|| format!("failed to save page {page_id}"))?;
    Ok(markup.len())
}
