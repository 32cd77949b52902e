//! Loading pages into documents.

use builder_core::{deserialize, serialize, Document, EditorError, WidgetRegistry};
use tracing::{info, warn};

use crate::pages::{BridgeError, PagesApi};

/// A page read from the Pages API.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedPage {
    /// Page title (empty when unknown).
    pub title: String,
    /// URL handle (empty when unknown).
    pub handle: String,
    /// Last update timestamp, if reported.
    pub updated_at: Option<String>,
    /// The page body as an element tree.
    pub document: Document,
    /// Why the stored body was replaced by an empty document, if it was.
    pub warning: Option<EditorError>,
}

/// Fetch a page and read its body.
///
/// A `success: false` answer, a missing page or a missing body all yield an
/// empty document so the merchant can start building. Stored markup that
/// cannot be read also yields an empty document, with the parse error in
/// [`LoadedPage::warning`].
///
/// # Errors
///
/// Returns [`BridgeError`] if the API is unreachable after retries.
pub async fn load_page(
    api: &dyn PagesApi,
    page_id: &str,
    registry: &WidgetRegistry,
) -> Result<LoadedPage, BridgeError> {
    let response = api.fetch_page(page_id).await?;

    let page = match response.page {
        Some(page) if response.success => page,
        _ => {
            warn!(
                page_id,
                error = response.error.as_deref().unwrap_or("page missing"),
                "page not available, starting with an empty document"
            );
            return Ok(LoadedPage {
                title: String::new(),
                handle: String::new(),
                updated_at: None,
                document: Document::new(),
                warning: None,
            });
        }
    };

    let (document, warning) = match page.body_html.as_deref().map(|m| deserialize(m, registry)) {
        Some(Ok(document)) => (document, None),
        Some(Err(e)) => {
            warn!(page_id, "stored page body unreadable, starting with an empty document: {e}");
            (Document::new(), Some(e))
        }
        None => (Document::new(), None),
    };
    info!(
        page_id,
        elements = document.element_count(),
        "loaded page"
    );

    Ok(LoadedPage {
        title: page.title,
        handle: page.handle,
        updated_at: page.updated_at,
        document,
        warning,
    })
}

/// Read markup and write it back in canonical form.
///
/// # Errors
///
/// Returns an error if the markup is malformed.
pub fn normalize_markup(markup: &str, registry: &WidgetRegistry) -> Result<String, BridgeError> {
    let document = deserialize(markup, registry)?;
    Ok(serialize(&document, registry))
}
