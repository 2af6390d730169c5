//! Layout metadata sources.
//!
//! A layout is addressed by `(entityName, viewName)`: `("patient", "Edit")`
//! for a form, `("Contact", "ContactCard")` for a lookup view.

use crate::client::DEFAULT_TIMEOUT;
use crate::error::Error;
use recordform_core::Layout;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Where layouts come from.
pub trait LayoutSource {
    /// Fetch the field tree for an entity view.
    fn fetch_layout(
        &self,
        entity_name: &str,
        view_name: &str,
    ) -> impl Future<Output = Result<Layout, Error>> + Send;
}

// Entity and view names are identifiers. Anything else could change the
// URL (`?`, `#`) or the file path (`.`, `/`).
fn check_segment(segment: &str) -> Result<(), Error> {
    let valid = !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(Error::Invalid(format!("invalid layout name '{}'", segment)));
    }
    Ok(())
}

// =============================================================================
// HTTP
// =============================================================================

/// Layouts served at `{base}/layouts/{entity}/{view}.json`.
#[derive(Debug, Clone)]
pub struct HttpLayoutSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpLayoutSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self::with_client(base_url, client)
    }

    /// Create a source with a custom request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    async fn download(&self, url: &str) -> Result<Layout, Error> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl LayoutSource for HttpLayoutSource {
    async fn fetch_layout(&self, entity_name: &str, view_name: &str) -> Result<Layout, Error> {
        check_segment(entity_name)?;
        check_segment(view_name)?;
        let url = format!("{}/layouts/{}/{}.json", self.base_url, entity_name, view_name);
        debug!(%url, "fetching layout");

        let result = self.download(&url).await;

        if let Err(e) = &result {
            warn!(%url, error = %e, "layout fetch failed");
        }
        result
    }
}

// =============================================================================
// FILESYSTEM
// =============================================================================

/// Layouts stored as `{root}/{entity}/{view}.json`.
#[derive(Debug, Clone)]
pub struct FileLayoutSource {
    root: PathBuf,
}

impl FileLayoutSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a layout file.
    pub fn path_for(&self, entity_name: &str, view_name: &str) -> Result<PathBuf, Error> {
        check_segment(entity_name)?;
        check_segment(view_name)?;
        Ok(self.root.join(entity_name).join(format!("{}.json", view_name)))
    }
}

impl LayoutSource for FileLayoutSource {
    async fn fetch_layout(&self, entity_name: &str, view_name: &str) -> Result<Layout, Error> {
        let path = self.path_for(entity_name, view_name)?;
        debug!(path = %path.display(), "reading layout");

        let result = read_layout(&path).await;

        if let Err(e) = &result {
            warn!(path = %path.display(), error = %e, "layout read failed");
        }
        result
    }
}

async fn read_layout(path: &Path) -> Result<Layout, Error> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

// =============================================================================
// EITHER
// =============================================================================

/// A layout source chosen at runtime.
#[derive(Debug, Clone)]
pub enum Layouts {
    Http(HttpLayoutSource),
    File(FileLayoutSource),
}

impl LayoutSource for Layouts {
    async fn fetch_layout(&self, entity_name: &str, view_name: &str) -> Result<Layout, Error> {
        match self {
            Self::Http(source) => source.fetch_layout(entity_name, view_name).await,
            Self::File(source) => source.fetch_layout(entity_name, view_name).await,
        }
    }
}
