//! Image relocation from the legacy site tree to the new API.
//!
//! Relocation is strictly best-effort: whatever goes wrong, the caller
//! gets a usable reference back (worst case the original one) and product
//! migration is never blocked.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{info, warn};

use crate::client::ApiClient;

/// Re-uploads legacy product images through the new API's upload endpoint.
pub struct AssetRelocator<'a> {
    client: &'a ApiClient,
    site_root: Option<PathBuf>,
}

impl<'a> AssetRelocator<'a> {
    /// Creates a relocator. `site_root` is the legacy site directory on
    /// disk; `None` disables relocation entirely (references pass through).
    #[must_use]
    pub fn new(client: &'a ApiClient, site_root: Option<PathBuf>) -> Self {
        Self { client, site_root }
    }

    /// Resolves a legacy image reference to its final URL.
    ///
    /// Empty input stays empty; fully-qualified URLs and references
    /// without a configured site root pass through unchanged. Local
    /// references are probed under the usual legacy public directories
    /// and uploaded; any failure along the way falls back to the
    /// original reference with a warning.
    pub async fn relocate(&self, picture: &str) -> String {
        if picture.is_empty() {
            return String::new();
        }

        let Some(root) = &self.site_root else {
            return picture.to_string();
        };

        // Remote-to-remote copying is out of scope.
        if picture.starts_with("http://") || picture.starts_with("https://") {
            return picture.to_string();
        }

        let local = if Path::new(picture).is_absolute() {
            PathBuf::from(picture)
        } else {
            let rel = picture.trim_start_matches('/');
            let candidates = [
                root.join("public").join(rel),
                root.join(rel),
                root.join("public").join("storage").join(rel),
            ];
            match candidates.into_iter().find(|p| p.exists()) {
                Some(p) => p,
                None => {
                    warn!("image file not found under site root: {picture}");
                    return picture.to_string();
                }
            }
        };

        if !local.exists() {
            warn!("image file not found: {}", local.display());
            return picture.to_string();
        }

        let resp = match self.client.upload_file(&local).await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("image upload failed: {e}");
                return picture.to_string();
            }
        };

        if !resp.is_success() {
            warn!("image upload rejected: {}", resp.msg);
            return picture.to_string();
        }

        match resp.data.get("url").and_then(Value::as_str) {
            Some(url) => {
                info!("image uploaded: {url}");
                url.to_string()
            }
            None => {
                warn!("upload response carried no url");
                picture.to_string()
            }
        }
    }
}

#[cfg(test)]
#[path = "assets_tests.rs"]
mod tests;
