//! Remote directory reader.
//!
//! Builds a `slug -> remote id` index from the new API's paginated listing
//! endpoints. The index seeds the slug registry and drives the
//! skip-existing decision: an entity whose base slug is already listed is
//! mapped to the existing id instead of being re-created.

use std::collections::HashMap;

use serde_json::Value;

use crate::client::ApiClient;
use crate::error::Error;

/// Page size requested from the listing endpoints.
pub const PAGE_SIZE: usize = 100;

/// Safety cap on pages read per endpoint, against a misbehaving or
/// infinitely-paginating endpoint.
pub const MAX_PAGES: usize = 100;

/// Read-only view over a remote listing endpoint.
pub struct RemoteDirectory<'a> {
    client: &'a ApiClient,
}

impl<'a> RemoteDirectory<'a> {
    /// Creates a reader over `client`.
    #[must_use]
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Lists every `slug -> id` pair the endpoint currently serves.
    ///
    /// Pages from 1 until an empty page, a non-success envelope, a page
    /// that adds nothing new, or the page cap. A transport failure ends
    /// the walk and is returned together with whatever was accumulated;
    /// the caller decides whether partial knowledge is good enough
    /// (the orchestrator warns and proceeds).
    pub async fn list_existing(&self, endpoint: &str) -> (HashMap<String, i64>, Option<Error>) {
        let mut items = HashMap::new();

        for page in 1..=MAX_PAGES {
            let url = format!("{endpoint}?page={page}&page_size={PAGE_SIZE}");
            let resp = match self.client.get(&url).await {
                Ok(resp) => resp,
                Err(e) => return (items, Some(e)),
            };

            if !resp.is_success() {
                break;
            }

            let Some(list) = extract_data_list(&resp.data) else {
                break;
            };
            if list.is_empty() {
                break;
            }

            let before = items.len();
            for item in list {
                let Some(slug) = item.get("slug").and_then(Value::as_str) else {
                    continue;
                };
                let Some(id) = item.get("id").and_then(Value::as_i64) else {
                    continue;
                };
                items.insert(slug.to_string(), id);
            }

            // An endpoint that keeps serving the same page would loop
            // forever without this.
            if items.len() == before {
                break;
            }
        }

        (items, None)
    }
}

/// Normalizes the two listing payload shapes the API is allowed to return:
/// either `data` is the list itself, or an object wrapping a nested `data`
/// list. Anything else yields `None`.
#[must_use]
pub fn extract_data_list(data: &Value) -> Option<&Vec<Value>> {
    if let Value::Array(list) = data {
        return Some(list);
    }
    if let Some(Value::Array(list)) = data.get("data") {
        return Some(list);
    }
    None
}

#[cfg(test)]
#[path = "directory_tests.rs"]
mod tests;
