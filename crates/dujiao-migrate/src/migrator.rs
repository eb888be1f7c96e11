//! Migration orchestration.
//!
//! Three sequential phases, each feeding the next: categories, then
//! products (which need the category identity map), then card secrets
//! (which need the product identity map). Per-item failures are logged
//! and counted, never propagated; only setup and phase-establishing
//! failures abort the run.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use serde_json::Value;
use tracing::{info, warn};

use crate::assets::AssetRelocator;
use crate::client::{ApiClient, ApiResponse};
use crate::config::Config;
use crate::db::LegacyStore;
use crate::directory::RemoteDirectory;
use crate::error::{Error, Result};
use crate::models::{IdentityMap, MappedEntity, MigrationStats};
use crate::retry::RetryPolicy;
use crate::slug::{ensure_unique_slug, slugify};
use crate::transform::{self, CardBatchRequest, SluggedRequest};

/// Suffixed attempts after a creation is rejected with the base slug.
const MAX_SLUG_RETRIES: u32 = 9;

/// Drives a whole migration run against one legacy store and one
/// authenticated API session.
pub struct Migrator {
    cfg: Config,
    store: LegacyStore,
    client: ApiClient,
    stats: MigrationStats,
}

impl Migrator {
    /// Connects to the legacy database and logs into the admin API.
    ///
    /// # Errors
    ///
    /// Both failures are fatal: no partial run is attempted.
    pub async fn connect(cfg: Config) -> Result<Self> {
        let store = LegacyStore::connect(&cfg.old_db).await?;
        info!("legacy database connected");

        let retry = RetryPolicy::new(cfg.options.retry_times, cfg.options.retry_delay);
        let mut client = ApiClient::new(cfg.new_api.base_url.clone(), retry);
        client
            .login(&cfg.new_api.username, &cfg.new_api.password)
            .await?;
        info!("admin API login succeeded");

        Ok(Self {
            cfg,
            store,
            client,
            stats: MigrationStats::default(),
        })
    }

    /// Counters accumulated so far.
    #[must_use]
    pub fn stats(&self) -> &MigrationStats {
        &self.stats
    }

    /// Runs the three migration phases and returns the final counters.
    ///
    /// # Errors
    ///
    /// Returns an error only when a phase cannot read its source rows;
    /// individual creation failures are counted and survived.
    pub async fn run(&mut self) -> Result<MigrationStats> {
        let categories = self.migrate_categories().await?;
        let products = self.migrate_products(&categories).await?;
        if self.cfg.options.migrate_cards {
            self.migrate_cards(&products).await?;
        }
        Ok(self.stats)
    }

    /// Closes the legacy database pool.
    pub async fn close(&self) {
        self.store.close().await;
    }

    async fn migrate_categories(&mut self) -> Result<IdentityMap> {
        info!("migrating categories");

        let categories = self
            .store
            .fetch_categories(self.cfg.options.only_active)
            .await?;
        if categories.is_empty() {
            info!("no categories to migrate");
            return Ok(IdentityMap::new());
        }

        let existing = self.existing_items("/categories").await;
        let max_ord = categories.iter().map(|c| c.ord).max().unwrap_or(0);
        let mut used: HashSet<String> = existing.keys().cloned().collect();
        let mut map = IdentityMap::new();

        for cat in &categories {
            let base_slug = slugify(&cat.name);

            if let Some(&existing_id) = existing.get(&base_slug) {
                info!(
                    "category '{}' skipped, already exists (id {existing_id})",
                    cat.name
                );
                map.insert(
                    cat.id,
                    MappedEntity {
                        remote_id: existing_id,
                        slug: base_slug,
                    },
                );
                self.stats.categories.skipped += 1;
                continue;
            }

            let slug = ensure_unique_slug(&base_slug, &mut used);
            let mut request = transform::category_request(cat, max_ord, slug);
            match self
                .create_with_slug_retry("/categories", &mut request, &base_slug, &mut used)
                .await
            {
                Ok(new_id) => {
                    info!("category '{}' migrated ({} -> {new_id})", cat.name, cat.id);
                    map.insert(
                        cat.id,
                        MappedEntity {
                            remote_id: new_id,
                            slug: request.slug().to_string(),
                        },
                    );
                    self.stats.categories.success += 1;
                }
                Err(e) => {
                    warn!("category '{}' failed: {e}", cat.name);
                    self.stats.categories.failed += 1;
                }
            }
        }

        Ok(map)
    }

    async fn migrate_products(&mut self, categories: &IdentityMap) -> Result<IdentityMap> {
        info!("migrating products");

        let products = self
            .store
            .fetch_products(self.cfg.options.only_active)
            .await?;
        if products.is_empty() {
            info!("no products to migrate");
            return Ok(IdentityMap::new());
        }

        let existing = self.existing_items("/products").await;
        let mut used: HashSet<String> = existing.keys().cloned().collect();
        let mut map = IdentityMap::new();

        let site_root = if self.cfg.options.old_site_path.is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.cfg.options.old_site_path))
        };
        let relocator = AssetRelocator::new(&self.client, site_root);

        for prod in &products {
            let Some(category) = categories.get(&prod.group_id) else {
                warn!("product '{}' skipped: category not migrated", prod.name);
                self.stats.products.skipped += 1;
                continue;
            };

            let base_slug = slugify(&prod.name);

            if let Some(&existing_id) = existing.get(&base_slug) {
                info!(
                    "product '{}' skipped, already exists (id {existing_id})",
                    prod.name
                );
                map.insert(
                    prod.id,
                    MappedEntity {
                        remote_id: existing_id,
                        slug: base_slug,
                    },
                );
                self.stats.products.skipped += 1;
                continue;
            }

            let images = match prod.picture.as_deref() {
                Some(picture) if !picture.is_empty() => {
                    let url = relocator.relocate(picture).await;
                    if url.is_empty() {
                        Vec::new()
                    } else {
                        vec![url]
                    }
                }
                _ => Vec::new(),
            };

            let slug = ensure_unique_slug(&base_slug, &mut used);
            let mut request = transform::product_request(
                prod,
                category.remote_id,
                slug,
                images,
                &self.cfg.options.currency,
            );
            match self
                .create_with_slug_retry("/products", &mut request, &base_slug, &mut used)
                .await
            {
                Ok(new_id) => {
                    info!("product '{}' migrated ({} -> {new_id})", prod.name, prod.id);
                    map.insert(
                        prod.id,
                        MappedEntity {
                            remote_id: new_id,
                            slug: request.slug().to_string(),
                        },
                    );
                    self.stats.products.success += 1;
                }
                Err(e) => {
                    warn!("product '{}' failed: {e}", prod.name);
                    self.stats.products.failed += 1;
                }
            }
        }

        Ok(map)
    }

    async fn migrate_cards(&mut self, products: &IdentityMap) -> Result<()> {
        info!("migrating card secrets");

        for (legacy_id, product) in products {
            let secrets = match self.store.fetch_card_secrets(*legacy_id).await {
                Ok(secrets) => secrets,
                Err(e) => {
                    warn!(
                        "product {}: reading card secrets failed: {e}",
                        product.remote_id
                    );
                    continue;
                }
            };
            if secrets.is_empty() {
                continue;
            }

            let timestamp = chrono::Local::now().format("%Y%m%d%H%M%S");
            for (seq, chunk) in secrets.chunks(self.cfg.options.batch_size).enumerate() {
                let request = CardBatchRequest {
                    product_id: product.remote_id,
                    secrets: chunk.to_vec(),
                    batch_no: format!("MIGRATE-{timestamp}-{legacy_id}-{}", seq + 1),
                    note: format!("migrated from legacy shop (legacy product id {legacy_id})"),
                };

                match self.client.post("/card-secrets/batch", &request).await {
                    Ok(resp) if resp.is_success() => {
                        info!(
                            "product {}: imported {} card secrets",
                            product.remote_id,
                            chunk.len()
                        );
                        self.stats.cards.success += chunk.len() as u64;
                    }
                    Ok(resp) => {
                        warn!(
                            "product {}: card import failed: {}",
                            product.remote_id, resp.msg
                        );
                        self.stats.cards.failed += chunk.len() as u64;
                    }
                    Err(e) => {
                        warn!("product {}: card import failed: {e}", product.remote_id);
                        self.stats.cards.failed += chunk.len() as u64;
                    }
                }
            }
        }

        Ok(())
    }

    /// Seeds the skip/merge index from the remote side. A read failure is
    /// item-recoverable: whatever was accumulated is used and the run goes
    /// on, trading perfect idempotence for forward progress.
    async fn existing_items(&self, endpoint: &str) -> HashMap<String, i64> {
        if !self.cfg.options.skip_existing {
            return HashMap::new();
        }
        let (items, err) = RemoteDirectory::new(&self.client)
            .list_existing(endpoint)
            .await;
        if let Some(e) = err {
            warn!(
                "listing existing items on {endpoint} failed: {e}; proceeding with {} recovered",
                items.len()
            );
        }
        items
    }

    /// Submits a creation, retrying rejected slugs with `-1` .. `-9`
    /// suffixes. Any non-zero status is presumed a slug conflict; a
    /// different validation failure burns through the same nine attempts
    /// before surfacing as [`Error::Api`] with the last response message.
    async fn create_with_slug_retry<R: SluggedRequest>(
        &self,
        endpoint: &str,
        request: &mut R,
        base_slug: &str,
        used: &mut HashSet<String>,
    ) -> Result<i64> {
        let mut last = self.client.post(endpoint, &*request).await?;
        if last.is_success() {
            return extract_id(&last);
        }

        for attempt in 1..=MAX_SLUG_RETRIES {
            let retry_slug = format!("{base_slug}-{attempt}");
            request.set_slug(retry_slug.clone());

            match self.client.post(endpoint, &*request).await {
                Ok(resp) if resp.is_success() => {
                    used.insert(retry_slug);
                    return extract_id(&resp);
                }
                Ok(resp) => last = resp,
                // Transport failures inside the retry ladder are skipped;
                // the next suffix gets its chance.
                Err(_) => {}
            }
        }

        Err(Error::Api(last.msg))
    }
}

/// Pulls the assigned id out of a creation response.
fn extract_id(resp: &ApiResponse) -> Result<i64> {
    resp.data
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| Error::ResponseShape("creation response carried no id".to_string()))
}
