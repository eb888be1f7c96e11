// Migration tool - pedantic lints relaxed for CLI ergonomics
#![allow(clippy::pedantic)]

//! # dujiao-migrate
//!
//! `dujiao-migrate` is a CLI tool and library for migrating a legacy
//! dujiaoka shop (categories, products, card secrets) into the new shop
//! service through its authenticated admin API.
//!
//! ## Phases
//!
//! | Phase | Reads | Creates | Depends on |
//! |-------|-------|---------|------------|
//! | Categories | `goods_group` | `POST /categories` | — |
//! | Products | `goods` | `POST /products` | category id map |
//! | Card secrets | `carmis` | `POST /card-secrets/batch` | product id map |
//!
//! Re-running against the same legacy data is safe: existing slugs on the
//! new side are detected through the listing endpoints and mapped instead
//! of re-created.
//!
//! ## Quick Start
//!
//! ```bash
//! # Write a sample configuration
//! dujiao-migrate init --output migration.yaml
//!
//! # Run the migration
//! dujiao-migrate run --config migration.yaml
//! ```
//!
//! ## Configuration Example
//!
//! ```yaml
//! old_db:
//!   driver: mysql
//!   host: 127.0.0.1
//!   port: 3306
//!   user: root
//!   password: secret
//!   database: dujiaoka
//!
//! new_api:
//!   base_url: http://127.0.0.1:8080/api/v1/admin
//!   username: admin
//!   password: admin123
//!
//! options:
//!   batch_size: 500
//!   migrate_cards: true
//! ```

#![warn(missing_docs)]

pub mod assets;
pub mod client;
pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod migrator;
pub mod models;
pub mod retry;
pub mod slug;
pub mod transform;

pub use client::{ApiClient, ApiResponse};
pub use config::{CliOverrides, Config};
pub use error::{Error, Result};
pub use migrator::Migrator;
pub use models::MigrationStats;
pub use retry::RetryPolicy;
pub use slug::{ensure_unique_slug, slugify};
