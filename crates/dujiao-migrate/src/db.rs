//! Read-only access to the legacy store.
//!
//! The legacy schema lives in MySQL, PostgreSQL or SQLite depending on the
//! deployment; sqlx's `Any` driver gives one uniform row-reading interface
//! over all three. Queries are passed through verbatim, so the single
//! parameterized query switches placeholder syntax on the driver.

use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Row};

use crate::config::DbConfig;
use crate::error::{Error, Result};
use crate::models::{LegacyCategory, LegacyProduct};

/// Connection to the legacy database.
pub struct LegacyStore {
    pool: AnyPool,
    postgres: bool,
}

impl LegacyStore {
    /// Connects to the legacy database described by `cfg`.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown driver or a failed connection.
    pub async fn connect(cfg: &DbConfig) -> Result<Self> {
        sqlx::any::install_default_drivers();
        let dsn = build_dsn(cfg)?;
        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .connect(&dsn)
            .await?;
        Ok(Self {
            pool,
            postgres: cfg.driver == "postgres",
        })
    }

    /// Fetches eligible categories, ordered by descending legacy sort
    /// weight. Soft-deleted rows are always excluded; disabled rows only
    /// when `only_active`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row decoding fails; callers treat
    /// this as phase-fatal.
    pub async fn fetch_categories(&self, only_active: bool) -> Result<Vec<LegacyCategory>> {
        let mut sql =
            String::from("SELECT id, gp_name, ord, is_open FROM goods_group WHERE deleted_at IS NULL");
        if only_active {
            sql.push_str(" AND is_open = 1");
        }
        sql.push_str(" ORDER BY ord DESC");

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(category_from_row).collect()
    }

    /// Fetches eligible products, ordered by descending legacy sort
    /// weight, with the same filters as categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row decoding fails; callers treat
    /// this as phase-fatal.
    pub async fn fetch_products(&self, only_active: bool) -> Result<Vec<LegacyProduct>> {
        let mut sql = String::from(
            "SELECT id, group_id, gd_name, gd_description, gd_keywords, \
             picture, actual_price, in_stock, ord, type, \
             description, other_ipu_cnf, is_open \
             FROM goods WHERE deleted_at IS NULL",
        );
        if only_active {
            sql.push_str(" AND is_open = 1");
        }
        sql.push_str(" ORDER BY ord DESC");

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(product_from_row).collect()
    }

    /// Fetches the active, non-deleted card secrets of one legacy product.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails; callers log it and move on to
    /// the next product.
    pub async fn fetch_card_secrets(&self, product_id: i64) -> Result<Vec<String>> {
        let sql = if self.postgres {
            "SELECT carmi FROM carmis WHERE goods_id = $1 AND status = 1 AND deleted_at IS NULL"
        } else {
            "SELECT carmi FROM carmis WHERE goods_id = ? AND status = 1 AND deleted_at IS NULL"
        };

        let rows = sqlx::query(sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("carmi").map_err(Error::from))
            .collect()
    }

    /// Closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn category_from_row(row: &AnyRow) -> Result<LegacyCategory> {
    Ok(LegacyCategory {
        id: row.try_get("id")?,
        name: row.try_get("gp_name")?,
        ord: row.try_get("ord")?,
        is_open: row.try_get("is_open")?,
    })
}

fn product_from_row(row: &AnyRow) -> Result<LegacyProduct> {
    Ok(LegacyProduct {
        id: row.try_get("id")?,
        group_id: row.try_get("group_id")?,
        name: row.try_get("gd_name")?,
        description: row.try_get("gd_description")?,
        keywords: row.try_get("gd_keywords")?,
        picture: row.try_get("picture")?,
        price: row.try_get("actual_price")?,
        in_stock: row.try_get("in_stock")?,
        ord: row.try_get("ord")?,
        kind: row.try_get("type")?,
        content: row.try_get("description")?,
        form_spec: row.try_get("other_ipu_cnf")?,
        is_open: row.try_get("is_open")?,
    })
}

fn build_dsn(cfg: &DbConfig) -> Result<String> {
    match cfg.driver.as_str() {
        "mysql" => Ok(format!(
            "mysql://{}:{}@{}:{}/{}?charset={}",
            cfg.user, cfg.password, cfg.host, cfg.port, cfg.database, cfg.charset
        )),
        "postgres" => Ok(format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            cfg.user, cfg.password, cfg.host, cfg.port, cfg.database, cfg.ssl_mode
        )),
        "sqlite" => Ok(format!("sqlite://{}", cfg.database)),
        other => Err(Error::Config(format!(
            "unsupported database driver '{other}'"
        ))),
    }
}
