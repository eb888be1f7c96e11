//! Legacy row shapes and run-scoped bookkeeping types.
//!
//! Nullable legacy columns are `Option<String>`, never sentinel empty
//! strings; the transformers decide what an absent value maps to.

use std::collections::HashMap;

/// A row of the legacy `goods_group` table.
#[derive(Debug, Clone)]
pub struct LegacyCategory {
    /// Legacy primary key.
    pub id: i64,
    /// Display name (`gp_name`).
    pub name: String,
    /// Legacy sort weight (`ord`, descending convention).
    pub ord: i64,
    /// Enabled flag (`is_open`).
    pub is_open: i64,
}

/// A row of the legacy `goods` table.
#[derive(Debug, Clone)]
pub struct LegacyProduct {
    /// Legacy primary key.
    pub id: i64,
    /// Legacy category id (`group_id`).
    pub group_id: i64,
    /// Display name (`gd_name`).
    pub name: String,
    /// Short description (`gd_description`).
    pub description: Option<String>,
    /// Comma-separated keywords (`gd_keywords`).
    pub keywords: Option<String>,
    /// Image path or URL (`picture`).
    pub picture: Option<String>,
    /// Sale price (`actual_price`).
    pub price: f64,
    /// Stock counter (`in_stock`).
    pub in_stock: i64,
    /// Legacy sort weight (`ord`).
    pub ord: i64,
    /// Fulfillment kind (`type`): 0 manual-text, 1 automatic, 2 manual-form.
    pub kind: i64,
    /// Long-form content (`description` column).
    pub content: Option<String>,
    /// Pipe/newline form spec (`other_ipu_cnf`), meaningful only for kind 2.
    pub form_spec: Option<String>,
    /// Enabled flag (`is_open`).
    pub is_open: i64,
}

/// Where a legacy entity ended up on the new side.
#[derive(Debug, Clone)]
pub struct MappedEntity {
    /// Primary key assigned (or found) on the new side.
    pub remote_id: i64,
    /// Slug the entity is reachable under.
    pub slug: String,
}

/// Legacy id -> new-side identity, built fresh every run.
pub type IdentityMap = HashMap<i64, MappedEntity>;

/// Success/skip/failure counters for one migration phase.
#[derive(Debug, Default, Clone, Copy)]
pub struct PhaseStats {
    /// Entities created on the new side.
    pub success: u64,
    /// Entities already present or not eligible.
    pub skipped: u64,
    /// Entities whose creation failed.
    pub failed: u64,
}

/// Counters for card-secret imports (batches are all-or-nothing, so there
/// is no skip state).
#[derive(Debug, Default, Clone, Copy)]
pub struct CardStats {
    /// Secrets imported.
    pub success: u64,
    /// Secrets in batches that failed.
    pub failed: u64,
}

/// Aggregate statistics for a whole run. Owned by the orchestrator,
/// constructed once per run, only ever incremented.
#[derive(Debug, Default, Clone, Copy)]
pub struct MigrationStats {
    /// Category phase counters.
    pub categories: PhaseStats,
    /// Product phase counters.
    pub products: PhaseStats,
    /// Card-secret phase counters.
    pub cards: CardStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_default_is_zeroed() {
        let stats = MigrationStats::default();
        assert_eq!(stats.categories.success, 0);
        assert_eq!(stats.products.skipped, 0);
        assert_eq!(stats.cards.failed, 0);
    }

    #[test]
    fn test_identity_map_lookup() {
        let mut map = IdentityMap::new();
        map.insert(
            7,
            MappedEntity {
                remote_id: 42,
                slug: "steam-key".to_string(),
            },
        );
        assert_eq!(map.get(&7).unwrap().remote_id, 42);
        assert!(map.get(&8).is_none());
    }
}
