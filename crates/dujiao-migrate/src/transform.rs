//! Pure mapping from legacy rows to new-API request payloads.
//!
//! Everything here is side-effect free: image resolution happens in
//! [`crate::assets`] before these functions run, and the orchestrator owns
//! slug minting. Each creation endpoint gets its own typed request struct
//! instead of an open-ended JSON map.

use serde::Serialize;

use crate::models::{LegacyCategory, LegacyProduct};

/// How a product is fulfilled after purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfillmentKind {
    /// Operator delivers by hand, free-form.
    ManualText,
    /// Card secrets are handed out automatically.
    Automatic,
    /// Operator delivers by hand, buyer fills a structured form.
    ManualForm,
}

impl FulfillmentKind {
    /// Maps the legacy `type` column. Unknown values fall back to
    /// manual-text, matching how the legacy shop treated them.
    #[must_use]
    pub fn from_legacy(kind: i64) -> Self {
        match kind {
            1 => Self::Automatic,
            2 => Self::ManualForm,
            _ => Self::ManualText,
        }
    }

    /// Wire value the new API expects.
    #[must_use]
    pub fn as_api(self) -> &'static str {
        match self {
            Self::Automatic => "auto",
            Self::ManualText | Self::ManualForm => "manual",
        }
    }
}

/// Localized text envelope used throughout the new API. Legacy data is
/// zh-CN only; the other locales are sent empty.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LocalizedText {
    /// Simplified Chinese.
    #[serde(rename = "zh-CN")]
    pub zh_cn: String,
    /// Traditional Chinese.
    #[serde(rename = "zh-TW")]
    pub zh_tw: String,
    /// English.
    #[serde(rename = "en-US")]
    pub en_us: String,
}

impl LocalizedText {
    /// Wraps a zh-CN value, leaving the other locales empty.
    #[must_use]
    pub fn zh(text: impl Into<String>) -> Self {
        Self {
            zh_cn: text.into(),
            ..Self::default()
        }
    }
}

/// One field of a manual-fulfillment form.
#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    /// Generated key, `field1`, `field2`, ...
    pub key: String,
    /// `text` or `textarea`.
    #[serde(rename = "type")]
    pub field_type: String,
    /// Whether the buyer must fill the field.
    pub required: bool,
    /// Display label.
    pub label: LocalizedText,
}

/// Form schema attached to manual-form products; empty otherwise.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ManualFormSchema {
    /// Ordered form fields.
    pub fields: Vec<FormField>,
}

/// `POST /categories` payload.
#[derive(Debug, Clone, Serialize)]
pub struct CreateCategoryRequest {
    /// Always zero; the API assigns the real id.
    pub id: i64,
    /// Localized display name.
    pub name: LocalizedText,
    /// URL slug, unique per run.
    pub slug: String,
    /// Ascending sort order on the new side.
    pub sort_order: i64,
}

/// `POST /products` payload.
#[derive(Debug, Clone, Serialize)]
pub struct CreateProductRequest {
    /// URL slug, unique per run.
    pub slug: String,
    /// New-side category id from the identity map.
    pub category_id: i64,
    /// Localized title.
    pub title: LocalizedText,
    /// Localized short description.
    pub description: LocalizedText,
    /// Localized long-form content.
    pub content: LocalizedText,
    /// `manual` or `auto`.
    pub fulfillment_type: String,
    /// Zero or one relocated image URL.
    pub images: Vec<String>,
    /// Migrated products are always listed.
    pub is_active: bool,
    /// Buyer form, non-empty only for manual-form products.
    pub manual_form_schema: ManualFormSchema,
    /// Manual stock pool, tracked only for manual-form products.
    pub manual_stock_total: i64,
    /// Sale price.
    pub price_amount: f64,
    /// Configured currency denomination.
    pub price_currency: String,
    /// Migrated products are buyable without an account.
    pub purchase_type: String,
    /// Legacy sort weight, passed through.
    pub sort_order: i64,
    /// Tags split from legacy keywords.
    pub tags: Vec<String>,
}

/// `POST /card-secrets/batch` payload.
#[derive(Debug, Clone, Serialize)]
pub struct CardBatchRequest {
    /// New-side product id from the identity map.
    pub product_id: i64,
    /// Secrets in this batch.
    pub secrets: Vec<String>,
    /// Generated batch identifier.
    pub batch_no: String,
    /// Human-readable provenance note.
    pub note: String,
}

/// A creation payload whose slug the conflict-retry loop may rewrite.
pub trait SluggedRequest: Serialize {
    /// Current slug of the payload.
    fn slug(&self) -> &str;
    /// Replaces the slug before a retry attempt.
    fn set_slug(&mut self, slug: String);
}

impl SluggedRequest for CreateCategoryRequest {
    fn slug(&self) -> &str {
        &self.slug
    }

    fn set_slug(&mut self, slug: String) {
        self.slug = slug;
    }
}

impl SluggedRequest for CreateProductRequest {
    fn slug(&self) -> &str {
        &self.slug
    }

    fn set_slug(&mut self, slug: String) {
        self.slug = slug;
    }
}

/// Builds the category creation payload.
///
/// The legacy store sorts descending by `ord`; the new side sorts
/// ascending, so the order is inverted against the batch maximum to
/// preserve relative ordering starting from 1.
#[must_use]
pub fn category_request(
    cat: &LegacyCategory,
    max_ord: i64,
    slug: String,
) -> CreateCategoryRequest {
    CreateCategoryRequest {
        id: 0,
        name: LocalizedText::zh(cat.name.clone()),
        slug,
        sort_order: max_ord - cat.ord + 1,
    }
}

/// Builds the product creation payload. `images` comes from the asset
/// relocator; `category_id` from the category identity map.
#[must_use]
pub fn product_request(
    prod: &LegacyProduct,
    category_id: i64,
    slug: String,
    images: Vec<String>,
    currency: &str,
) -> CreateProductRequest {
    let kind = FulfillmentKind::from_legacy(prod.kind);

    let manual_form_schema = match (kind, prod.form_spec.as_deref()) {
        (FulfillmentKind::ManualForm, Some(spec)) => parse_form_schema(spec),
        _ => ManualFormSchema::default(),
    };

    // Automatic fulfillment and plain manual-text delivery do not track a
    // manual stock pool.
    let manual_stock_total = if kind == FulfillmentKind::ManualForm {
        prod.in_stock
    } else {
        0
    };

    CreateProductRequest {
        slug,
        category_id,
        title: LocalizedText::zh(prod.name.clone()),
        description: LocalizedText::zh(prod.description.clone().unwrap_or_default()),
        content: LocalizedText::zh(prod.content.clone().unwrap_or_default()),
        fulfillment_type: kind.as_api().to_string(),
        images,
        is_active: true,
        manual_form_schema,
        manual_stock_total,
        price_amount: prod.price,
        price_currency: currency.to_string(),
        purchase_type: "guest".to_string(),
        sort_order: prod.ord,
        tags: parse_tags(prod.keywords.as_deref()),
    }
}

/// Splits comma-separated legacy keywords into a tag list, trimming
/// whitespace and dropping empties.
#[must_use]
pub fn parse_tags(keywords: Option<&str>) -> Vec<String> {
    keywords
        .map(|kw| {
            kw.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Parses the legacy pipe/newline form spec into a form schema.
///
/// Each non-blank line with at least two pipe-delimited tokens
/// `raw_key|label|required?|multiline?` emits one field; field keys are
/// `field<N>` with N counting emitted fields, not input lines.
#[must_use]
pub fn parse_form_schema(spec: &str) -> ManualFormSchema {
    let mut fields = Vec::new();
    for line in spec.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split('|').collect();
        if parts.len() < 2 {
            continue;
        }
        let required = parts.get(2).copied() == Some("1");
        let field_type = if parts.get(3).copied() == Some("1") {
            "textarea"
        } else {
            "text"
        };
        fields.push(FormField {
            key: format!("field{}", fields.len() + 1),
            field_type: field_type.to_string(),
            required,
            label: LocalizedText::zh(parts[1]),
        });
    }
    ManualFormSchema { fields }
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;
