//! Catalog product model.

use serde::{Deserialize, Serialize};

use super::{CategoryId, CategoryRef, ProductId};
use crate::error::{Result, WholesaleError};
use crate::pricing::TierPrices;

/// A catalog product with its four volume-tier prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID).
    pub id: ProductId,
    /// Human-facing code: category code followed by a running number.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Opaque image reference (URL or storage path).
    #[serde(default)]
    pub image_url: Option<String>,
    /// Volume-tier unit prices.
    #[serde(flatten)]
    pub prices: TierPrices,
    /// Owning category.
    pub category_id: CategoryId,
    /// Embedded category, present when the listing joins it.
    #[serde(default, rename = "categories", skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryRef>,
}

impl Product {
    /// Checks the boundary constraints of a fetched record.
    ///
    /// Negative or non-finite prices are rejected. Prices that rise with
    /// the tier threshold are tolerated but logged.
    ///
    /// # Errors
    ///
    /// Returns [`WholesaleError::InvalidRecord`] if any price is negative
    /// or not finite.
    #[inline]
    pub fn validate(&self) -> Result<()> {
        check_prices(&self.code, &self.prices)
    }

    /// Returns the denormalized copy stored in a cart line.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            id: self.id.clone(),
            code: self.code.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            image_url: self.image_url.clone(),
            prices: self.prices,
            category_id: Some(self.category_id.clone()),
            category: self.category.clone(),
        }
    }
}

/// The product fields a cart line keeps so it can be priced and shown
/// offline.
///
/// Descriptive fields are optional so carts written by other clients load
/// and save back without losing them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Product identifier.
    pub id: ProductId,
    /// Product code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Opaque image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Tier prices at the time the product was added.
    #[serde(flatten)]
    pub prices: TierPrices,
    /// Owning category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    /// Category label.
    #[serde(default, rename = "categories", skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryRef>,
}

/// Editable product fields, used for both creation and update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDraft {
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Opaque image reference.
    pub image_url: Option<String>,
    /// Volume-tier unit prices.
    #[serde(flatten)]
    pub prices: TierPrices,
    /// Owning category.
    pub category_id: CategoryId,
}

impl ProductDraft {
    /// Checks the draft before it is sent to the backend.
    ///
    /// # Errors
    ///
    /// Returns [`WholesaleError::InvalidRecord`] if the name is blank or
    /// a price is negative or not finite.
    #[inline]
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(WholesaleError::InvalidRecord(
                "product name must not be empty".to_owned(),
            ));
        }
        check_prices(&self.name, &self.prices)
    }
}

/// Insert payload: a draft plus its generated code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProduct {
    /// Generated product code.
    pub code: String,
    /// Remaining product fields.
    #[serde(flatten)]
    pub draft: ProductDraft,
}

/// Row shape used when only product codes are selected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductCode {
    /// Product code.
    pub code: String,
}

/// Computes the next product code for a category.
///
/// The running number is one more than the largest numeric suffix among
/// `existing` codes that start with `category_code`, so codes freed by
/// deletions are never handed out again.
#[must_use]
pub fn next_product_code<'code, I>(category_code: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'code str>,
{
    let highest = existing
        .into_iter()
        .filter_map(|code| code.strip_prefix(category_code))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("{category_code}{}", highest.saturating_add(1))
}

/// Shared price check for fetched records and drafts.
fn check_prices(label: &str, prices: &TierPrices) -> Result<()> {
    if !prices.is_valid() {
        return Err(WholesaleError::InvalidRecord(format!(
            "product {label} has a negative or non-finite price"
        )));
    }
    if !prices.is_non_increasing() {
        tracing::warn!(product = %label, "tier prices rise with quantity");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Catalog listing row as returned with an embedded category.
    const PRODUCT_JSON: &str = r#"{
        "id": "p-1",
        "code": "BEV1",
        "name": "Sparkling Water",
        "description": null,
        "image_url": "https://cdn.example.com/water.png",
        "price_1": 10,
        "price_10": 9,
        "price_50": 8.5,
        "price_100": 8,
        "category_id": "cat-1",
        "created_at": "2024-05-01T10:00:00+00:00",
        "categories": {"code": "BEV", "name": "Beverages"}
    }"#;

    #[test]
    fn deserialize_product_with_category() {
        let product: Product = serde_json::from_str(PRODUCT_JSON).unwrap();
        assert_eq!(product.id, ProductId::from("p-1"));
        assert_eq!(product.prices, TierPrices::new(10.0, 9.0, 8.5, 8.0));
        assert_eq!(product.category.unwrap().code, "BEV");
        assert!(product.description.is_none());
    }

    #[test]
    fn deserialize_product_without_join() {
        let json = r#"{
            "id": "p-2",
            "code": "BEV2",
            "name": "Juice",
            "price_1": 3,
            "price_10": 3,
            "price_50": 2,
            "price_100": 2,
            "category_id": "cat-1"
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert!(product.category.is_none());
        assert!(product.image_url.is_none());
    }

    #[test]
    fn missing_price_column_is_rejected() {
        let json = r#"{
            "id": "p-3",
            "code": "BEV3",
            "name": "Tea",
            "price_1": 3,
            "price_10": 3,
            "price_50": 2,
            "category_id": "cat-1"
        }"#;
        assert!(serde_json::from_str::<Product>(json).is_err());
    }

    #[test]
    fn validate_rejects_negative_price() {
        let mut product: Product = serde_json::from_str(PRODUCT_JSON).unwrap();
        assert!(product.validate().is_ok());
        product.prices.price_50 = -1.0;
        assert!(matches!(
            product.validate(),
            Err(WholesaleError::InvalidRecord(_))
        ));
    }

    #[test]
    fn validate_tolerates_rising_prices() {
        let mut product: Product = serde_json::from_str(PRODUCT_JSON).unwrap();
        product.prices = TierPrices::new(1.0, 2.0, 3.0, 4.0);
        assert!(product.validate().is_ok());
    }

    #[test]
    fn draft_requires_name() {
        let draft = ProductDraft {
            name: "  ".to_owned(),
            description: None,
            image_url: None,
            prices: TierPrices::new(1.0, 1.0, 1.0, 1.0),
            category_id: CategoryId::from("cat-1"),
        };
        assert!(draft.validate().is_err());
    }

    #[test]
    fn new_product_serializes_flat() {
        let new_product = NewProduct {
            code: "BEV3".to_owned(),
            draft: ProductDraft {
                name: "Tea".to_owned(),
                description: Some("Green".to_owned()),
                image_url: None,
                prices: TierPrices::new(4.0, 3.5, 3.0, 2.5),
                category_id: CategoryId::from("cat-1"),
            },
        };
        let json = serde_json::to_value(&new_product).unwrap();
        assert_eq!(json["code"], "BEV3");
        assert_eq!(json["name"], "Tea");
        assert_eq!(json["price_10"], 3.5);
        assert_eq!(json["category_id"], "cat-1");
        assert!(json.get("draft").is_none());
    }

    #[test]
    fn next_code_skips_past_highest_suffix() {
        let existing = ["BEV1", "BEV2", "BEV7", "SNK9", "BEVX"];
        assert_eq!(next_product_code("BEV", existing), "BEV8");
    }

    #[test]
    fn next_code_for_empty_category() {
        assert_eq!(next_product_code("SNK", []), "SNK1");
    }

    #[test]
    fn snapshot_keeps_prices() {
        let product: Product = serde_json::from_str(PRODUCT_JSON).unwrap();
        let snapshot = product.snapshot();
        assert_eq!(snapshot.id, product.id);
        assert_eq!(snapshot.prices, product.prices);
    }
}
