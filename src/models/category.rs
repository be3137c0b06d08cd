//! Product category model.

use serde::{Deserialize, Serialize};

use super::CategoryId;
use crate::error::{Result, WholesaleError};

/// A product category. Its `code` prefixes the codes of its products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier (UUID).
    pub id: CategoryId,
    /// Short code, e.g. `"BEV"`.
    pub code: String,
    /// Display name.
    pub name: String,
}

/// Payload for creating or renaming a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryDraft {
    /// Short code.
    pub code: String,
    /// Display name.
    pub name: String,
}

impl CategoryDraft {
    /// Checks the draft before it is sent to the backend.
    ///
    /// # Errors
    ///
    /// Returns [`WholesaleError::InvalidRecord`] if the code or name is
    /// blank.
    #[inline]
    pub fn validate(&self) -> Result<()> {
        if self.code.trim().is_empty() || self.name.trim().is_empty() {
            return Err(WholesaleError::InvalidRecord(
                "category code and name must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Category fields embedded in product listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    /// Short code.
    pub code: String,
    /// Display name.
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_category() {
        let json = r#"{"id": "cat-1", "code": "BEV", "name": "Beverages"}"#;
        let category: Category = serde_json::from_str(json).unwrap();
        assert_eq!(category.id, CategoryId::from("cat-1"));
        assert_eq!(category.code, "BEV");
    }

    #[test]
    fn blank_draft_is_invalid() {
        let draft = CategoryDraft {
            code: "SN".to_owned(),
            name: " ".to_owned(),
        };
        assert!(matches!(
            draft.validate(),
            Err(WholesaleError::InvalidRecord(_))
        ));
    }

    #[test]
    fn category_ignores_extra_columns() {
        let json = r#"{
            "id": "cat-1",
            "code": "BEV",
            "name": "Beverages",
            "created_at": "2024-05-01T10:00:00+00:00"
        }"#;
        let category: Category = serde_json::from_str(json).unwrap();
        assert_eq!(category.name, "Beverages");
    }
}
