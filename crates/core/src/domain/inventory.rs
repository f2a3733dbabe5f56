use serde::{Deserialize, Serialize};

use crate::domain::owner::OwnerId;
use crate::errors::DomainError;

pub const DEFAULT_CATEGORY: &str = "Other";

/// Catalogue identifier supplied by the app's master list (e.g. `"101"`, `"FB1"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub String);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub owner_id: OwnerId,
    /// Multilingual synonyms. The first entry is the canonical display name.
    pub names: Vec<String>,
    /// `0.0` means the shopkeeper has not set a price yet.
    pub price: f64,
    pub unit: String,
    pub category: String,
}

impl InventoryItem {
    pub fn display_name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or_default()
    }

    pub fn is_priced(&self) -> bool {
        self.price > 0.0
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.id.0.trim().is_empty() {
            return Err(DomainError::InvalidInventoryItem("item id must not be blank".to_string()));
        }
        if self.names.iter().all(|name| name.trim().is_empty()) {
            return Err(DomainError::InvalidInventoryItem(format!(
                "item `{}` needs at least one name",
                self.id.0
            )));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(DomainError::InvalidInventoryItem(format!(
                "item `{}` has invalid price {}",
                self.id.0, self.price
            )));
        }
        Ok(())
    }
}

/// Trims every name and drops blanks, keeping the original order.
pub fn normalize_names(names: Vec<String>) -> Vec<String> {
    names.into_iter().map(|name| name.trim().to_string()).filter(|name| !name.is_empty()).collect()
}

pub fn normalize_category(category: Option<&str>) -> String {
    match category.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => DEFAULT_CATEGORY.to_string(),
    }
}
