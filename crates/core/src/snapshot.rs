//! Canonical inventory shape handed to the classifier and the provider.
//!
//! Only priced items reach the provider: it cannot price an item the
//! shopkeeper has not priced, so it must ask instead.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::inventory::{normalize_category, normalize_names, InventoryItem};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotItem {
    pub names: Vec<String>,
    pub price: f64,
    pub unit: String,
    pub category: String,
}

impl SnapshotItem {
    pub fn display_name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or_default()
    }

    pub fn is_priced(&self) -> bool {
        self.price > 0.0
    }

    /// Adapts a loosely-typed item record (as sent by the app or an import
    /// job) into the canonical shape.
    ///
    /// `names` may be a JSON array or a JSON-encoded array string; a bare
    /// `name` string is accepted as a single name. Missing or invalid prices
    /// become `0.0` (unpriced). Returns `None` when no usable name exists.
    pub fn from_record(record: &Value) -> Option<Self> {
        let object = record.as_object()?;

        let names = match object.get("names") {
            Some(Value::Array(values)) => string_values(values),
            Some(Value::String(encoded)) => match serde_json::from_str::<Value>(encoded) {
                Ok(Value::Array(values)) => string_values(&values),
                _ => vec![encoded.clone()],
            },
            _ => Vec::new(),
        };
        let names = match object.get("name").and_then(Value::as_str) {
            Some(name) if names.is_empty() => vec![name.to_string()],
            _ => names,
        };
        let names = normalize_names(names);
        if names.is_empty() {
            return None;
        }

        let price = object
            .get("price")
            .and_then(|value| match value {
                Value::Number(number) => number.as_f64(),
                Value::String(text) => text.trim().parse::<f64>().ok(),
                _ => None,
            })
            .filter(|price| price.is_finite() && *price >= 0.0)
            .unwrap_or(0.0);

        let unit = object.get("unit").and_then(Value::as_str).unwrap_or_default().trim().to_string();
        let category = normalize_category(object.get("category").and_then(Value::as_str));

        Some(Self { names, price, unit, category })
    }
}

impl From<&InventoryItem> for SnapshotItem {
    fn from(item: &InventoryItem) -> Self {
        Self {
            names: item.names.clone(),
            price: item.price,
            unit: item.unit.clone(),
            category: item.category.clone(),
        }
    }
}

fn string_values(values: &[Value]) -> Vec<String> {
    values.iter().filter_map(Value::as_str).map(ToString::to_string).collect()
}

/// Priced items only, in inventory order.
pub fn build_snapshot(inventory: &[InventoryItem]) -> Vec<SnapshotItem> {
    inventory.iter().filter(|item| item.is_priced()).map(SnapshotItem::from).collect()
}

/// Full catalogue (priced and unpriced) in canonical shape.
pub fn catalogue(inventory: &[InventoryItem]) -> Vec<SnapshotItem> {
    inventory.iter().map(SnapshotItem::from).collect()
}

pub fn catalogue_from_records(records: &[Value]) -> Vec<SnapshotItem> {
    records.iter().filter_map(SnapshotItem::from_record).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{build_snapshot, catalogue_from_records, SnapshotItem};
    use crate::domain::inventory::{InventoryItem, ItemId};
    use crate::domain::owner::OwnerId;

    fn item(id: &str, name: &str, price: f64) -> InventoryItem {
        InventoryItem {
            id: ItemId(id.to_string()),
            owner_id: OwnerId("shop-1".to_string()),
            names: vec![name.to_string()],
            price,
            unit: "kg".to_string(),
            category: "Anaj".to_string(),
        }
    }

    #[test]
    fn snapshot_never_contains_unpriced_items() {
        let inventory = vec![
            item("1", "Chawal", 50.0),
            item("2", "Gehun", 0.0),
            item("3", "Bajra", 30.0),
            item("4", "Jowar", -2.0),
        ];

        let snapshot = build_snapshot(&inventory);
        let names = snapshot.iter().map(SnapshotItem::display_name).collect::<Vec<_>>();

        assert_eq!(names, vec!["Chawal", "Bajra"]);
        assert!(snapshot.iter().all(|entry| entry.price > 0.0));
    }

    #[test]
    fn snapshot_is_deterministic() {
        let inventory = vec![item("1", "Chawal", 50.0), item("2", "Dal", 90.0)];
        assert_eq!(build_snapshot(&inventory), build_snapshot(&inventory));
    }

    #[test]
    fn records_accept_encoded_name_lists() {
        let record = json!({
            "names": "[\"Chawal\", \"Rice\", \"चावल\"]",
            "price": "45",
            "unit": "kg"
        });

        let entry = SnapshotItem::from_record(&record).expect("normalized");
        assert_eq!(entry.names, vec!["Chawal", "Rice", "चावल"]);
        assert_eq!(entry.price, 45.0);
        assert_eq!(entry.category, "Other");
    }

    #[test]
    fn records_without_names_are_skipped_and_bad_prices_are_unpriced() {
        let records = vec![
            json!({"names": [], "price": 10}),
            json!({"name": "Maggie", "price": -4, "unit": "pic", "category": "Snacks"}),
            json!("not an object"),
        ];

        let entries = catalogue_from_records(&records);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].display_name(), "Maggie");
        assert!(!entries[0].is_priced());
        assert_eq!(entries[0].category, "Snacks");
    }
}
