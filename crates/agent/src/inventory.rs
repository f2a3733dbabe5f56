//! Voice dictation of inventory ("category anaj gehun 25 rs kilo, ...") into
//! a reviewable draft. Nothing here is persisted; the app confirms the draft
//! and saves items through the regular inventory endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use snapbill_core::domain::inventory::DEFAULT_CATEGORY;
use snapbill_core::snapshot::SnapshotItem;

use crate::validator::{non_negative_number, parse_object, Verdict};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DraftItem {
    pub name: String,
    pub price: f64,
    pub unit: String,
    pub is_existing: bool,
    pub aliases: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DraftCategory {
    pub name: String,
    pub items: Vec<DraftItem>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoiceInventoryDraft {
    pub categories: Vec<DraftCategory>,
    pub raw_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VoiceInventoryDraft {
    /// Returned when no provider produced a usable parse.
    pub fn unavailable(raw_text: &str, reason: &str) -> Self {
        Self {
            categories: vec![DraftCategory { name: DEFAULT_CATEGORY.to_string(), items: Vec::new() }],
            raw_text: raw_text.to_string(),
            error: Some(reason.to_string()),
        }
    }

    pub fn item_count(&self) -> usize {
        self.categories.iter().map(|category| category.items.len()).sum()
    }
}

/// Structural parse of a provider reply. Names of categories and the
/// `is_existing` flags are resolved later by [`finalize_draft`].
pub fn validate_inventory_reply(raw: &str) -> Verdict<Vec<DraftCategory>> {
    let object = match parse_object(raw) {
        Ok(object) => object,
        Err(reason) => return Verdict::Invalid(reason),
    };
    let Some(Value::Array(entries)) = object.get("categories") else {
        return Verdict::Invalid("missing array field `categories`".to_string());
    };

    let categories = entries
        .iter()
        .filter_map(Value::as_object)
        .map(|entry| {
            let name = entry
                .get("name")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .unwrap_or(DEFAULT_CATEGORY)
                .to_string();
            let items = match entry.get("items") {
                Some(Value::Array(items)) => items.iter().filter_map(draft_item).collect(),
                _ => Vec::new(),
            };
            DraftCategory { name, items }
        })
        .collect();

    Verdict::Valid(categories)
}

fn draft_item(entry: &Value) -> Option<DraftItem> {
    let object = entry.as_object()?;
    let name = object.get("name").and_then(Value::as_str)?.trim();
    if name.is_empty() {
        return None;
    }
    let price = non_negative_number(object.get("price")).unwrap_or(0.0);
    let unit = normalize_unit(object.get("unit").and_then(Value::as_str).unwrap_or_default());
    let aliases = match object.get("aliases") {
        Some(Value::Array(aliases)) => aliases
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|alias| !alias.is_empty() && !alias.eq_ignore_ascii_case(name))
            .map(ToString::to_string)
            .collect(),
        _ => Vec::new(),
    };

    Some(DraftItem { name: name.to_string(), price, unit, is_existing: false, aliases })
}

/// Normalizes category names against the owner's categories, merges
/// categories that normalize to the same name and flags items already in
/// the inventory.
pub fn finalize_draft(
    categories: Vec<DraftCategory>,
    raw_text: &str,
    existing_items: &[SnapshotItem],
    existing_categories: &[String],
) -> VoiceInventoryDraft {
    let mut merged: Vec<DraftCategory> = Vec::new();
    for category in categories {
        let name = normalize_category_name(&category.name, existing_categories);
        let items = category.items.into_iter().map(|mut item| {
            item.is_existing = is_existing_item(&item, existing_items);
            item
        });
        match merged.iter_mut().find(|existing| existing.name == name) {
            Some(existing) => existing.items.extend(items),
            None => merged.push(DraftCategory { name, items: items.collect() }),
        }
    }

    VoiceInventoryDraft { categories: merged, raw_text: raw_text.to_string(), error: None }
}

/// A case-insensitive match keeps the owner's spelling; anything new is
/// capitalized ("anaj" -> "Anaj").
pub fn normalize_category_name(name: &str, existing_categories: &[String]) -> String {
    let name = name.trim();
    if name.is_empty() {
        return DEFAULT_CATEGORY.to_string();
    }
    if let Some(existing) =
        existing_categories.iter().find(|existing| existing.trim().to_lowercase() == name.to_lowercase())
    {
        return existing.trim().to_string();
    }

    let mut characters = name.chars();
    match characters.next() {
        Some(first) => first.to_uppercase().chain(characters.flat_map(char::to_lowercase)).collect(),
        None => DEFAULT_CATEGORY.to_string(),
    }
}

pub fn normalize_unit(unit: &str) -> String {
    let unit = unit.trim().to_lowercase();
    match unit.as_str() {
        "kilo" | "kilos" | "kilogram" | "kilograms" | "kgs" => "kg".to_string(),
        "liter" | "liters" | "litres" | "ltr" | "l" => "litre".to_string(),
        "gram" | "grams" | "gm" | "gms" => "g".to_string(),
        "piece" | "pieces" | "pcs" | "pc" | "packet" | "packets" => "pic".to_string(),
        "plates" => "plate".to_string(),
        _ => unit,
    }
}

fn is_existing_item(item: &DraftItem, existing_items: &[SnapshotItem]) -> bool {
    let candidates = std::iter::once(&item.name).chain(item.aliases.iter()).collect::<Vec<_>>();
    existing_items.iter().any(|existing| {
        existing.names.iter().any(|known| {
            candidates.iter().any(|candidate| known.trim().to_lowercase() == candidate.to_lowercase())
        })
    })
}
