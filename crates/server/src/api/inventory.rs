use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::Value;
use snapbill_agent::VoiceInventoryDraft;
use snapbill_core::snapshot::{catalogue, catalogue_from_records, SnapshotItem};

use super::{bad_request, load_inventory, owner_from_headers, ApiFailure, AppState};

#[derive(Debug, Deserialize)]
pub struct VoiceParseRequest {
    pub raw_text: String,
    /// Item records the app holds but has not saved yet (earlier dictations
    /// in the same session). Loosely typed; normalized before use.
    #[serde(default)]
    pub pending_items: Vec<Value>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/inventory/voice-parse", post(voice_parse))
}

async fn voice_parse(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<VoiceParseRequest>,
) -> Result<Json<VoiceInventoryDraft>, ApiFailure> {
    let owner = owner_from_headers(&headers)?;
    let raw_text = body.raw_text.trim();
    if raw_text.is_empty() {
        return Err(bad_request("raw_text must not be empty"));
    }

    let existing_items = merge_pending(
        catalogue(&load_inventory(&state, &owner).await),
        catalogue_from_records(&body.pending_items),
    );
    let mut existing_categories: Vec<String> = Vec::new();
    for item in &existing_items {
        if !existing_categories.contains(&item.category) {
            existing_categories.push(item.category.clone());
        }
    }

    Ok(Json(state.runtime.parse_inventory(raw_text, &existing_items, &existing_categories).await))
}

/// Stored items first; a pending record is skipped when an item with the same
/// display name (case-insensitive) is already known.
fn merge_pending(mut items: Vec<SnapshotItem>, pending: Vec<SnapshotItem>) -> Vec<SnapshotItem> {
    for record in pending {
        let duplicate = items
            .iter()
            .any(|item| item.display_name().eq_ignore_ascii_case(record.display_name()));
        if !duplicate {
            items.push(record);
        }
    }
    items
}
