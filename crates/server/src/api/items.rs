use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use snapbill_core::domain::inventory::{normalize_category, normalize_names, InventoryItem, ItemId};
use snapbill_core::domain::owner::OwnerId;
use snapbill_core::errors::ApplicationError;
use tracing::info;

use super::{application_failure, owner_from_headers, repository_failure, ApiFailure, AppState};

#[derive(Debug, Deserialize)]
pub struct ItemPayload {
    /// Master-list id chosen by the app.
    pub id: String,
    pub names: Vec<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ItemUpdate {
    pub names: Vec<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ItemView {
    pub id: String,
    pub master_id: String,
    pub owner_id: String,
    pub names: Vec<String>,
    pub price: f64,
    pub unit: String,
    pub category: String,
}

impl From<InventoryItem> for ItemView {
    fn from(item: InventoryItem) -> Self {
        Self {
            id: item.id.0.clone(),
            master_id: item.id.0,
            owner_id: item.owner_id.0,
            names: item.names,
            price: item.price,
            unit: item.unit,
            category: item.category,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub success: bool,
    pub id: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_items).post(upsert_item))
        .route("/items/{master_id}", put(update_item).delete(delete_item))
}

fn build_item(
    owner: OwnerId,
    id: String,
    names: Vec<String>,
    price: f64,
    unit: String,
    category: Option<String>,
) -> Result<InventoryItem, ApiFailure> {
    let item = InventoryItem {
        id: ItemId(id.trim().to_string()),
        owner_id: owner,
        names: normalize_names(names),
        price,
        unit: unit.trim().to_string(),
        category: normalize_category(category.as_deref()),
    };
    item.validate().map_err(|error| application_failure(ApplicationError::from(error)))?;
    Ok(item)
}

async fn list_items(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ItemView>>, ApiFailure> {
    let owner = owner_from_headers(&headers)?;
    let items = state
        .inventory
        .list_for_owner(&owner)
        .await
        .map_err(|error| repository_failure("inventory.list", error))?;
    Ok(Json(items.into_iter().map(ItemView::from).collect()))
}

async fn upsert_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ItemPayload>,
) -> Result<Json<ItemView>, ApiFailure> {
    let owner = owner_from_headers(&headers)?;
    let item = build_item(owner, body.id, body.names, body.price, body.unit, body.category)?;

    state
        .inventory
        .upsert(item.clone())
        .await
        .map_err(|error| repository_failure("inventory.upsert", error))?;
    info!(
        event_name = "inventory.item.saved",
        owner_id = %item.owner_id,
        master_id = %item.id.0,
        priced = item.is_priced(),
        "inventory item saved"
    );
    Ok(Json(ItemView::from(item)))
}

async fn update_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(master_id): Path<String>,
    Json(body): Json<ItemUpdate>,
) -> Result<Json<ItemView>, ApiFailure> {
    let owner = owner_from_headers(&headers)?;
    let existing = state
        .inventory
        .find(&owner, &ItemId(master_id.clone()))
        .await
        .map_err(|error| repository_failure("inventory.find", error))?;
    if existing.is_none() {
        return Err(application_failure(ApplicationError::NotFound(format!("item `{master_id}`"))));
    }

    let item = build_item(owner, master_id, body.names, body.price, body.unit, body.category)?;
    state
        .inventory
        .upsert(item.clone())
        .await
        .map_err(|error| repository_failure("inventory.update", error))?;
    Ok(Json(ItemView::from(item)))
}

async fn delete_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(master_id): Path<String>,
) -> Result<Json<Deleted>, ApiFailure> {
    let owner = owner_from_headers(&headers)?;
    let removed = state
        .inventory
        .delete(&owner, &ItemId(master_id.clone()))
        .await
        .map_err(|error| repository_failure("inventory.delete", error))?;
    if !removed {
        return Err(application_failure(ApplicationError::NotFound(format!("item `{master_id}`"))));
    }
    Ok(Json(Deleted { success: true, id: master_id }))
}
