//! JSON API routes. Every route except `/health` is scoped to the shop
//! named by the `x-owner-id` header.
//!
//! - `POST   /voice/process`            full provider resolution
//! - `POST   /voice/process-query`      keyword price lookup
//! - `POST   /voice/process-billing`    billing-only projection
//! - `GET    /analytics/dashboard`      rolling sales summary
//! - `GET    /analytics/bills`          bill history
//! - `POST   /analytics/bills`          commit a bill
//! - `GET    /items`, `POST /items`     inventory list and upsert
//! - `PUT    /items/{master_id}`        update one item
//! - `DELETE /items/{master_id}`        remove one item
//! - `POST   /inventory/voice-parse`    dictated inventory draft
//! - `POST   /sms/send-bill`            text a receipt

use std::sync::Arc;

use axum::{http::HeaderMap, http::StatusCode, Json, Router};
use chrono::Utc;
use serde::Serialize;
use snapbill_agent::AgentRuntime;
use snapbill_core::analytics::{aggregate, AnalyticsSummary, AnalyticsWindow, SalesHistory};
use snapbill_core::config::AssistantConfig;
use snapbill_core::context::ContextBundle;
use snapbill_core::domain::inventory::InventoryItem;
use snapbill_core::domain::owner::OwnerId;
use snapbill_core::errors::{ApplicationError, InterfaceError};
use snapbill_db::{BillRepository, InventoryRepository, RepositoryError};
use tracing::{error, warn};
use uuid::Uuid;

use crate::sms::SmsGateway;

pub mod analytics;
pub mod inventory;
pub mod items;
pub mod sms;
pub mod voice;

pub const OWNER_HEADER: &str = "x-owner-id";

#[derive(Clone)]
pub struct AppState {
    pub inventory: Arc<dyn InventoryRepository>,
    pub bills: Arc<dyn BillRepository>,
    pub runtime: Arc<AgentRuntime>,
    pub sms: Arc<dyn SmsGateway>,
    pub assistant: AssistantConfig,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

pub type ApiFailure = (StatusCode, Json<ApiError>);

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(voice::router())
        .merge(analytics::router())
        .merge(items::router())
        .merge(inventory::router())
        .merge(sms::router())
        .with_state(state)
}

pub fn owner_from_headers(headers: &HeaderMap) -> Result<OwnerId, ApiFailure> {
    headers
        .get(OWNER_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(OwnerId::parse)
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiError {
                    error: format!("missing or empty `{OWNER_HEADER}` header"),
                    correlation_id: None,
                }),
            )
        })
}

pub fn bad_request(message: impl Into<String>) -> ApiFailure {
    (StatusCode::BAD_REQUEST, Json(ApiError { error: message.into(), correlation_id: None }))
}

pub fn correlation_id() -> String {
    format!("req-{}", Uuid::new_v4().simple())
}

/// Client errors echo their message; server-side failures only expose the
/// user-safe text and a correlation id for the logs.
pub fn interface_failure(error: InterfaceError) -> ApiFailure {
    let (status, message) = match &error {
        InterfaceError::BadRequest { message, .. } => (StatusCode::BAD_REQUEST, message.clone()),
        InterfaceError::NotFound { message, .. } => (StatusCode::NOT_FOUND, message.clone()),
        InterfaceError::ServiceUnavailable { .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, error.user_message().to_string())
        }
        InterfaceError::Internal { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, error.user_message().to_string())
        }
    };
    (status, Json(ApiError { error: message, correlation_id: Some(error.correlation_id().to_string()) }))
}

pub fn application_failure(error: ApplicationError) -> ApiFailure {
    interface_failure(error.into_interface(correlation_id()))
}

pub fn repository_failure(operation: &'static str, source: RepositoryError) -> ApiFailure {
    let correlation_id = correlation_id();
    error!(
        event_name = "api.persistence.failed",
        correlation_id = %correlation_id,
        operation,
        error = %source,
        "repository operation failed"
    );
    interface_failure(ApplicationError::Persistence(source.to_string()).into_interface(correlation_id))
}

async fn read_history(
    state: &AppState,
    owner: &OwnerId,
    window: &AnalyticsWindow,
) -> Result<SalesHistory, RepositoryError> {
    Ok(SalesHistory {
        bills: state.bills.totals_since(owner, window.since).await?,
        sale_lines: state.bills.sale_lines_since(owner, window.since).await?,
        inventory_count: state.inventory.count_for_owner(owner).await?,
    })
}

/// Best-effort: storage failures yield an empty summary.
pub async fn load_summary(state: &AppState, owner: &OwnerId, days: u32) -> AnalyticsSummary {
    let window = AnalyticsWindow::ending_at(Utc::now(), days);
    match read_history(state, owner, &window).await {
        Ok(history) => aggregate(&history, &window),
        Err(error) => {
            warn!(
                event_name = "analytics.aggregation.degraded",
                owner_id = %owner,
                window_days = days,
                error = %error,
                "sales history unavailable; using empty summary"
            );
            AnalyticsSummary::empty(days)
        }
    }
}

pub async fn load_inventory(state: &AppState, owner: &OwnerId) -> Vec<InventoryItem> {
    match state.inventory.list_for_owner(owner).await {
        Ok(items) => items,
        Err(error) => {
            warn!(
                event_name = "voice.context.inventory_unavailable",
                owner_id = %owner,
                error = %error,
                "inventory unavailable; continuing with an empty catalogue"
            );
            Vec::new()
        }
    }
}

/// Rebuilt on every call from the configured window and recent-bill limit.
pub async fn load_context(state: &AppState, owner: &OwnerId) -> ContextBundle {
    let inventory = load_inventory(state, owner).await;
    let analytics = load_summary(state, owner, state.assistant.analytics_window_days).await;
    let limit = u32::try_from(state.assistant.recent_bills_limit).unwrap_or(u32::MAX);
    let bills = match state.bills.list_for_owner(owner, limit, 0).await {
        Ok(bills) => bills,
        Err(error) => {
            warn!(
                event_name = "voice.context.bills_unavailable",
                owner_id = %owner,
                error = %error,
                "recent bills unavailable; continuing without them"
            );
            Vec::new()
        }
    };

    ContextBundle::compose(&inventory, analytics, &bills, state.assistant.recent_bills_limit)
}
