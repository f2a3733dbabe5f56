use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use snapbill_core::analytics::AnalyticsSummary;
use snapbill_core::domain::bill::{Bill, BillItem, NewBill};
use snapbill_core::errors::ApplicationError;
use tracing::info;

use super::{
    application_failure, bad_request, load_summary, owner_from_headers, repository_failure,
    ApiFailure, AppState,
};

pub const DEFAULT_BILL_PAGE: u32 = 50;
pub const MAX_BILL_PAGE: u32 = 200;
const MAX_WINDOW_DAYS: u32 = 365;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BillPageQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct BillCreated {
    pub success: bool,
    pub bill_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct BillView {
    pub id: String,
    pub total_amount: f64,
    pub total_items: u32,
    pub items: Vec<BillItem>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub payment_method: String,
    pub bill_date: String,
}

impl From<Bill> for BillView {
    fn from(bill: Bill) -> Self {
        Self {
            id: bill.id.0,
            total_amount: bill.total_amount,
            total_items: bill.total_items,
            items: bill.items,
            customer_name: bill.customer_name,
            customer_phone: bill.customer_phone,
            payment_method: bill.payment_method,
            bill_date: bill.billed_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BillPage {
    pub success: bool,
    pub bills: Vec<BillView>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/analytics/dashboard", get(dashboard))
        .route("/analytics/bills", get(list_bills).post(create_bill))
}

async fn dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<AnalyticsSummary>, ApiFailure> {
    let owner = owner_from_headers(&headers)?;
    let days = query.days.unwrap_or(state.assistant.analytics_window_days);
    if days == 0 || days > MAX_WINDOW_DAYS {
        return Err(bad_request(format!("days must be in range 1..={MAX_WINDOW_DAYS}")));
    }

    Ok(Json(load_summary(&state, &owner, days).await))
}

async fn create_bill(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<NewBill>,
) -> Result<(StatusCode, Json<BillCreated>), ApiFailure> {
    let owner = owner_from_headers(&headers)?;
    body.validate().map_err(|error| application_failure(ApplicationError::from(error)))?;

    let bill = Bill::from_new(owner, body, Utc::now());
    state.bills.commit(&bill).await.map_err(|error| repository_failure("bill.commit", error))?;

    info!(
        event_name = "analytics.bill.committed",
        owner_id = %bill.owner_id,
        bill_id = %bill.id.0,
        total_items = bill.total_items,
        total_amount = bill.total_amount,
        "bill saved"
    );

    Ok((
        StatusCode::CREATED,
        Json(BillCreated {
            success: true,
            bill_id: bill.id.0,
            message: "Bill saved successfully".to_string(),
        }),
    ))
}

async fn list_bills(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<BillPageQuery>,
) -> Result<Json<BillPage>, ApiFailure> {
    let owner = owner_from_headers(&headers)?;
    let limit = query.limit.unwrap_or(DEFAULT_BILL_PAGE).clamp(1, MAX_BILL_PAGE);
    let offset = query.offset.unwrap_or(0);

    let bills = state
        .bills
        .list_for_owner(&owner, limit, offset)
        .await
        .map_err(|error| repository_failure("bill.list", error))?;

    Ok(Json(BillPage { success: true, bills: bills.into_iter().map(BillView::from).collect() }))
}
