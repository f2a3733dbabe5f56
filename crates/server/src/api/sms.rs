use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use snapbill_core::domain::bill::WALK_IN_CUSTOMER;
use snapbill_core::receipt::{Receipt, ReceiptLine};
use tracing::{error, info};

use super::{bad_request, correlation_id, owner_from_headers, ApiError, ApiFailure, AppState};
use crate::sms::normalize_mobile;

#[derive(Debug, Deserialize)]
pub struct SendBillRequest {
    pub mobile: String,
    #[serde(default)]
    pub customer_name: String,
    pub shop_name: String,
    #[serde(default)]
    pub shop_address: Option<String>,
    #[serde(default)]
    pub shop_phone: Option<String>,
    pub bill_items: Vec<ReceiptLine>,
    pub total_amount: f64,
    pub date: String,
    pub time: String,
}

#[derive(Debug, Serialize)]
pub struct SendBillResponse {
    pub success: bool,
    pub message: String,
    pub message_id: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/sms/send-bill", post(send_bill))
}

async fn send_bill(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SendBillRequest>,
) -> Result<Json<SendBillResponse>, ApiFailure> {
    let owner = owner_from_headers(&headers)?;
    let Some(mobile) = normalize_mobile(&body.mobile) else {
        return Err(bad_request("mobile must be a 10 digit Indian mobile number"));
    };
    if body.bill_items.is_empty() {
        return Err(bad_request("bill_items must not be empty"));
    }

    let customer_name = match body.customer_name.trim() {
        "" => WALK_IN_CUSTOMER.to_string(),
        name => name.to_string(),
    };
    let receipt = Receipt {
        shop_name: body.shop_name,
        shop_address: body.shop_address,
        shop_phone: body.shop_phone,
        customer_name,
        date: body.date,
        time: body.time,
        items: body.bill_items,
        total_amount: body.total_amount,
    };

    match state.sms.send(&mobile, &receipt.render()).await {
        Ok(delivery) => {
            info!(
                event_name = "sms.bill.sent",
                owner_id = %owner,
                gateway = state.sms.name(),
                message_id = %delivery.message_id,
                "bill sent via sms"
            );
            Ok(Json(SendBillResponse {
                success: true,
                message: "Bill sent via SMS".to_string(),
                message_id: delivery.message_id,
            }))
        }
        Err(failure) => {
            let correlation_id = correlation_id();
            error!(
                event_name = "sms.bill.failed",
                owner_id = %owner,
                gateway = state.sms.name(),
                correlation_id = %correlation_id,
                error = %failure,
                "bill sms delivery failed"
            );
            Err((
                StatusCode::BAD_GATEWAY,
                Json(ApiError { error: failure.to_string(), correlation_id: Some(correlation_id) }),
            ))
        }
    }
}
