use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use serde::Deserialize;
use snapbill_agent::QueryAnswer;
use snapbill_core::domain::billing::{BillingProjection, BillingUpdate};
use snapbill_core::snapshot::catalogue;
use tracing::info;

use super::{bad_request, load_context, load_inventory, owner_from_headers, ApiFailure, AppState};

#[derive(Debug, Deserialize)]
pub struct VoiceRequest {
    pub text: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/voice/process", post(process_voice))
        .route("/voice/process-query", post(process_query))
        .route("/voice/process-billing", post(process_billing))
}

fn utterance(body: &VoiceRequest) -> Result<&str, ApiFailure> {
    let text = body.text.trim();
    if text.is_empty() {
        return Err(bad_request("text must not be empty"));
    }
    Ok(text)
}

async fn process_voice(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<VoiceRequest>,
) -> Result<Json<BillingUpdate>, ApiFailure> {
    let owner = owner_from_headers(&headers)?;
    let text = utterance(&body)?;

    let context = load_context(&state, &owner).await;
    info!(
        event_name = "voice.process.started",
        owner_id = %owner,
        priced_items = context.inventory.len(),
        recent_bills = context.recent_bills.len(),
        "resolving voice utterance"
    );
    Ok(Json(state.runtime.process_voice(text, &context).await))
}

async fn process_query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<VoiceRequest>,
) -> Result<Json<QueryAnswer>, ApiFailure> {
    let owner = owner_from_headers(&headers)?;
    let text = utterance(&body)?;

    let inventory = load_inventory(&state, &owner).await;
    Ok(Json(state.runtime.process_query(text, &catalogue(&inventory))))
}

async fn process_billing(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<VoiceRequest>,
) -> Result<Json<BillingProjection>, ApiFailure> {
    let owner = owner_from_headers(&headers)?;
    let text = utterance(&body)?;

    let context = load_context(&state, &owner).await;
    Ok(Json(state.runtime.process_billing(text, &context).await))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use snapbill_core::domain::inventory::{InventoryItem, ItemId};
    use snapbill_core::domain::owner::OwnerId;

    use crate::api::test_support::{app, send, state_with_reply, OWNER};
    use crate::api::AppState;

    async fn seed(state: &AppState) {
        for (id, name, price) in [("101", "Chawal", 50.0), ("102", "Gehun", 0.0)] {
            state
                .inventory
                .upsert(InventoryItem {
                    id: ItemId(id.to_string()),
                    owner_id: OwnerId(OWNER.to_string()),
                    names: vec![name.to_string()],
                    price,
                    unit: "kg".to_string(),
                    category: "Anaj".to_string(),
                })
                .await
                .expect("seed");
        }
    }

    #[tokio::test]
    async fn process_returns_the_validated_provider_reply() {
        let state = state_with_reply(Some(
            "```json\n{\"type\":\"BILL\",\"items\":[{\"name\":\"Chawal\",\"qty_display\":\"2kg\",\"rate\":50,\"total\":100,\"unit\":\"kg\"}],\"msg\":\"Saaman Bill mein jod diya gaya hai\",\"should_stop\":false}\n```",
        ));
        seed(&state).await;
        let app = app(state);

        let (status, body) =
            send(&app, "POST", "/voice/process", Some(json!({"text": "do kilo chawal"}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "BILL");
        assert_eq!(body["customer_name"], "Walk-in");
        assert_eq!(body["items"][0]["total"], 100.0);
        assert_eq!(body["continuation"], true);
    }

    #[tokio::test]
    async fn process_degrades_when_every_provider_fails() {
        let app = app(state_with_reply(None));

        let (status, body) = send(&app, "POST", "/voice/process", Some(json!({"text": "chawal"}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "ERROR");
        assert_eq!(body["items"], json!([]));
        assert_eq!(body["continuation"], false);
    }

    #[tokio::test]
    async fn process_query_answers_from_inventory() {
        let state = state_with_reply(None);
        seed(&state).await;
        let app = app(state);

        let (status, body) = send(
            &app,
            "POST",
            "/voice/process-query",
            Some(json!({"text": "chawal ka price kya hai"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mode"], "query");
        assert_eq!(body["continuation"], false);
        assert!(body["answer"].as_str().is_some_and(|answer| answer.contains("50")));

        let (_, body) =
            send(&app, "POST", "/voice/process-query", Some(json!({"text": "gehun ka price"}))).await;
        assert!(body["answer"].as_str().is_some_and(|answer| answer.contains("set nahi")));
    }

    #[tokio::test]
    async fn process_billing_projects_only_bill_lines() {
        let app = app(state_with_reply(Some(
            r#"{"type":"GREETING","customer_name":"Walk-in","items":[],"msg":"Namaste!","should_stop":false}"#,
        )));

        let (status, body) =
            send(&app, "POST", "/voice/process-billing", Some(json!({"text": "namaste"}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["msg"], "Namaste!");
        assert_eq!(body["items"], json!([]));
        assert!(body.get("type").is_none());
    }

    #[tokio::test]
    async fn blank_utterances_are_rejected() {
        let app = app(state_with_reply(None));
        let (status, body) = send(&app, "POST", "/voice/process", Some(json!({"text": "   "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "text must not be empty");
    }
}
