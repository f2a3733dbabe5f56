use serde::{Deserialize, Serialize};

use crate::domain::bill::WALK_IN_CUSTOMER;

/// Reply shown to the shopkeeper when every provider candidate has failed.
pub const DEGRADED_SERVICE_MESSAGE: &str =
    "सिस्टम त्रुटि: कृपया बाद में पुनः प्रयास करें। (System error: please try again later.)";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplyKind {
    Bill,
    Error,
    Greeting,
    Query,
}

impl ReplyKind {
    /// Unknown or misspelled kinds collapse to `Error`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "BILL" => Self::Bill,
            "GREETING" => Self::Greeting,
            "QUERY" => Self::Query,
            _ => Self::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bill => "BILL",
            Self::Error => "ERROR",
            Self::Greeting => "GREETING",
            Self::Query => "QUERY",
        }
    }
}

/// A resolved bill line ready to merge into the in-progress bill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BillingLine {
    pub name: String,
    pub qty_display: String,
    pub rate: f64,
    pub total: f64,
    pub unit: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BillingUpdate {
    #[serde(rename = "type")]
    pub kind: ReplyKind,
    pub customer_name: String,
    pub items: Vec<BillingLine>,
    #[serde(rename = "msg")]
    pub message: String,
    pub should_stop: bool,
    /// Whether the capture loop should keep listening for the next utterance.
    pub continuation: bool,
}

impl BillingUpdate {
    pub fn degraded() -> Self {
        Self {
            kind: ReplyKind::Error,
            customer_name: WALK_IN_CUSTOMER.to_string(),
            items: Vec::new(),
            message: DEGRADED_SERVICE_MESSAGE.to_string(),
            should_stop: false,
            continuation: false,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.kind == ReplyKind::Error && self.message == DEGRADED_SERVICE_MESSAGE
    }

    pub fn line_total(&self) -> f64 {
        self.items.iter().map(|line| line.total).sum()
    }

    /// Billing-only view: non-bill replies carry no lines.
    pub fn billing_projection(&self) -> BillingProjection {
        let items = if self.kind == ReplyKind::Bill { self.items.clone() } else { Vec::new() };
        BillingProjection {
            customer_name: self.customer_name.clone(),
            items,
            message: self.message.clone(),
            should_stop: self.should_stop,
            continuation: self.continuation,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BillingProjection {
    pub customer_name: String,
    pub items: Vec<BillingLine>,
    #[serde(rename = "msg")]
    pub message: String,
    pub should_stop: bool,
    pub continuation: bool,
}
