use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::inventory::DEFAULT_CATEGORY;
use crate::domain::owner::OwnerId;
use crate::errors::DomainError;

pub const WALK_IN_CUSTOMER: &str = "Walk-in";
pub const DEFAULT_PAYMENT_METHOD: &str = "cash";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillId(pub String);

impl BillId {
    pub fn generate() -> Self {
        Self(format!("BILL-{}", Uuid::new_v4().simple()))
    }
}

/// One line as captured by the billing screen.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BillItem {
    pub name: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    /// Price per unit.
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qty_display: Option<String>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewBill {
    pub total_amount: f64,
    pub items: Vec<BillItem>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
}

fn default_payment_method() -> String {
    DEFAULT_PAYMENT_METHOD.to_string()
}

impl NewBill {
    pub fn validate(&self) -> Result<(), DomainError> {
        if !is_amount(self.total_amount) {
            return Err(DomainError::InvalidBill(format!(
                "total_amount must be a non-negative number, got {}",
                self.total_amount
            )));
        }
        if self.items.is_empty() {
            return Err(DomainError::InvalidBill("a bill needs at least one item".to_string()));
        }
        for (index, item) in self.items.iter().enumerate() {
            if item.name.trim().is_empty() {
                return Err(DomainError::InvalidBill(format!("item {index} has no name")));
            }
            if !is_amount(item.quantity) || !is_amount(item.price) || !is_amount(item.total) {
                return Err(DomainError::InvalidBill(format!(
                    "item `{}` has a negative or non-numeric amount",
                    item.name
                )));
            }
        }
        Ok(())
    }
}

fn is_amount(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: BillId,
    pub owner_id: OwnerId,
    pub total_amount: f64,
    pub total_items: u32,
    pub items: Vec<BillItem>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub payment_method: String,
    pub billed_at: DateTime<Utc>,
}

impl Bill {
    pub fn from_new(owner_id: OwnerId, new_bill: NewBill, billed_at: DateTime<Utc>) -> Self {
        Self {
            id: BillId::generate(),
            owner_id,
            total_amount: new_bill.total_amount,
            total_items: u32::try_from(new_bill.items.len()).unwrap_or(u32::MAX),
            items: new_bill.items,
            customer_name: new_bill.customer_name.filter(|name| !name.trim().is_empty()),
            customer_phone: new_bill.customer_phone.filter(|phone| !phone.trim().is_empty()),
            payment_method: new_bill.payment_method,
            billed_at,
        }
    }

    pub fn customer_label(&self) -> &str {
        self.customer_name.as_deref().unwrap_or(WALK_IN_CUSTOMER)
    }

    /// Analytics rows derived from this bill, one per item.
    pub fn sale_lines(&self) -> Vec<SaleLine> {
        self.items.iter().map(|item| SaleLine::from_bill_item(self, item)).collect()
    }
}

/// Immutable analytics record written alongside its bill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaleLine {
    pub owner_id: OwnerId,
    pub bill_id: BillId,
    pub item_name: String,
    pub category: String,
    pub quantity: f64,
    pub unit: String,
    pub price_per_unit: f64,
    pub line_total: f64,
    pub sold_at: DateTime<Utc>,
    pub hour_of_day: u8,
}

impl SaleLine {
    pub fn from_bill_item(bill: &Bill, item: &BillItem) -> Self {
        let category = if item.category.trim().is_empty() {
            DEFAULT_CATEGORY.to_string()
        } else {
            item.category.clone()
        };

        Self {
            owner_id: bill.owner_id.clone(),
            bill_id: bill.id.clone(),
            item_name: item.name.clone(),
            category,
            quantity: item.quantity,
            unit: item.unit.clone(),
            price_per_unit: item.price,
            line_total: item.total,
            sold_at: bill.billed_at,
            hour_of_day: bill.billed_at.hour() as u8,
        }
    }
}
