//! Bounded shop-state bundle that grounds a provider call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::AnalyticsSummary;
use crate::domain::bill::Bill;
use crate::domain::inventory::InventoryItem;
use crate::snapshot::{build_snapshot, SnapshotItem};

pub const DEFAULT_RECENT_BILLS_LIMIT: usize = 10;

const RECENT_BILL_DATE_FORMAT: &str = "%d %b %Y, %H:%M";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecentBill {
    pub total_amount: f64,
    pub total_items: u32,
    pub item_list: String,
    pub customer_name: String,
    pub date: String,
}

impl RecentBill {
    pub fn from_bill(bill: &Bill) -> Self {
        let item_list =
            bill.items.iter().map(|item| item.name.as_str()).collect::<Vec<_>>().join(", ");
        Self {
            total_amount: bill.total_amount,
            total_items: bill.total_items,
            item_list,
            customer_name: bill.customer_label().to_string(),
            date: format_bill_date(bill.billed_at),
        }
    }
}

pub fn format_bill_date(billed_at: DateTime<Utc>) -> String {
    billed_at.format(RECENT_BILL_DATE_FORMAT).to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextBundle {
    pub inventory: Vec<SnapshotItem>,
    pub analytics: AnalyticsSummary,
    pub recent_bills: Vec<RecentBill>,
}

impl ContextBundle {
    /// Priced inventory plus the `recent_limit` newest bills. Bills may
    /// arrive in any order.
    pub fn compose(
        inventory: &[InventoryItem],
        analytics: AnalyticsSummary,
        bills: &[Bill],
        recent_limit: usize,
    ) -> Self {
        let mut newest_first = bills.iter().collect::<Vec<_>>();
        newest_first.sort_by(|left, right| right.billed_at.cmp(&left.billed_at));
        let recent_bills =
            newest_first.into_iter().take(recent_limit).map(RecentBill::from_bill).collect();

        Self { inventory: build_snapshot(inventory), analytics, recent_bills }
    }
}
