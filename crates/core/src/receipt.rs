//! Fixed-width plain-text receipts for SMS delivery.

use serde::{Deserialize, Serialize};

const NAME_WIDTH: usize = 15;
const QTY_WIDTH: usize = 6;
const RATE_WIDTH: usize = 7;
const AMOUNT_WIDTH: usize = 7;
const RULE: &str = "--------------------------------";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub name: String,
    #[serde(default)]
    pub qty_display: String,
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub total: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub shop_name: String,
    #[serde(default)]
    pub shop_address: Option<String>,
    #[serde(default)]
    pub shop_phone: Option<String>,
    pub customer_name: String,
    pub date: String,
    pub time: String,
    pub items: Vec<ReceiptLine>,
    pub total_amount: f64,
}

impl Receipt {
    pub fn render(&self) -> String {
        let mut lines = vec!["SNAPBILL RECEIPT".to_string(), String::new(), self.shop_name.to_uppercase()];
        if let Some(address) = self.shop_address.as_deref().filter(|value| !value.trim().is_empty()) {
            lines.push(address.to_string());
        }
        if let Some(phone) = self.shop_phone.as_deref().filter(|value| !value.trim().is_empty()) {
            lines.push(format!("Ph: {phone}"));
        }
        lines.push(String::new());
        lines.push(format!("Customer: {}", self.customer_name));
        lines.push(format!("Date: {}", self.date));
        lines.push(format!("Time: {}", self.time));
        lines.push(RULE.to_string());
        lines.push(format_row("Item", "Qty", "Rate", "Amt"));
        lines.push(RULE.to_string());

        for item in &self.items {
            let qty = if item.qty_display.trim().is_empty() { "1" } else { item.qty_display.as_str() };
            lines.push(format_row(
                &item.name,
                qty,
                &whole_rupees(item.rate).to_string(),
                &whole_rupees(item.total).to_string(),
            ));
        }

        lines.push(RULE.to_string());
        lines.push(format!("TOTAL: Rs.{}", whole_rupees(self.total_amount)));
        lines.push(RULE.to_string());
        lines.push(String::new());
        lines.push("Thank you! Visit Again".to_string());
        lines.push("Powered by SnapBill".to_string());
        lines.join("\n")
    }
}

/// Name, quantity and rate are truncated and left-aligned; the amount is
/// right-aligned.
pub fn format_row(name: &str, qty: &str, rate: &str, amount: &str) -> String {
    format!(
        "{:<NAME_WIDTH$}{:<QTY_WIDTH$}{:<RATE_WIDTH$}{:>AMOUNT_WIDTH$}",
        truncate(name, NAME_WIDTH),
        truncate(qty, QTY_WIDTH),
        truncate(rate, RATE_WIDTH),
        amount
    )
}

fn truncate(value: &str, width: usize) -> String {
    value.chars().take(width).collect()
}

fn whole_rupees(amount: f64) -> i64 {
    if amount.is_finite() {
        amount.trunc() as i64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::{format_row, Receipt, ReceiptLine, RULE};

    fn receipt() -> Receipt {
        Receipt {
            shop_name: "Sharma Kirana".to_string(),
            shop_address: Some("Main Road, Sitabuldi".to_string()),
            shop_phone: None,
            customer_name: "Raju".to_string(),
            date: "14/03/2026".to_string(),
            time: "18:05".to_string(),
            items: vec![
                ReceiptLine {
                    name: "Basmati Chawal Premium".to_string(),
                    qty_display: "2kg".to_string(),
                    rate: 120.0,
                    total: 240.0,
                },
                ReceiptLine {
                    name: "Maggie".to_string(),
                    qty_display: String::new(),
                    rate: 5.5,
                    total: 5.5,
                },
            ],
            total_amount: 245.5,
        }
    }

    #[test]
    fn rows_are_thirty_five_columns_wide() {
        let row = format_row("Chawal", "1kg", "50", "50");
        assert_eq!(row.chars().count(), 35);
        assert_eq!(row, "Chawal         1kg   50          50");
    }

    #[test]
    fn long_names_are_truncated() {
        let row = format_row("Basmati Chawal Premium", "2kg", "120", "240");
        assert!(row.starts_with("Basmati Chawal "));
        assert!(row.ends_with("    240"));
    }

    #[test]
    fn rendered_receipt_contains_header_rows_and_total() {
        let text = receipt().render();
        let lines = text.lines().collect::<Vec<_>>();

        assert_eq!(lines[2], "SHARMA KIRANA");
        assert!(lines.contains(&"Customer: Raju"));
        assert_eq!(lines.iter().filter(|line| **line == RULE).count(), 4);
        assert!(lines.contains(&"TOTAL: Rs.245"));
        assert!(lines.contains(&"Maggie         1     5            5"));
    }
}
