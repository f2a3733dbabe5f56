//! Rolling-window sales aggregation.
//!
//! The summary feeds both the dashboard and the assistant's context. It is
//! best-effort reporting data: callers degrade to [`AnalyticsSummary::empty`]
//! when history cannot be read and never bill from it.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::bill::SaleLine;

pub const DEFAULT_WINDOW_DAYS: u32 = 30;
pub const TOP_ITEMS_LIMIT: usize = 5;
pub const WEEKDAY_NAMES: [&str; 7] =
    ["Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnalyticsWindow {
    pub days: u32,
    pub since: DateTime<Utc>,
}

impl AnalyticsWindow {
    pub fn ending_at(now: DateTime<Utc>, days: u32) -> Self {
        Self { days, since: now - Duration::days(i64::from(days)) }
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.since
    }
}

/// Bill header fields the aggregator needs.
#[derive(Clone, Debug, PartialEq)]
pub struct BillTotal {
    pub total_amount: f64,
    pub billed_at: DateTime<Utc>,
}

/// Raw history for one owner. Sale lines are expected in chronological
/// insertion order; that order breaks ties between equally sold items.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SalesHistory {
    pub bills: Vec<BillTotal>,
    pub sale_lines: Vec<SaleLine>,
    pub inventory_count: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SummaryTotals {
    pub total_revenue: f64,
    pub total_bills: u64,
    pub average_bill_value: f64,
    pub total_inventory_items: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopItem {
    pub name: String,
    pub unit: String,
    pub quantity: f64,
    pub times_sold: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: String,
    pub total_sales: f64,
    pub quantity: f64,
    pub percentage: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HourBucket {
    pub hour: u8,
    pub sales_count: u64,
    pub total_sales: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeakDay {
    pub day_index: u8,
    pub day: String,
    pub bill_count: u64,
    pub total_sales: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub window_days: u32,
    pub summary: SummaryTotals,
    pub top_selling_items: Vec<TopItem>,
    pub category_breakdown: Vec<CategoryShare>,
    pub peak_hours: Vec<HourBucket>,
    pub peak_day: Option<PeakDay>,
}

impl AnalyticsSummary {
    pub fn empty(window_days: u32) -> Self {
        Self {
            window_days,
            summary: SummaryTotals {
                total_revenue: 0.0,
                total_bills: 0,
                average_bill_value: 0.0,
                total_inventory_items: 0,
            },
            top_selling_items: Vec::new(),
            category_breakdown: Vec::new(),
            peak_hours: Vec::new(),
            peak_day: None,
        }
    }
}

pub fn aggregate(history: &SalesHistory, window: &AnalyticsWindow) -> AnalyticsSummary {
    let bills =
        history.bills.iter().filter(|bill| window.contains(bill.billed_at)).collect::<Vec<_>>();
    let lines =
        history.sale_lines.iter().filter(|line| window.contains(line.sold_at)).collect::<Vec<_>>();

    let revenue = bills.iter().map(|bill| bill.total_amount).sum::<f64>();
    let total_bills = bills.len() as u64;
    let average_bill_value = if total_bills == 0 { 0.0 } else { revenue / total_bills as f64 };

    AnalyticsSummary {
        window_days: window.days,
        summary: SummaryTotals {
            total_revenue: round2(revenue),
            total_bills,
            average_bill_value: round2(average_bill_value),
            total_inventory_items: history.inventory_count,
        },
        top_selling_items: top_items(&lines),
        category_breakdown: category_breakdown(&lines, revenue),
        peak_hours: hour_histogram(&lines),
        peak_day: peak_day(&bills),
    }
}

fn top_items(lines: &[&SaleLine]) -> Vec<TopItem> {
    let mut positions: HashMap<(&str, &str), usize> = HashMap::new();
    let mut items: Vec<TopItem> = Vec::new();

    for line in lines {
        let key = (line.item_name.as_str(), line.unit.as_str());
        let index = *positions.entry(key).or_insert_with(|| {
            items.push(TopItem {
                name: line.item_name.clone(),
                unit: line.unit.clone(),
                quantity: 0.0,
                times_sold: 0,
            });
            items.len() - 1
        });
        items[index].quantity += line.quantity;
        items[index].times_sold += 1;
    }

    // `sort_by` is stable, so equal quantities keep first-sold order.
    items.sort_by(|left, right| right.quantity.total_cmp(&left.quantity));
    items.truncate(TOP_ITEMS_LIMIT);
    items
}

fn category_breakdown(lines: &[&SaleLine], revenue: f64) -> Vec<CategoryShare> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut shares: Vec<CategoryShare> = Vec::new();

    for line in lines {
        let index = *positions.entry(line.category.as_str()).or_insert_with(|| {
            shares.push(CategoryShare {
                category: line.category.clone(),
                total_sales: 0.0,
                quantity: 0.0,
                percentage: 0.0,
            });
            shares.len() - 1
        });
        shares[index].total_sales += line.line_total;
        shares[index].quantity += line.quantity;
    }

    for share in &mut shares {
        share.percentage =
            if revenue > 0.0 { round1(share.total_sales / revenue * 100.0) } else { 0.0 };
        share.total_sales = round2(share.total_sales);
    }
    shares.sort_by(|left, right| right.total_sales.total_cmp(&left.total_sales));
    shares
}

fn hour_histogram(lines: &[&SaleLine]) -> Vec<HourBucket> {
    let mut buckets: BTreeMap<u8, (u64, f64)> = BTreeMap::new();
    for line in lines {
        let bucket = buckets.entry(line.hour_of_day.min(23)).or_insert((0, 0.0));
        bucket.0 += 1;
        bucket.1 += line.line_total;
    }

    buckets
        .into_iter()
        .map(|(hour, (sales_count, total_sales))| HourBucket {
            hour,
            sales_count,
            total_sales: round2(total_sales),
        })
        .collect()
}

/// Highest-revenue weekday. Ties go to the earliest weekday (Sunday first).
fn peak_day(bills: &[&BillTotal]) -> Option<PeakDay> {
    let mut days = [(0u64, 0.0f64); 7];
    for bill in bills {
        let index = bill.billed_at.weekday().num_days_from_sunday() as usize;
        days[index].0 += 1;
        days[index].1 += bill.total_amount;
    }

    let mut best: Option<usize> = None;
    for (index, (count, total)) in days.iter().enumerate() {
        if *count == 0 {
            continue;
        }
        match best {
            Some(current) if days[current].1 >= *total => {}
            _ => best = Some(index),
        }
    }

    best.map(|index| PeakDay {
        day_index: index as u8,
        day: WEEKDAY_NAMES[index].to_string(),
        bill_count: days[index].0,
        total_sales: round2(days[index].1),
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::{aggregate, AnalyticsSummary, AnalyticsWindow, BillTotal, SalesHistory};
    use crate::domain::bill::{BillId, SaleLine};
    use crate::domain::owner::OwnerId;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        // 2026-03-01 is a Sunday.
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).single().expect("valid timestamp")
    }

    fn now() -> DateTime<Utc> {
        at(20, 12)
    }

    fn sale(name: &str, category: &str, quantity: f64, total: f64, sold_at: DateTime<Utc>) -> SaleLine {
        SaleLine {
            owner_id: OwnerId("shop-1".to_string()),
            bill_id: BillId("BILL-1".to_string()),
            item_name: name.to_string(),
            category: category.to_string(),
            quantity,
            unit: "kg".to_string(),
            price_per_unit: if quantity > 0.0 { total / quantity } else { 0.0 },
            line_total: total,
            sold_at,
            hour_of_day: sold_at.format("%H").to_string().parse().unwrap_or(0),
        }
    }

    fn bill(total: f64, billed_at: DateTime<Utc>) -> BillTotal {
        BillTotal { total_amount: total, billed_at }
    }

    #[test]
    fn empty_history_has_zero_average_and_no_peak_day() {
        let summary =
            aggregate(&SalesHistory::default(), &AnalyticsWindow::ending_at(now(), 30));

        assert_eq!(summary.summary.total_revenue, 0.0);
        assert_eq!(summary.summary.total_bills, 0);
        assert_eq!(summary.summary.average_bill_value, 0.0);
        assert!(summary.peak_day.is_none());
        assert_eq!(summary, AnalyticsSummary::empty(30));
    }

    #[test]
    fn single_bill_reports_revenue_count_and_average() {
        let billed_at = at(18, 10);
        let history = SalesHistory {
            bills: vec![bill(150.0, billed_at)],
            sale_lines: vec![
                sale("Chawal", "Anaj", 2.0, 100.0, billed_at),
                sale("Dal", "Dal", 1.0, 50.0, billed_at),
            ],
            inventory_count: 12,
        };

        let summary = aggregate(&history, &AnalyticsWindow::ending_at(now(), 30));
        assert_eq!(summary.summary.total_revenue, 150.0);
        assert_eq!(summary.summary.total_bills, 1);
        assert_eq!(summary.summary.average_bill_value, 150.0);
        assert_eq!(summary.summary.total_inventory_items, 12);
    }

    #[test]
    fn rows_outside_the_window_are_ignored() {
        let old = now() - Duration::days(45);
        let history = SalesHistory {
            bills: vec![bill(500.0, old), bill(80.0, at(19, 9))],
            sale_lines: vec![
                sale("Chawal", "Anaj", 10.0, 500.0, old),
                sale("Dal", "Dal", 1.0, 80.0, at(19, 9)),
            ],
            inventory_count: 0,
        };

        let summary = aggregate(&history, &AnalyticsWindow::ending_at(now(), 30));
        assert_eq!(summary.summary.total_revenue, 80.0);
        assert_eq!(summary.top_selling_items.len(), 1);
        assert_eq!(summary.top_selling_items[0].name, "Dal");
    }

    #[test]
    fn top_items_sort_by_quantity_and_keep_first_sold_order_on_ties() {
        let history = SalesHistory {
            bills: vec![bill(300.0, at(10, 9))],
            sale_lines: vec![
                sale("Sugar", "Kirana", 2.0, 80.0, at(10, 9)),
                sale("Chawal", "Anaj", 5.0, 250.0, at(10, 9)),
                sale("Salt", "Kirana", 2.0, 40.0, at(10, 10)),
                sale("Sugar", "Kirana", 1.0, 40.0, at(11, 9)),
                sale("Tea", "Kirana", 1.0, 10.0, at(11, 9)),
                sale("Oil", "Tel", 1.0, 150.0, at(11, 9)),
                sale("Soap", "Other", 1.0, 30.0, at(12, 9)),
            ],
            inventory_count: 0,
        };

        let summary = aggregate(&history, &AnalyticsWindow::ending_at(now(), 30));
        let names =
            summary.top_selling_items.iter().map(|item| item.name.as_str()).collect::<Vec<_>>();

        assert_eq!(names, vec!["Chawal", "Sugar", "Salt", "Tea", "Oil"]);
        assert_eq!(summary.top_selling_items[1].times_sold, 2);
        assert_eq!(summary.top_selling_items[1].quantity, 3.0);
    }

    #[test]
    fn category_percentages_sum_to_one_hundred() {
        let history = SalesHistory {
            bills: vec![bill(100.0, at(3, 9)), bill(200.0, at(4, 9))],
            sale_lines: vec![
                sale("Chawal", "Anaj", 1.0, 100.0, at(3, 9)),
                sale("Dal", "Dal", 1.0, 70.0, at(4, 9)),
                sale("Oil", "Tel", 1.0, 130.0, at(4, 9)),
            ],
            inventory_count: 0,
        };

        let summary = aggregate(&history, &AnalyticsWindow::ending_at(now(), 30));
        let total = summary.category_breakdown.iter().map(|share| share.percentage).sum::<f64>();

        assert!((total - 100.0).abs() < 0.5, "percentages summed to {total}");
        assert_eq!(summary.category_breakdown[0].category, "Tel");
    }

    #[test]
    fn hour_histogram_is_ordered_by_hour() {
        let history = SalesHistory {
            bills: vec![bill(60.0, at(5, 19))],
            sale_lines: vec![
                sale("Dal", "Dal", 1.0, 20.0, at(5, 19)),
                sale("Dal", "Dal", 1.0, 20.0, at(5, 8)),
                sale("Dal", "Dal", 1.0, 20.0, at(6, 19)),
            ],
            inventory_count: 0,
        };

        let summary = aggregate(&history, &AnalyticsWindow::ending_at(now(), 30));
        let hours = summary.peak_hours.iter().map(|bucket| bucket.hour).collect::<Vec<_>>();
        assert_eq!(hours, vec![8, 19]);
        assert_eq!(summary.peak_hours[1].sales_count, 2);
        assert_eq!(summary.peak_hours[1].total_sales, 40.0);
    }

    #[test]
    fn peak_day_ties_resolve_to_earliest_weekday() {
        // 2026-03-03 is a Tuesday, 2026-03-02 a Monday.
        let history = SalesHistory {
            bills: vec![bill(100.0, at(3, 9)), bill(100.0, at(2, 9)), bill(40.0, at(7, 9))],
            sale_lines: Vec::new(),
            inventory_count: 0,
        };

        let summary = aggregate(&history, &AnalyticsWindow::ending_at(now(), 30));
        let peak = summary.peak_day.expect("peak day");
        assert_eq!(peak.day, "Monday");
        assert_eq!(peak.day_index, 1);
        assert_eq!(peak.total_sales, 100.0);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let history = SalesHistory {
            bills: vec![bill(90.0, at(8, 9)), bill(45.5, at(9, 20))],
            sale_lines: vec![
                sale("Dal", "Dal", 1.0, 90.0, at(8, 9)),
                sale("Maggie", "Snacks", 3.0, 45.5, at(9, 20)),
            ],
            inventory_count: 4,
        };
        let window = AnalyticsWindow::ending_at(now(), 30);

        assert_eq!(aggregate(&history, &window), aggregate(&history, &window));
    }
}
