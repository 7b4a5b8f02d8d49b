//! Admin dashboard aggregates.
//!
//! Pure reducers over the full order list. Nothing here is stored; the
//! dashboard recomputes the report from the fetched orders on every request.

use crate::models::{Money, Order, OrderStatus};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Number of distinct calendar days in the revenue series.
pub const REVENUE_DAYS: usize = 7;

/// Order count per status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StatusCounts {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub pending: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub delivered: u64,
}

impl StatusCounts {
    fn record(&mut self, status: OrderStatus) {
        match status {
            OrderStatus::Pending => self.pending += 1,
            OrderStatus::Delivered => self.delivered += 1,
        }
    }
}

/// A best-selling product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TopProduct {
    pub product_id: String,
    pub product_name: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub quantity: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub revenue: Money,
}

/// Revenue for one calendar day ("YYYY-MM-DD").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DailyRevenue {
    pub date: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub revenue: Money,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub orders: u64,
}

/// Summary shown on the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DashboardReport {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_revenue: Money,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub order_count: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub average_order_value: Money,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub units_sold: u64,
    pub status_counts: StatusCounts,
    pub top_products: Vec<TopProduct>,
    /// Most recent days present in the data, oldest first
    pub revenue_by_day: Vec<DailyRevenue>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub user_count: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub product_count: u64,
}

impl DashboardReport {
    /// Reduce an order list into a report.
    ///
    /// Revenue counts every order regardless of status.
    pub fn from_orders(orders: &[Order], top_n: usize, day_offset: FixedOffset) -> Self {
        let mut status_counts = StatusCounts::default();
        let mut total_revenue = Money::ZERO;
        let mut units_sold = 0u64;

        for order in orders {
            total_revenue += order.total_price;
            units_sold += order.units();
            status_counts.record(order.status);
        }

        let order_count = count(orders.len());

        Self {
            total_revenue,
            order_count,
            average_order_value: total_revenue.average_over(order_count),
            units_sold,
            status_counts,
            top_products: top_products(orders, top_n),
            revenue_by_day: revenue_by_day(orders, REVENUE_DAYS, day_offset),
            user_count: 0,
            product_count: 0,
        }
    }

    /// Attach the header-card counts.
    pub fn with_counts(mut self, user_count: usize, product_count: usize) -> Self {
        self.user_count = count(user_count);
        self.product_count = count(product_count);
        self
    }
}

/// Top `n` products by units sold.
///
/// Ties are broken by product name, then ID. The name shown is the one
/// recorded on the most recent order containing the product.
pub fn top_products(orders: &[Order], n: usize) -> Vec<TopProduct> {
    struct Tally<'a> {
        name: &'a str,
        named_at: i64,
        quantity: u64,
        revenue: Money,
    }

    let mut tallies: HashMap<&str, Tally<'_>> = HashMap::new();

    for order in orders {
        for item in order.items.values() {
            let tally = tallies.entry(item.product_id.as_str()).or_insert(Tally {
                name: &item.product_name,
                named_at: order.order_date,
                quantity: 0,
                revenue: Money::ZERO,
            });
            if order.order_date > tally.named_at {
                tally.name = &item.product_name;
                tally.named_at = order.order_date;
            }
            tally.quantity += u64::from(item.quantity);
            tally.revenue += item.subtotal;
        }
    }

    let mut ranked: Vec<TopProduct> = tallies
        .into_iter()
        .map(|(product_id, t)| TopProduct {
            product_id: product_id.to_string(),
            product_name: t.name.to_string(),
            quantity: t.quantity,
            revenue: t.revenue,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| a.product_name.cmp(&b.product_name))
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    ranked.truncate(n);
    ranked
}

/// Revenue for the `days` most recent calendar days that have orders.
pub fn revenue_by_day(orders: &[Order], days: usize, offset: FixedOffset) -> Vec<DailyRevenue> {
    let mut by_day: BTreeMap<String, (Money, u64)> = BTreeMap::new();

    for order in orders {
        let Some(key) = day_key(order.order_date, offset) else {
            continue;
        };
        let entry = by_day.entry(key).or_insert((Money::ZERO, 0));
        entry.0 += order.total_price;
        entry.1 += 1;
    }

    let mut series: Vec<DailyRevenue> = by_day
        .into_iter()
        .rev()
        .take(days)
        .map(|(date, (revenue, orders))| DailyRevenue {
            date,
            revenue,
            orders,
        })
        .collect();
    series.reverse();
    series
}

fn count(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

/// "YYYY-MM-DD" for an epoch-millisecond timestamp in the given offset.
fn day_key(epoch_ms: i64, offset: FixedOffset) -> Option<String> {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|utc| utc.with_timezone(&offset).format("%Y-%m-%d").to_string())
}
