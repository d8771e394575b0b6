//! # Sales Aggregation
//!
//! Period statistics computed over already-loaded sales. The storage layer
//! fetches the sales for a [`MonthWindow`] plus a product-name lookup; the
//! functions here fold them into report rows.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sales in window ──► flatten line items ──► group by product_id        │
//! │                                                 │                       │
//! │            catalog (id → name) ── drop deleted ◄┘                       │
//! │                                                 │                       │
//! │                    sort: quantity ↓, name ↑, id ↑                       │
//! │                                                 │                       │
//! │        ┌───────────────────┬────────────────────┼───────────────┐       │
//! │        ▼                   ▼                    ▼               ▼       │
//! │  sales_by_product     top_sellers(5)     monthly_report     export_csv │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Line quantities are read as currently stored, so returns that already
//! reduced a line are reflected in quantity and revenue.

use std::collections::HashMap;

use serde::Serialize;
use ts_rs::TS;

use crate::alerts::{evaluate_alerts, AlertCounts};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Product, Sale};
use crate::window::MonthWindow;

// =============================================================================
// Report Rows
// =============================================================================

/// Quantity and revenue for one product over a period.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    pub product_id: String,
    pub product_name: String,
    pub total_quantity: i64,
    #[serde(rename = "totalRevenue", with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub total_revenue_cents: i64,
}

/// Entry in a "top selling products" list of the sales analysis.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TopSeller {
    pub product_name: String,
    pub total_quantity: i64,
    #[serde(rename = "totalRevenue", with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub total_revenue_cents: i64,
}

/// Per-product rows together with the leading entries.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesAnalysis {
    pub items: Vec<ProductSales>,
    pub top_selling_products: Vec<TopSeller>,
}

/// Totals section of the monthly report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    #[serde(rename = "totalRevenue", with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub total_revenue_cents: i64,
    pub total_sales_count: i64,
    #[serde(rename = "averageSale", with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub average_sale_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTopSeller {
    pub product_name: String,
    pub total_quantity_sold: i64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    /// `YYYY-M`
    pub month: String,
    pub summary: MonthlySummary,
    pub top_selling_products: Vec<MonthlyTopSeller>,
}

/// All-time sale totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesTotals {
    #[serde(rename = "totalRevenue", with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub total_revenue_cents: i64,
    pub total_sales_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub total_products: usize,
    pub total_quantity: i64,
}

/// Landing-page numbers for admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_sales: SalesTotals,
    pub product_summary: ProductSummary,
    pub inventory_alerts: AlertCounts,
}

// =============================================================================
// Aggregations
// =============================================================================

/// Groups the line items of sales inside `window` by product.
///
/// Products missing from `catalog` (deleted since the sale) are dropped.
/// Rows are ordered by quantity descending; ties go to name, then id, so
/// the ordering is stable across runs.
pub fn sales_by_product(
    window: &MonthWindow,
    sales: &[Sale],
    catalog: &HashMap<String, String>,
) -> Vec<ProductSales> {
    let mut grouped: HashMap<&str, (i64, Money)> = HashMap::new();

    for sale in sales.iter().filter(|s| window.contains(s.created_at)) {
        for line in &sale.items {
            let entry = grouped
                .entry(line.product_id.as_str())
                .or_insert((0, Money::zero()));
            entry.0 += line.quantity;
            entry.1 += line.line_total();
        }
    }

    let mut rows: Vec<ProductSales> = grouped
        .into_iter()
        .filter_map(|(product_id, (quantity, revenue))| {
            catalog.get(product_id).map(|name| ProductSales {
                product_id: product_id.to_string(),
                product_name: name.clone(),
                total_quantity: quantity,
                total_revenue_cents: revenue.cents(),
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total_quantity
            .cmp(&a.total_quantity)
            .then_with(|| a.product_name.cmp(&b.product_name))
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    rows
}

/// The first `n` rows of an ordered [`sales_by_product`] result.
pub fn top_sellers(rows: &[ProductSales], n: usize) -> Vec<TopSeller> {
    rows.iter()
        .take(n)
        .map(|row| TopSeller {
            product_name: row.product_name.clone(),
            total_quantity: row.total_quantity,
            total_revenue_cents: row.total_revenue_cents,
        })
        .collect()
}

pub fn analysis_with_top(rows: Vec<ProductSales>) -> SalesAnalysis {
    let top_selling_products = top_sellers(&rows, crate::TOP_SELLERS_LIMIT);
    SalesAnalysis {
        items: rows,
        top_selling_products,
    }
}

/// Revenue, count, average and the five best sellers for one month.
///
/// ## Example
/// ```text
/// sales in March: 30.00, 20.00, 10.00
///   → totalRevenue 60.00, totalSalesCount 3, averageSale 20.00
/// no sales
///   → 0.00, 0, 0.00
/// ```
pub fn monthly_report(
    window: &MonthWindow,
    sales: &[Sale],
    catalog: &HashMap<String, String>,
) -> MonthlyReport {
    let in_window: Vec<&Sale> = sales
        .iter()
        .filter(|s| window.contains(s.created_at))
        .collect();

    let revenue: Money = in_window.iter().map(|s| s.total()).sum();
    let count = in_window.len() as i64;

    let top_selling_products = sales_by_product(window, sales, catalog)
        .into_iter()
        .take(crate::TOP_SELLERS_LIMIT)
        .map(|row| MonthlyTopSeller {
            product_name: row.product_name,
            total_quantity_sold: row.total_quantity,
        })
        .collect();

    MonthlyReport {
        month: window.label(),
        summary: MonthlySummary {
            total_revenue_cents: revenue.cents(),
            total_sales_count: count,
            average_sale_cents: average_cents(revenue.cents(), count),
        },
        top_selling_products,
    }
}

/// Dashboard numbers from all-time sale totals and the current catalog.
pub fn dashboard_summary(totals: SalesTotals, products: &[Product]) -> DashboardSummary {
    DashboardSummary {
        total_sales: totals,
        product_summary: ProductSummary {
            total_products: products.len(),
            total_quantity: products.iter().map(|p| p.quantity).sum(),
        },
        inventory_alerts: evaluate_alerts(products).counts(),
    }
}

/// Mean in cents, rounded half away from zero. Zero when there is nothing
/// to average.
fn average_cents(total: i64, count: i64) -> i64 {
    if count == 0 {
        return 0;
    }
    let total = total as i128;
    let count = count as i128;
    let rounded = if total >= 0 {
        (2 * total + count) / (2 * count)
    } else {
        (2 * total - count) / (2 * count)
    };
    rounded as i64
}

// =============================================================================
// CSV Export
// =============================================================================

/// Header row of the sales-frequency export.
pub const CSV_HEADER: [&str; 4] = ["Product Name", "Product ID", "Total Quantity", "Total Revenue"];

/// Serializes report rows as RFC 4180 CSV. Fields containing commas,
/// quotes or line breaks are quoted with internal quotes doubled.
pub fn export_csv(rows: &[ProductSales]) -> CoreResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(CSV_HEADER)
        .map_err(|e| CoreError::Export(e.to_string()))?;
    for row in rows {
        let quantity = row.total_quantity.to_string();
        let revenue = Money::from_cents(row.total_revenue_cents).to_string();
        writer
            .write_record([
                row.product_name.as_str(),
                row.product_id.as_str(),
                quantity.as_str(),
                revenue.as_str(),
            ])
            .map_err(|e| CoreError::Export(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CoreError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CoreError::Export(e.to_string()))
}

// =============================================================================
// Unit Tests
// =============================================================================
