//! # Stock Alerts
//!
//! Classifies each product against its own thresholds.
//!
//! ```text
//!   quantity:  0 ──── 1 ········ low ········ over ──────►
//!              │      └── low-stock ──┘        └── overstock
//!              └── out-of-stock
//! ```
//!
//! Each class is evaluated independently. A product whose low threshold is
//! at or above its overstock threshold can land in both low-stock and
//! overstock; that configuration is accepted as-is.

use serde::Serialize;
use ts_rs::TS;

use crate::types::Product;

/// Products grouped by alert class.
#[derive(Debug, Clone, Default, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryAlerts {
    pub low_stock: Vec<Product>,
    pub out_of_stock: Vec<Product>,
    pub overstock: Vec<Product>,
}

/// Alert class sizes, as shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AlertCounts {
    pub low_stock_count: usize,
    pub out_of_stock_count: usize,
    pub overstock_count: usize,
}

/// Inventory report: catalog totals plus the classified products.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    pub total_products: usize,
    pub total_quantity: i64,
    pub low_stock: Vec<Product>,
    pub out_of_stock: Vec<Product>,
    pub overstock: Vec<Product>,
}

impl InventoryAlerts {
    pub fn counts(&self) -> AlertCounts {
        AlertCounts {
            low_stock_count: self.low_stock.len(),
            out_of_stock_count: self.out_of_stock.len(),
            overstock_count: self.overstock.len(),
        }
    }
}

/// Splits `products` into the three alert classes, preserving input order.
pub fn evaluate_alerts<'a, I>(products: I) -> InventoryAlerts
where
    I: IntoIterator<Item = &'a Product>,
{
    let mut alerts = InventoryAlerts::default();
    for product in products {
        if product.is_out_of_stock() {
            alerts.out_of_stock.push(product.clone());
        }
        if product.is_low_stock() {
            alerts.low_stock.push(product.clone());
        }
        if product.is_overstocked() {
            alerts.overstock.push(product.clone());
        }
    }
    alerts
}

/// Builds the inventory report for the full catalog.
pub fn inventory_report(products: &[Product]) -> InventoryReport {
    let alerts = evaluate_alerts(products);
    InventoryReport {
        total_products: products.len(),
        total_quantity: products.iter().map(|p| p.quantity).sum(),
        low_stock: alerts.low_stock,
        out_of_stock: alerts.out_of_stock,
        overstock: alerts.overstock,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
