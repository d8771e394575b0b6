//! # Bills & Receipts
//!
//! A bill stores a structured snapshot of a sale at the moment it was
//! issued. Printable text is produced from that snapshot when someone asks
//! for it, so a bill never carries presentation markup and is never
//! re-rendered from the sale's later state.
//!
//! ```text
//!   Sale (live, may change on return)
//!     │  BillContent::capture  (snapshot now)
//!     ▼
//!   Bill { content: BillContent }  ──►  stored as JSON, immutable
//!     │  content.render(currency)  (any time later)
//!     ▼
//!   ReceiptText  ──►  "SALE RECEIPT ... TOTAL PKR 30.00"
//! ```

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{PaymentMethod, Sale};

const RECEIPT_WIDTH: usize = 44;
const UNKNOWN_PRODUCT: &str = "Unknown product";
const UNKNOWN_EMPLOYEE: &str = "Unknown";

// =============================================================================
// Bill Types
// =============================================================================

/// One printed line of a bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BillLine {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    #[serde(rename = "price", with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub unit_price_cents: i64,
    #[serde(rename = "amount", with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub line_total_cents: i64,
}

/// Everything a receipt shows, frozen at issue time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BillContent {
    pub sale_id: String,
    pub sale_number: i64,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
    pub employee_name: String,
    pub customer_info: String,
    pub payment_method: PaymentMethod,
    pub lines: Vec<BillLine>,
    #[serde(rename = "total", with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub total_cents: i64,
    pub is_return: bool,
}

/// A persisted bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: String,
    pub sale_id: String,
    pub customer_info: String,
    pub payment_method: PaymentMethod,
    pub content: BillContent,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl BillContent {
    /// Snapshots `sale` for a bill.
    ///
    /// `catalog` maps product ids to display names; lines whose product has
    /// since been deleted print as "Unknown product".
    pub fn capture(
        sale: &Sale,
        employee_name: Option<&str>,
        catalog: &HashMap<String, String>,
        customer_info: String,
        payment_method: PaymentMethod,
    ) -> Self {
        let lines = sale
            .items
            .iter()
            .map(|line| BillLine {
                product_id: line.product_id.clone(),
                product_name: catalog
                    .get(&line.product_id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string()),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                line_total_cents: line.line_total().cents(),
            })
            .collect();

        BillContent {
            sale_id: sale.id.clone(),
            sale_number: sale.sale_number,
            sale_date: sale.created_at,
            employee_name: employee_name.unwrap_or(UNKNOWN_EMPLOYEE).to_string(),
            customer_info,
            payment_method,
            lines,
            total_cents: sale.total_cents,
            is_return: sale.is_return,
        }
    }

    /// Printable view with the given currency label.
    pub fn render<'a>(&'a self, currency: &'a str) -> ReceiptText<'a> {
        ReceiptText {
            content: self,
            currency,
        }
    }
}

// =============================================================================
// Receipt Text
// =============================================================================

/// Plain-text receipt. Use `to_string()` or write it anywhere that takes
/// `Display`.
pub struct ReceiptText<'a> {
    content: &'a BillContent,
    currency: &'a str,
}

impl fmt::Display for ReceiptText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.content;
        let rule = "=".repeat(RECEIPT_WIDTH);
        let thin = "-".repeat(RECEIPT_WIDTH);

        writeln!(f, "{rule}")?;
        writeln!(f, "{:^width$}", "SALE RECEIPT", width = RECEIPT_WIDTH)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Sale #:   {}", c.sale_number)?;
        writeln!(f, "Date:     {}", c.sale_date.format("%Y-%m-%d %H:%M UTC"))?;
        writeln!(f, "Cashier:  {}", c.employee_name)?;
        writeln!(f, "Customer: {}", c.customer_info)?;
        writeln!(f, "Payment:  {}", c.payment_method)?;
        writeln!(f, "{thin}")?;
        writeln!(f, "{:<20}{:>6}{:>9}{:>9}", "Item", "Qty", "Price", "Amount")?;
        for line in &c.lines {
            writeln!(
                f,
                "{:<20}{:>6}{:>9}{:>9}",
                truncate(&line.product_name, 19),
                line.quantity,
                Money::from_cents(line.unit_price_cents),
                Money::from_cents(line.line_total_cents),
            )?;
        }
        writeln!(f, "{thin}")?;
        let total = format!("{} {}", self.currency, Money::from_cents(c.total_cents));
        writeln!(f, "{:<10}{:>width$}", "TOTAL", total, width = RECEIPT_WIDTH - 10)?;
        if c.is_return {
            writeln!(f, "{:^width$}", "*** RETURN TRANSACTION ***", width = RECEIPT_WIDTH)?;
        }
        writeln!(f, "{rule}")?;
        write!(f, "{:^width$}", "Thank you for your purchase!", width = RECEIPT_WIDTH)
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max - 1).chain(std::iter::once('…')).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LineItem;
    use chrono::TimeZone;

    fn sale() -> Sale {
        let when = Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap();
        Sale {
            id: "s-1".to_string(),
            sale_number: 42,
            employee_id: "e-1".to_string(),
            items: vec![
                LineItem {
                    product_id: "pen".to_string(),
                    quantity: 3,
                    unit_price_cents: 1000,
                },
                LineItem {
                    product_id: "gone".to_string(),
                    quantity: 1,
                    unit_price_cents: 250,
                },
            ],
            total_cents: 3250,
            is_return: false,
            created_at: when,
            updated_at: when,
        }
    }

    fn catalog() -> HashMap<String, String> {
        HashMap::from([("pen".to_string(), "Pen".to_string())])
    }

    #[test]
    fn test_capture_snapshots_sale() {
        let content = BillContent::capture(
            &sale(),
            Some("Ayesha"),
            &catalog(),
            "N/A".to_string(),
            PaymentMethod::Cash,
        );

        assert_eq!(content.sale_number, 42);
        assert_eq!(content.lines[0].product_name, "Pen");
        assert_eq!(content.lines[0].line_total_cents, 3000);
        assert_eq!(content.lines[1].product_name, "Unknown product");
        assert_eq!(content.total_cents, 3250);
    }

    #[test]
    fn test_render_text() {
        let content = BillContent::capture(
            &sale(),
            Some("Ayesha"),
            &catalog(),
            "Walk-in".to_string(),
            PaymentMethod::DigitalWallet,
        );
        let text = content.render("PKR").to_string();

        assert!(text.contains("SALE RECEIPT"));
        assert!(text.contains("Sale #:   42"));
        assert!(text.contains("Date:     2026-03-02 09:30 UTC"));
        assert!(text.contains("Payment:  Digital Wallet"));
        assert!(text.contains("PKR 32.50"));
        assert!(!text.contains("RETURN TRANSACTION"));
    }

    #[test]
    fn test_render_marks_returns() {
        let mut returned = sale();
        returned.is_return = true;
        let content = BillContent::capture(
            &returned,
            None,
            &catalog(),
            "N/A".to_string(),
            PaymentMethod::Cash,
        );
        assert!(content.render("PKR").to_string().contains("*** RETURN TRANSACTION ***"));
    }

    #[test]
    fn test_content_survives_json() {
        let content = BillContent::capture(
            &sale(),
            Some("Ayesha"),
            &catalog(),
            "N/A".to_string(),
            PaymentMethod::Card,
        );
        let json = serde_json::to_string(&content).unwrap();
        let back: BillContent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, content);
    }

    #[test]
    fn test_truncate_long_names() {
        assert_eq!(truncate("Pen", 19), "Pen");
        assert_eq!(truncate(&"x".repeat(25), 5).chars().count(), 5);
    }
}
