//! # Returns
//!
//! Arithmetic for reversing part or all of a recorded sale.
//!
//! ## Per-Line Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  resolve product (id → barcode → name)       miss → ProductNotFound    │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  sale.take_return(&product, n)                                          │
//! │    ├── n ≤ 0                                  → Validation             │
//! │    ├── no line for product / n > line.qty     → ExcessiveReturn        │
//! │    └── line.qty -= n ; total -= n × frozen price                       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  ledger: product.quantity += n                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//!
//!   after all lines: sale.settle_returns()
//!     is_return = every line at 0 ; total = max(total, 0)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Product, Sale};
use crate::validation::validate_line_quantity;

/// One requested return line. `product` may be a product id, barcode or
/// exact name.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct ReturnLine {
    #[serde(alias = "productId")]
    pub product: String,
    pub quantity: i64,
}

/// Result of a processed return request.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReturnOutcome {
    pub message: String,
    /// Internal id of the sale the return was applied to.
    pub sale_id: String,
    pub all_returned: bool,
}

impl ReturnOutcome {
    pub fn new(sale_id: impl Into<String>, all_returned: bool) -> Self {
        ReturnOutcome {
            message: "Return processed successfully".to_string(),
            sale_id: sale_id.into(),
            all_returned,
        }
    }
}

/// Rejects an empty return request.
pub fn validate_return_lines(lines: &[ReturnLine]) -> CoreResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::required("returnItems").into());
    }
    Ok(())
}

impl Sale {
    /// Removes `quantity` units of `product` from this sale and returns the
    /// refunded amount at the line's frozen price.
    ///
    /// Leaves the sale untouched on error.
    pub fn take_return(&mut self, product: &Product, quantity: i64) -> CoreResult<Money> {
        validate_line_quantity(quantity)?;

        let line = self
            .items
            .iter_mut()
            .find(|line| line.product_id == product.id)
            .ok_or_else(|| CoreError::ExcessiveReturn {
                product: product.name.clone(),
                requested: quantity,
                remaining: 0,
            })?;

        if quantity > line.quantity {
            return Err(CoreError::ExcessiveReturn {
                product: product.name.clone(),
                requested: quantity,
                remaining: line.quantity,
            });
        }

        line.quantity -= quantity;
        let refund = line.unit_price().multiply_quantity(quantity);
        self.total_cents = (self.total() - refund).cents();
        Ok(refund)
    }

    /// Closes out a return request: sets `is_return` when nothing remains
    /// sold and floors the total at zero. Returns the `is_return` value.
    pub fn settle_returns(&mut self, now: DateTime<Utc>) -> bool {
        let all_returned = self.items.iter().all(|line| line.quantity == 0);
        self.is_return = all_returned;
        self.total_cents = self.total().clamp_non_negative().cents();
        self.updated_at = now;
        all_returned
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LineItem;

    fn product(id: &str) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: id.to_string(),
            price_cents: 9999,
            barcode: format!("bc-{id}"),
            quantity: 0,
            low_stock_threshold: 10,
            overstock_threshold: 100,
            created_at: now,
            updated_at: now,
        }
    }

    fn sale() -> Sale {
        let now = Utc::now();
        Sale {
            id: "s-1".to_string(),
            sale_number: 1,
            employee_id: "e-1".to_string(),
            items: vec![
                LineItem {
                    product_id: "pen".to_string(),
                    quantity: 3,
                    unit_price_cents: 1000,
                },
                LineItem {
                    product_id: "cap".to_string(),
                    quantity: 1,
                    unit_price_cents: 250,
                },
            ],
            total_cents: 3250,
            is_return: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_partial_return_uses_frozen_price() {
        let mut sale = sale();
        // Catalog price has changed since the sale; refund uses 10.00.
        let refund = sale.take_return(&product("pen"), 2).unwrap();

        assert_eq!(refund.cents(), 2000);
        assert_eq!(sale.items[0].quantity, 1);
        assert_eq!(sale.total_cents, 1250);
        assert!(!sale.settle_returns(Utc::now()));
        assert!(!sale.is_return);
    }

    #[test]
    fn test_full_return_sets_flag_and_zero_total() {
        let mut sale = sale();
        sale.take_return(&product("pen"), 3).unwrap();
        sale.take_return(&product("cap"), 1).unwrap();

        assert!(sale.settle_returns(Utc::now()));
        assert!(sale.is_return);
        assert_eq!(sale.total_cents, 0);
    }

    #[test]
    fn test_excessive_return_leaves_sale_unchanged() {
        let mut sale = sale();
        let before = sale.clone();

        let err = sale.take_return(&product("pen"), 4).unwrap_err();
        assert!(matches!(
            err,
            CoreError::ExcessiveReturn {
                requested: 4,
                remaining: 3,
                ..
            }
        ));
        assert_eq!(sale, before);
    }

    #[test]
    fn test_return_of_product_not_on_sale() {
        let mut sale = sale();
        let err = sale.take_return(&product("mug"), 1).unwrap_err();
        assert!(matches!(err, CoreError::ExcessiveReturn { remaining: 0, .. }));
    }

    #[test]
    fn test_non_positive_quantity_is_validation_error() {
        let mut sale = sale();
        assert!(matches!(
            sale.take_return(&product("pen"), 0),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_settle_clamps_negative_total() {
        let mut sale = sale();
        sale.total_cents = 500;
        sale.take_return(&product("pen"), 3).unwrap();
        assert_eq!(sale.total_cents, -2500);

        sale.settle_returns(Utc::now());
        assert_eq!(sale.total_cents, 0);
    }

    #[test]
    fn test_validate_return_lines() {
        assert!(validate_return_lines(&[]).is_err());

        let line: ReturnLine = serde_json::from_str(r#"{"productId":"P1","quantity":1}"#).unwrap();
        assert!(validate_return_lines(&[line]).is_ok());
    }
}
