//! # Checkout
//!
//! Turns a validated cart into a sale. The draft is built line by line in
//! cart order while the storage layer decrements stock for each line.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate_cart(lines)        empty? → EmptyCart, qty ≤ 0? → Validation │
//! │        │                                                                │
//! │        ▼   for each line, in order                                      │
//! │  ┌──────────────────────────────────────────────┐                       │
//! │  │ load product ──► draft.add_line(&product, n) │ InsufficientStock?    │
//! │  │                  └ price frozen here         │                       │
//! │  │ ledger: quantity -= n (conditional)          │                       │
//! │  └──────────────────────────────────────────────┘                       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  draft.into_sale(id, sale_number, now) ──► Sale                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Deserialize;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{LineItem, Product, Sale};
use crate::validation::validate_line_quantity;

/// One requested cart line.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(alias = "product")]
    pub product_id: String,
    pub quantity: i64,
}

/// Rejects an empty cart or any non-positive quantity before stock is
/// touched.
pub fn validate_cart(lines: &[CartLine]) -> CoreResult<()> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }
    for line in lines {
        validate_line_quantity(line.quantity)?;
    }
    Ok(())
}

/// Fails with `InsufficientStock` when `product` cannot cover `quantity`.
pub fn ensure_stock(product: &Product, quantity: i64) -> CoreResult<()> {
    if !product.can_sell(quantity) {
        return Err(CoreError::InsufficientStock {
            product: product.name.clone(),
            available: product.quantity,
            requested: quantity,
        });
    }
    Ok(())
}

/// A sale being assembled.
#[derive(Debug, Clone)]
pub struct SaleDraft {
    employee_id: String,
    items: Vec<LineItem>,
    total: Money,
}

impl SaleDraft {
    pub fn new(employee_id: impl Into<String>) -> Self {
        SaleDraft {
            employee_id: employee_id.into(),
            items: Vec::new(),
            total: Money::zero(),
        }
    }

    /// Appends a line for `quantity` units of `product`, freezing the
    /// product's current price.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let mut draft = SaleDraft::new("emp-1");
    /// draft.add_line(&pen, 3)?;          // pen.price = 10.00
    /// assert_eq!(draft.total().cents(), 3000);
    /// ```
    pub fn add_line(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        validate_line_quantity(quantity)?;
        ensure_stock(product, quantity)?;

        let overflow = || CoreError::AmountOverflow {
            product: product.name.clone(),
            quantity,
        };
        let total = product
            .price()
            .checked_mul_quantity(quantity)
            .and_then(|line_total| self.total.checked_add(line_total))
            .ok_or_else(overflow)?;

        self.items.push(LineItem {
            product_id: product.id.clone(),
            quantity,
            unit_price_cents: product.price_cents,
        });
        self.total = total;
        Ok(())
    }

    #[inline]
    pub fn total(&self) -> Money {
        self.total
    }

    #[inline]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Finalizes the draft into a sale record.
    pub fn into_sale(self, id: String, sale_number: i64, now: DateTime<Utc>) -> Sale {
        Sale {
            id,
            sale_number,
            employee_id: self.employee_id,
            items: self.items,
            total_cents: self.total.cents(),
            is_return: false,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
