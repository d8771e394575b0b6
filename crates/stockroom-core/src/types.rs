//! # Domain Types
//!
//! Core domain types used throughout Stockroom.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    Employee     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  items[]        │   │  id (UUID)      │       │
//! │  │  barcode (uniq) │   │  sale_number    │──►│  username       │       │
//! │  │  price_cents    │   │  total_cents    │   │  role           │       │
//! │  │  quantity       │   │  is_return      │   └─────────────────┘       │
//! │  │  thresholds     │   └────────▲────────┘                              │
//! │  └─────────────────┘            │ sale_id                               │
//! │                        ┌────────┴────────┐   ┌─────────────────┐       │
//! │                        │      Bill       │   │     Caller      │       │
//! │                        │ (receipt mod.)  │   │  employee_id    │       │
//! │                        └─────────────────┘   │  role           │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Products and sales carry:
//! - `id`: UUID v4, used for relations
//! - a business key: `barcode` for products, `sale_number` for sales

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Roles & Caller
// =============================================================================

/// What an authenticated user is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
}

/// The already-authenticated identity an operation runs on behalf of.
///
/// Passed explicitly into every service operation; nothing reads the
/// current user from ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Caller {
    pub employee_id: String,
    pub role: Role,
}

impl Caller {
    pub fn new(employee_id: impl Into<String>, role: Role) -> Self {
        Caller {
            employee_id: employee_id.into(),
            role,
        }
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// True when the caller may view another employee's records:
    /// admins see everyone, employees only themselves.
    pub fn can_view_employee(&self, employee_id: &str) -> bool {
        self.is_admin() || self.employee_id == employee_id
    }
}

// =============================================================================
// Employee
// =============================================================================

/// A registered user who records sales.
///
/// Account management lives in the external auth service; this is the
/// read model used to populate sale views and bills.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub username: String,
    pub role: Role,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A catalog entry with its running stock level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to cashier and on receipts.
    pub name: String,

    /// Current price in cents. Past sales keep their own frozen copy.
    #[serde(rename = "price", with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub price_cents: i64,

    /// Globally unique barcode.
    pub barcode: String,

    /// Units on hand. Never negative through the sale path.
    pub quantity: i64,

    /// At or below this (and above zero) the product is low on stock.
    pub low_stock_threshold: i64,

    /// At or above this the product is overstocked.
    pub overstock_threshold: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks if `quantity` units can be taken from stock.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.quantity >= quantity
    }

    #[inline]
    pub fn is_out_of_stock(&self) -> bool {
        self.quantity == 0
    }

    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.quantity > 0 && self.quantity <= self.low_stock_threshold
    }

    /// An empty shelf is only ever out of stock, even with a zero
    /// overstock threshold.
    #[inline]
    pub fn is_overstocked(&self) -> bool {
        self.quantity > 0 && self.quantity >= self.overstock_threshold
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a bill was settled. A free-form label; no gateway is involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    #[serde(rename = "Digital Wallet")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Digital Wallet"))]
    DigitalWallet,
    Other,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::DigitalWallet => "Digital Wallet",
            PaymentMethod::Other => "Other",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Cash" => Ok(PaymentMethod::Cash),
            "Card" => Ok(PaymentMethod::Card),
            "Digital Wallet" => Ok(PaymentMethod::DigitalWallet),
            "Other" => Ok(PaymentMethod::Other),
            other => Err(ValidationError::InvalidFormat {
                field: "paymentMethod".to_string(),
                reason: format!("unknown payment method '{other}'"),
            }),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// One product/quantity/frozen-price triple within a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Product reference. The product may since have been deleted.
    pub product_id: String,

    /// Units still recorded as sold (reduced by returns).
    pub quantity: i64,

    /// Unit price captured at the time of sale.
    #[serde(rename = "price", with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub unit_price_cents: i64,
}

impl LineItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

/// A recorded sale.
///
/// Immutable except for returns, which reduce line quantities and the
/// total in place and may set the terminal `is_return` flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,

    /// Human-facing sequential number from the sequence generator.
    #[serde(rename = "saleId")]
    pub sale_number: i64,

    pub employee_id: String,

    pub items: Vec<LineItem>,

    #[serde(rename = "total", with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub total_cents: i64,

    /// Set once every line has been fully returned.
    pub is_return: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Σ(line price × line quantity) over the current line state.
    pub fn line_sum(&self) -> Money {
        self.items.iter().map(LineItem::line_total).sum()
    }
}

// =============================================================================
// Cart Atomicity
// =============================================================================

/// How stock mutations within one sale or return request are committed.
///
/// ```text
/// AllOrNothing:  [dec A]─[dec B]─[dec C ✗] ──► rollback: A, B restored
/// PerItem:       [dec A ✓]─[dec B ✓]─[dec C ✗] ──► A, B stay decremented
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CartAtomicity {
    /// One transaction per request.
    #[default]
    AllOrNothing,
    /// Every stock mutation commits on its own.
    PerItem,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(quantity: i64, low: i64, over: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "p-1".to_string(),
            name: "Pen".to_string(),
            price_cents: 1000,
            barcode: "P1".to_string(),
            quantity,
            low_stock_threshold: low,
            overstock_threshold: over,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_product_stock_predicates() {
        let p = product(2, 2, 20);
        assert!(p.is_low_stock());
        assert!(!p.is_out_of_stock());
        assert!(p.can_sell(2));
        assert!(!p.can_sell(3));

        let empty = product(0, 2, 20);
        assert!(empty.is_out_of_stock());
        assert!(!empty.is_low_stock());
    }

    #[test]
    fn test_product_serializes_decimal_price() {
        let json = serde_json::to_value(product(5, 2, 20)).unwrap();
        assert_eq!(json["price"], serde_json::json!(10.0));
        assert_eq!(json["lowStockThreshold"], 2);
        assert!(json.get("priceCents").is_none());
    }

    #[test]
    fn test_payment_method_labels() {
        assert_eq!(PaymentMethod::default(), PaymentMethod::Cash);
        assert_eq!(
            "Digital Wallet".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::DigitalWallet
        );
        assert!("Cheque".parse::<PaymentMethod>().is_err());

        let json = serde_json::to_string(&PaymentMethod::DigitalWallet).unwrap();
        assert_eq!(json, "\"Digital Wallet\"");
    }

    #[test]
    fn test_caller_visibility() {
        let admin = Caller::new("a-1", Role::Admin);
        let clerk = Caller::new("e-1", Role::Employee);

        assert!(admin.can_view_employee("e-1"));
        assert!(clerk.can_view_employee("e-1"));
        assert!(!clerk.can_view_employee("e-2"));
    }

    #[test]
    fn test_sale_line_sum() {
        let now = Utc::now();
        let sale = Sale {
            id: "s-1".to_string(),
            sale_number: 1,
            employee_id: "e-1".to_string(),
            items: vec![
                LineItem {
                    product_id: "p-1".to_string(),
                    quantity: 2,
                    unit_price_cents: 1000,
                },
                LineItem {
                    product_id: "p-2".to_string(),
                    quantity: 1,
                    unit_price_cents: 250,
                },
            ],
            total_cents: 2250,
            is_return: false,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(sale.line_sum(), sale.total());

        let json = serde_json::to_value(&sale).unwrap();
        assert_eq!(json["saleId"], 1);
        assert_eq!(json["total"], serde_json::json!(22.5));
    }
}
