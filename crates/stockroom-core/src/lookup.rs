//! # Lookup Plans
//!
//! Returns and bill requests reference products and sales loosely: a
//! product may be named by id, barcode or display name, a sale by its
//! internal id or its human-facing number. Instead of guessing from the
//! shape of the key, each key is expanded into an explicit, ordered list
//! of lookups. The storage layer runs them in order and stops at the
//! first hit.
//!
//! ```text
//!   product key "P1"                 sale key "42"
//!        │                                │
//!        ▼                                ▼
//!   1. ById("P1")        ─ miss       1. ById("42")          ─ miss
//!   2. ByBarcode("P1")   ─ HIT ✓      2. BySaleNumber(42)    ─ HIT ✓
//!   3. ByName("P1")      (skipped)
//! ```

use std::fmt;

/// One way of finding a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductLookup {
    ById(String),
    ByBarcode(String),
    ByName(String),
}

impl ProductLookup {
    /// Column the lookup matches on.
    pub fn column(&self) -> &'static str {
        match self {
            ProductLookup::ById(_) => "id",
            ProductLookup::ByBarcode(_) => "barcode",
            ProductLookup::ByName(_) => "name",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            ProductLookup::ById(v) | ProductLookup::ByBarcode(v) | ProductLookup::ByName(v) => v,
        }
    }
}

impl fmt::Display for ProductLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.column(), self.value())
    }
}

/// One way of finding a sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaleLookup {
    ById(String),
    BySaleNumber(i64),
}

impl fmt::Display for SaleLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaleLookup::ById(id) => write!(f, "id={id}"),
            SaleLookup::BySaleNumber(n) => write!(f, "sale_number={n}"),
        }
    }
}

/// Id, then barcode, then exact name.
///
/// ## Example
/// ```rust
/// use stockroom_core::lookup::{product_plan, ProductLookup};
///
/// let plan = product_plan("Pen");
/// assert_eq!(plan[0], ProductLookup::ById("Pen".into()));
/// assert_eq!(plan[2], ProductLookup::ByName("Pen".into()));
/// ```
pub fn product_plan(key: &str) -> Vec<ProductLookup> {
    if key.is_empty() {
        return Vec::new();
    }
    vec![
        ProductLookup::ById(key.to_string()),
        ProductLookup::ByBarcode(key.to_string()),
        ProductLookup::ByName(key.to_string()),
    ]
}

/// Product lookup used by the sale path: exact id only.
pub fn product_by_id(id: &str) -> Vec<ProductLookup> {
    if id.is_empty() {
        return Vec::new();
    }
    vec![ProductLookup::ById(id.to_string())]
}

/// Internal id, then sale number when the key is an integer.
pub fn sale_plan(key: &str) -> Vec<SaleLookup> {
    let key = key.trim();
    if key.is_empty() {
        return Vec::new();
    }

    let mut plan = vec![SaleLookup::ById(key.to_string())];
    if let Ok(number) = key.parse::<i64>() {
        plan.push(SaleLookup::BySaleNumber(number));
    }
    plan
}

// =============================================================================
// Unit Tests
// =============================================================================
