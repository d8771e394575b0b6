//! # Validation Module
//!
//! Input validation for catalog edits, carts, returns and report periods.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractors (axum)                                       │
//! │  └── Type validation (JSON / query deserialization)                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Business rule validation (non-empty, ranges, signs)               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity >= 0)                                             │
//! │  └── UNIQUE (barcode), UNIQUE (sale_number)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Largest accepted unit price, in cents (1,000,000,000.00).
pub const MAX_PRICE_CENTS: i64 = 100_000_000_000;

/// Largest accepted stock level, threshold or line quantity.
///
/// `MAX_PRICE_CENTS * MAX_QUANTITY` stays below `i64::MAX`, so no line
/// total of a valid product can overflow.
pub const MAX_QUANTITY: i64 = 10_000_000;

const MAX_NAME_LEN: usize = 200;
const MAX_BARCODE_LEN: usize = 64;
const MAX_CUSTOMER_INFO_LEN: usize = 500;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Pen").is_ok());
/// assert!(validate_product_name("   ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_text("name", name, MAX_NAME_LEN)
}

/// Validates a barcode. Any non-blank string is accepted; uniqueness is
/// enforced by the database.
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    validate_text("barcode", barcode, MAX_BARCODE_LEN)
}

/// Normalizes optional customer info, falling back to `"N/A"` when blank.
pub fn normalize_customer_info(info: Option<&str>) -> ValidationResult<String> {
    match info.map(str::trim) {
        None | Some("") => Ok(crate::DEFAULT_CUSTOMER_INFO.to_string()),
        Some(text) if text.chars().count() > MAX_CUSTOMER_INFO_LEN => {
            Err(ValidationError::TooLong {
                field: "customerInfo".to_string(),
                max: MAX_CUSTOMER_INFO_LEN,
            })
        }
        Some(text) => Ok(text.to_string()),
    }
}

fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity being sold or returned.
///
/// ## User Workflow
/// ```text
/// Return line: { product: "P1", quantity: 0 }
///       │
///       ▼
/// validate_line_quantity(0) ← THIS FUNCTION
///       │
///       └── qty <= 0? → Error: "quantity must be positive"
/// ```
pub fn validate_line_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    validate_at_most("quantity", qty, MAX_QUANTITY)
}

/// Validates a price in cents. Zero is allowed (free items).
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(i64::MAX).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    validate_non_negative("price", cents)?;
    validate_at_most("price", cents, MAX_PRICE_CENTS)
}

/// Validates a stock level or threshold: `0..=MAX_QUANTITY`.
pub fn validate_stock_level(field: &str, value: i64) -> ValidationResult<()> {
    validate_non_negative(field, value)?;
    validate_at_most(field, value, MAX_QUANTITY)
}

fn validate_at_most(field: &str, value: i64, max: i64) -> ValidationResult<()> {
    if value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max,
        });
    }

    Ok(())
}

/// Rejects negative values.
pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Converts a decimal price from an API payload into cents.
pub fn parse_price(value: f64) -> ValidationResult<i64> {
    let cents = crate::Money::from_decimal(value)
        .ok_or_else(|| ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason: "must be a finite number".to_string(),
        })?
        .cents();
    validate_price_cents(cents)?;
    Ok(cents)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Pen").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_barcode() {
        assert!(validate_barcode("P1").is_ok());
        assert!(matches!(
            validate_barcode("  "),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_validate_line_quantity() {
        assert!(validate_line_quantity(1).is_ok());
        assert!(validate_line_quantity(0).is_err());
        assert!(validate_line_quantity(-3).is_err());
        assert!(validate_line_quantity(MAX_QUANTITY).is_ok());
        assert!(matches!(
            validate_line_quantity(MAX_QUANTITY + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_bounds_keep_line_totals_in_range() {
        assert!(MAX_PRICE_CENTS.checked_mul(MAX_QUANTITY).is_some());

        assert!(validate_stock_level("quantity", MAX_QUANTITY).is_ok());
        assert!(validate_stock_level("quantity", MAX_QUANTITY + 1).is_err());
        assert!(validate_stock_level("quantity", -1).is_err());
    }

    #[test]
    fn test_customer_info_defaults() {
        assert_eq!(normalize_customer_info(None).unwrap(), "N/A");
        assert_eq!(normalize_customer_info(Some("  ")).unwrap(), "N/A");
        assert_eq!(
            normalize_customer_info(Some(" Ali, 0300-1234567 ")).unwrap(),
            "Ali, 0300-1234567"
        );
        assert!(normalize_customer_info(Some(&"x".repeat(600))).is_err());
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price(10.0).unwrap(), 1000);
        assert_eq!(parse_price(0.0).unwrap(), 0);
        assert!(parse_price(-1.0).is_err());
        assert!(parse_price(f64::NAN).is_err());
        assert_eq!(parse_price(1_000_000_000.0).unwrap(), MAX_PRICE_CENTS);
        assert!(matches!(
            parse_price(5.0e16),
            Err(ValidationError::OutOfRange { .. })
        ));
    }
}
