//! Fixtures shared by this crate's unit tests.

use chrono::{DateTime, TimeZone, Utc};
use stockroom_core::{Employee, LineItem, Product, Role, Sale};

use crate::{Database, DbConfig};

pub async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// Midnight UTC on the given day.
pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// A 10.00 product with thresholds 10 / 100.
pub fn product(id: &str, name: &str, barcode: &str, quantity: i64) -> Product {
    let now = at(2026, 1, 1);
    Product {
        id: id.to_string(),
        name: name.to_string(),
        price_cents: 1000,
        barcode: barcode.to_string(),
        quantity,
        low_stock_threshold: 10,
        overstock_threshold: 100,
        created_at: now,
        updated_at: now,
    }
}

pub fn employee(id: &str, username: &str, role: Role) -> Employee {
    Employee {
        id: id.to_string(),
        name: username.to_string(),
        username: username.to_string(),
        role,
        created_at: at(2026, 1, 1),
    }
}

/// `lines` are `(product_id, quantity, unit_price_cents)`.
pub fn sale(
    id: &str,
    sale_number: i64,
    employee_id: &str,
    created_at: DateTime<Utc>,
    lines: &[(&str, i64, i64)],
) -> Sale {
    let items: Vec<LineItem> = lines
        .iter()
        .map(|(product_id, quantity, unit_price_cents)| LineItem {
            product_id: product_id.to_string(),
            quantity: *quantity,
            unit_price_cents: *unit_price_cents,
        })
        .collect();
    let total_cents = items.iter().map(|l| l.quantity * l.unit_price_cents).sum();

    Sale {
        id: id.to_string(),
        sale_number,
        employee_id: employee_id.to_string(),
        items,
        total_cents,
        is_return: false,
        created_at,
        updated_at: created_at,
    }
}
