//! # Inventory Ledger
//!
//! The on-hand quantity of every product, and the only code allowed to move
//! it. All functions take a live connection so the caller decides whether a
//! change is part of a larger transaction.
//!
//! ## Stock Movement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  decrement_stock(conn, id, 3)                                          │
//! │                                                                         │
//! │  UPDATE products                                                       │
//! │     SET quantity = quantity - 3                                        │
//! │   WHERE id = ?  AND quantity >= 3      ← check and write are one stmt  │
//! │  RETURNING quantity                                                    │
//! │       │                                                                 │
//! │       ├── row returned  → Decrement::Applied { remaining }             │
//! │       └── no row        → re-read: Missing or Insufficient { avail }   │
//! │                                                                         │
//! │  Two checkouts racing for the last unit: SQLite serializes the two    │
//! │  UPDATEs, the second one matches zero rows. Stock never goes below 0.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::lookup::ProductLookup;
use stockroom_core::Product;

/// Column list matching `Product`'s `FromRow` field order.
pub(crate) const PRODUCT_COLUMNS: &str = "id, name, price_cents, barcode, quantity, \
     low_stock_threshold, overstock_threshold, created_at, updated_at";

/// Outcome of a conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decrement {
    /// Stock was taken; `remaining` is the new on-hand quantity.
    Applied { remaining: i64 },
    /// Nothing changed; only `available` units were on hand.
    Insufficient { available: i64 },
    /// The product does not exist.
    Missing,
}

/// Reads one product by id.
pub async fn get_product(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    find_product(conn, &ProductLookup::ById(id.to_string())).await
}

/// Runs a single lookup. A name match returns the oldest product with that
/// name.
pub async fn find_product(
    conn: &mut SqliteConnection,
    lookup: &ProductLookup,
) -> DbResult<Option<Product>> {
    let sql = format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE {} = ?1 ORDER BY created_at, id LIMIT 1",
        lookup.column()
    );

    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(lookup.value())
        .fetch_optional(&mut *conn)
        .await?;

    Ok(product)
}

/// Tries each lookup in order and returns the first hit.
pub async fn resolve_product(
    conn: &mut SqliteConnection,
    plan: &[ProductLookup],
) -> DbResult<Option<Product>> {
    for lookup in plan {
        if let Some(product) = find_product(conn, lookup).await? {
            debug!(%lookup, product_id = %product.id, "Product resolved");
            return Ok(Some(product));
        }
    }
    Ok(None)
}

/// Takes `quantity` units if and only if at least that many are on hand.
pub async fn decrement_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
) -> DbResult<Decrement> {
    let remaining: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE products
           SET quantity = quantity - ?2, updated_at = ?3
         WHERE id = ?1 AND quantity >= ?2
        RETURNING quantity
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(remaining) = remaining {
        debug!(product_id = %product_id, quantity, remaining, "Stock decremented");
        return Ok(Decrement::Applied { remaining });
    }

    Ok(match get_product(conn, product_id).await? {
        Some(product) => Decrement::Insufficient {
            available: product.quantity,
        },
        None => Decrement::Missing,
    })
}

/// Puts `quantity` units back. Returns the new on-hand quantity.
pub async fn increment_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
) -> DbResult<i64> {
    let updated: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE products
           SET quantity = quantity + ?2, updated_at = ?3
         WHERE id = ?1
        RETURNING quantity
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    let updated = updated.ok_or_else(|| DbError::not_found("Product", product_id))?;
    debug!(product_id = %product_id, quantity, updated, "Stock incremented");
    Ok(updated)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{product, test_db};
    use stockroom_core::lookup::product_plan;

    #[tokio::test]
    async fn test_decrement_applies_when_stock_suffices() {
        let db = test_db().await;
        db.products().insert(&product("pen", "Pen", "P1", 10)).await.unwrap();
        let mut conn = db.acquire().await.unwrap();

        let outcome = decrement_stock(&mut conn, "pen", 3).await.unwrap();
        assert_eq!(outcome, Decrement::Applied { remaining: 7 });

        let outcome = decrement_stock(&mut conn, "pen", 7).await.unwrap();
        assert_eq!(outcome, Decrement::Applied { remaining: 0 });
    }

    #[tokio::test]
    async fn test_decrement_refuses_to_go_negative() {
        let db = test_db().await;
        db.products().insert(&product("pen", "Pen", "P1", 2)).await.unwrap();
        let mut conn = db.acquire().await.unwrap();

        let outcome = decrement_stock(&mut conn, "pen", 3).await.unwrap();
        assert_eq!(outcome, Decrement::Insufficient { available: 2 });

        let pen = get_product(&mut conn, "pen").await.unwrap().unwrap();
        assert_eq!(pen.quantity, 2);
    }

    #[tokio::test]
    async fn test_decrement_missing_product() {
        let db = test_db().await;
        let mut conn = db.acquire().await.unwrap();

        let outcome = decrement_stock(&mut conn, "ghost", 1).await.unwrap();
        assert_eq!(outcome, Decrement::Missing);
    }

    #[tokio::test]
    async fn test_increment_and_missing() {
        let db = test_db().await;
        db.products().insert(&product("pen", "Pen", "P1", 0)).await.unwrap();
        let mut conn = db.acquire().await.unwrap();

        assert_eq!(increment_stock(&mut conn, "pen", 4).await.unwrap(), 4);
        assert!(matches!(
            increment_stock(&mut conn, "ghost", 1).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_resolve_by_id_then_barcode_then_name() {
        let db = test_db().await;
        db.products().insert(&product("pen", "Pen", "P1", 1)).await.unwrap();
        let mut conn = db.acquire().await.unwrap();

        for key in ["pen", "P1", "Pen"] {
            let hit = resolve_product(&mut conn, &product_plan(key)).await.unwrap();
            assert_eq!(hit.map(|p| p.id), Some("pen".to_string()), "key {key}");
        }

        assert!(resolve_product(&mut conn, &product_plan("nothing"))
            .await
            .unwrap()
            .is_none());
        assert!(resolve_product(&mut conn, &[]).await.unwrap().is_none());
    }
}
