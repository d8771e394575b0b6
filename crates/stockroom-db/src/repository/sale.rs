//! # Sale Repository
//!
//! Sales and their line items. Writes that belong to a checkout or a return
//! are free functions over a connection so they join the caller's
//! transaction; reads for reports go through [`SaleRepository`].
//!
//! ## Storage
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sales                         sale_items                              │
//! │  ┌──────────────────────┐      ┌──────────────────────────────────┐    │
//! │  │ id (uuid)            │◄─────│ sale_id                          │    │
//! │  │ sale_number (unique) │      │ position   (line order)          │    │
//! │  │ employee_id          │      │ product_id (no FK: may dangle)   │    │
//! │  │ total_cents          │      │ quantity   (reduced by returns)  │    │
//! │  │ is_return            │      │ unit_price_cents (frozen)        │    │
//! │  │ created_at           │      └──────────────────────────────────┘    │
//! │  │ updated_at           │                                              │
//! │  └──────────────────────┘                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Month windows compare the stored RFC 3339 text, which sorts the same way
//! as the instants it encodes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{Connection, FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::lookup::SaleLookup;
use stockroom_core::report::SalesTotals;
use stockroom_core::window::MonthWindow;
use stockroom_core::{LineItem, Sale};

const SALE_COLUMNS: &str =
    "id, sale_number, employee_id, total_cents, is_return, created_at, updated_at";

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, FromRow)]
struct SaleRow {
    id: String,
    sale_number: i64,
    employee_id: String,
    total_cents: i64,
    is_return: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct LineItemRow {
    sale_id: String,
    product_id: String,
    quantity: i64,
    unit_price_cents: i64,
}

impl SaleRow {
    fn into_sale(self, items: Vec<LineItem>) -> Sale {
        Sale {
            id: self.id,
            sale_number: self.sale_number,
            employee_id: self.employee_id,
            items,
            total_cents: self.total_cents,
            is_return: self.is_return,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Groups line rows (ordered by position) under their sales, keeping the
/// order of `rows`.
fn assemble(rows: Vec<SaleRow>, lines: Vec<LineItemRow>) -> Vec<Sale> {
    let mut by_sale: HashMap<String, Vec<LineItem>> = HashMap::new();
    for line in lines {
        by_sale.entry(line.sale_id).or_default().push(LineItem {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price_cents: line.unit_price_cents,
        });
    }

    rows.into_iter()
        .map(|row| {
            let items = by_sale.remove(&row.id).unwrap_or_default();
            row.into_sale(items)
        })
        .collect()
}

// =============================================================================
// Transactional Writes
// =============================================================================

/// Inserts a sale and all of its lines, or nothing.
///
/// ## Errors
/// * `DbError::UniqueViolation` - sale number already used
pub async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, sale_number = sale.sale_number, lines = sale.items.len(), "Inserting sale");

    let mut tx = conn.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO sales (id, sale_number, employee_id, total_cents, is_return, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&sale.id)
    .bind(sale.sale_number)
    .bind(&sale.employee_id)
    .bind(sale.total_cents)
    .bind(sale.is_return)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .execute(&mut *tx)
    .await
    .map_err(|e| DbError::from(e).with_duplicate_value(&sale.sale_number.to_string()))?;

    for (position, line) in sale.items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO sale_items (sale_id, position, product_id, quantity, unit_price_cents)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&sale.id)
        .bind(position as i64)
        .bind(&line.product_id)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Writes back line quantities, total, return flag and `updated_at` after
/// returns were taken against `sale`.
pub async fn save_return_state(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, total_cents = sale.total_cents, is_return = sale.is_return, "Saving return state");

    let mut tx = conn.begin().await?;

    let result = sqlx::query(
        "UPDATE sales SET total_cents = ?2, is_return = ?3, updated_at = ?4 WHERE id = ?1",
    )
    .bind(&sale.id)
    .bind(sale.total_cents)
    .bind(sale.is_return)
    .bind(sale.updated_at)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Sale", &sale.id));
    }

    for (position, line) in sale.items.iter().enumerate() {
        sqlx::query("UPDATE sale_items SET quantity = ?3 WHERE sale_id = ?1 AND position = ?2")
            .bind(&sale.id)
            .bind(position as i64)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Runs a single sale lookup.
pub async fn find_sale(conn: &mut SqliteConnection, lookup: &SaleLookup) -> DbResult<Option<Sale>> {
    let row = match lookup {
        SaleLookup::ById(id) => {
            let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");
            sqlx::query_as::<_, SaleRow>(&sql)
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?
        }
        SaleLookup::BySaleNumber(number) => {
            let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE sale_number = ?1");
            sqlx::query_as::<_, SaleRow>(&sql)
                .bind(number)
                .fetch_optional(&mut *conn)
                .await?
        }
    };

    let Some(row) = row else {
        return Ok(None);
    };

    let lines = sqlx::query_as::<_, LineItemRow>(
        r#"
        SELECT sale_id, product_id, quantity, unit_price_cents
        FROM sale_items WHERE sale_id = ?1 ORDER BY position
        "#,
    )
    .bind(&row.id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(assemble(vec![row], lines).pop())
}

/// Tries each lookup in order and returns the first hit.
pub async fn resolve_sale(conn: &mut SqliteConnection, plan: &[SaleLookup]) -> DbResult<Option<Sale>> {
    for lookup in plan {
        if let Some(sale) = find_sale(conn, lookup).await? {
            debug!(%lookup, sale_id = %sale.id, "Sale resolved");
            return Ok(Some(sale));
        }
    }
    Ok(None)
}

// =============================================================================
// Repository
// =============================================================================

/// Pool-level sale reads.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        find_sale(&mut conn, &SaleLookup::ById(id.to_string())).await
    }

    /// See [`resolve_sale`].
    pub async fn resolve(&self, plan: &[SaleLookup]) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        resolve_sale(&mut conn, plan).await
    }

    /// Inserts a complete sale outside of a checkout. Used to load history.
    pub async fn insert(&self, sale: &Sale) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert_sale(&mut conn, sale).await
    }

    /// Sales created within `window`, oldest first.
    pub async fn list_in_window(&self, window: &MonthWindow) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE created_at >= ?1 AND created_at < ?2 \
             ORDER BY created_at, sale_number"
        );
        let rows = sqlx::query_as::<_, SaleRow>(&sql)
            .bind(window.start())
            .bind(window.end())
            .fetch_all(&self.pool)
            .await?;

        let lines = sqlx::query_as::<_, LineItemRow>(
            r#"
            SELECT si.sale_id, si.product_id, si.quantity, si.unit_price_cents
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            WHERE s.created_at >= ?1 AND s.created_at < ?2
            ORDER BY si.sale_id, si.position
            "#,
        )
        .bind(window.start())
        .bind(window.end())
        .fetch_all(&self.pool)
        .await?;

        debug!(window = %window.label(), sales = rows.len(), "Listed sales in window");
        Ok(assemble(rows, lines))
    }

    /// Sales rung up by one employee, newest first, optionally limited to
    /// a month.
    pub async fn list_for_employee(
        &self,
        employee_id: &str,
        window: Option<&MonthWindow>,
    ) -> DbResult<Vec<Sale>> {
        let start = window.map(MonthWindow::start);
        let end = window.map(MonthWindow::end);

        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE employee_id = ?1 \
               AND (?2 IS NULL OR created_at >= ?2) \
               AND (?3 IS NULL OR created_at < ?3) \
             ORDER BY created_at DESC, sale_number DESC"
        );
        let rows = sqlx::query_as::<_, SaleRow>(&sql)
            .bind(employee_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;

        let lines = sqlx::query_as::<_, LineItemRow>(
            r#"
            SELECT si.sale_id, si.product_id, si.quantity, si.unit_price_cents
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            WHERE s.employee_id = ?1
              AND (?2 IS NULL OR s.created_at >= ?2)
              AND (?3 IS NULL OR s.created_at < ?3)
            ORDER BY si.sale_id, si.position
            "#,
        )
        .bind(employee_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(assemble(rows, lines))
    }

    /// Revenue and count over every recorded sale.
    pub async fn totals(&self) -> DbResult<SalesTotals> {
        let (revenue, count): (i64, i64) =
            sqlx::query_as("SELECT COALESCE(SUM(total_cents), 0), COUNT(*) FROM sales")
                .fetch_one(&self.pool)
                .await?;

        Ok(SalesTotals {
            total_revenue_cents: revenue,
            total_sales_count: count,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{at, sale, test_db};
    use stockroom_core::lookup::sale_plan;

    #[tokio::test]
    async fn test_insert_and_resolve() {
        let db = test_db().await;
        let s = sale("s-1", 7, "e-1", at(2026, 3, 2), &[("pen", 2, 1000), ("pad", 1, 250)]);
        db.sales().insert(&s).await.unwrap();

        let by_id = db.sales().resolve(&sale_plan("s-1")).await.unwrap().unwrap();
        assert_eq!(by_id, s);

        let by_number = db.sales().resolve(&sale_plan(" 7 ")).await.unwrap().unwrap();
        assert_eq!(by_number.id, "s-1");
        assert_eq!(by_number.items[1].product_id, "pad");

        assert!(db.sales().resolve(&sale_plan("8")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_sale_number_inserts_nothing() {
        let db = test_db().await;
        db.sales()
            .insert(&sale("s-1", 1, "e-1", at(2026, 3, 2), &[("pen", 1, 100)]))
            .await
            .unwrap();

        let err = db
            .sales()
            .insert(&sale("s-2", 1, "e-1", at(2026, 3, 2), &[("pen", 1, 100)]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert!(db.sales().get_by_id("s-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_return_state() {
        let db = test_db().await;
        let mut s = sale("s-1", 1, "e-1", at(2026, 3, 2), &[("pen", 2, 1000)]);
        db.sales().insert(&s).await.unwrap();

        s.items[0].quantity = 0;
        s.total_cents = 0;
        s.is_return = true;
        s.updated_at = at(2026, 3, 3);

        let mut conn = db.acquire().await.unwrap();
        save_return_state(&mut conn, &s).await.unwrap();
        drop(conn);

        let stored = db.sales().get_by_id("s-1").await.unwrap().unwrap();
        assert_eq!(stored.items[0].quantity, 0);
        assert!(stored.is_return);
        assert_eq!(stored.updated_at, at(2026, 3, 3));
    }

    #[tokio::test]
    async fn test_window_is_half_open() {
        let db = test_db().await;
        let repo = db.sales();
        repo.insert(&sale("feb", 1, "e-1", at(2026, 2, 28), &[("pen", 1, 100)]))
            .await
            .unwrap();
        repo.insert(&sale("mar-start", 2, "e-1", at(2026, 3, 1), &[("pen", 1, 100)]))
            .await
            .unwrap();
        repo.insert(&sale("apr-start", 3, "e-1", at(2026, 4, 1), &[("pen", 1, 100)]))
            .await
            .unwrap();

        let window = MonthWindow::new(2026, 3).unwrap();
        let ids: Vec<String> = repo
            .list_in_window(&window)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["mar-start"]);
    }

    #[tokio::test]
    async fn test_list_for_employee_and_totals() {
        let db = test_db().await;
        let repo = db.sales();
        repo.insert(&sale("a", 1, "e-1", at(2026, 3, 2), &[("pen", 1, 1000)]))
            .await
            .unwrap();
        repo.insert(&sale("b", 2, "e-1", at(2026, 4, 2), &[("pen", 2, 1000)]))
            .await
            .unwrap();
        repo.insert(&sale("c", 3, "e-2", at(2026, 3, 5), &[("pen", 1, 500)]))
            .await
            .unwrap();

        let all: Vec<String> = repo
            .list_for_employee("e-1", None)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(all, vec!["b", "a"]);

        let march = MonthWindow::new(2026, 3).unwrap();
        let in_march = repo.list_for_employee("e-1", Some(&march)).await.unwrap();
        assert_eq!(in_march.len(), 1);
        assert_eq!(in_march[0].items[0].quantity, 1);

        let totals = repo.totals().await.unwrap();
        assert_eq!(totals.total_sales_count, 3);
        assert_eq!(totals.total_revenue_cents, 3500);
    }
}
