//! # Bill Repository
//!
//! Bills are write-once. The structured receipt snapshot is stored as JSON
//! in `content`; customer info and payment method are also kept as columns
//! so they can be filtered without parsing.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::receipt::{Bill, BillContent};
use stockroom_core::PaymentMethod;

#[derive(Debug, FromRow)]
struct BillRow {
    id: String,
    sale_id: String,
    customer_info: String,
    payment_method: PaymentMethod,
    content: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<BillRow> for Bill {
    type Error = DbError;

    fn try_from(row: BillRow) -> DbResult<Self> {
        let content: BillContent = serde_json::from_str(&row.content)
            .map_err(|e| DbError::Corrupt(format!("bill {}: {e}", row.id)))?;

        Ok(Bill {
            id: row.id,
            sale_id: row.sale_id,
            customer_info: row.customer_info,
            payment_method: row.payment_method,
            content,
            created_at: row.created_at,
        })
    }
}

fn into_bills(rows: Vec<BillRow>) -> DbResult<Vec<Bill>> {
    rows.into_iter().map(Bill::try_from).collect()
}

#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: SqlitePool,
}

impl BillRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BillRepository { pool }
    }

    /// ## Errors
    /// * `DbError::ForeignKeyViolation` - the sale does not exist
    pub async fn insert(&self, bill: &Bill) -> DbResult<()> {
        debug!(id = %bill.id, sale_id = %bill.sale_id, "Inserting bill");

        let content = serde_json::to_string(&bill.content)
            .map_err(|e| DbError::Internal(format!("serializing bill content: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO bills (id, sale_id, customer_info, payment_method, content, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&bill.id)
        .bind(&bill.sale_id)
        .bind(&bill.customer_info)
        .bind(bill.payment_method)
        .bind(content)
        .bind(bill.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Bill>> {
        let row = sqlx::query_as::<_, BillRow>(
            "SELECT id, sale_id, customer_info, payment_method, content, created_at FROM bills WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Bill::try_from).transpose()
    }

    /// Every bill issued for a sale, oldest first.
    pub async fn list_for_sale(&self, sale_id: &str) -> DbResult<Vec<Bill>> {
        let rows = sqlx::query_as::<_, BillRow>(
            r#"
            SELECT id, sale_id, customer_info, payment_method, content, created_at
            FROM bills WHERE sale_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        into_bills(rows)
    }

    /// Bills for sales rung up by `employee_id`, newest first.
    pub async fn list_for_employee(&self, employee_id: &str) -> DbResult<Vec<Bill>> {
        let rows = sqlx::query_as::<_, BillRow>(
            r#"
            SELECT b.id, b.sale_id, b.customer_info, b.payment_method, b.content, b.created_at
            FROM bills b
            JOIN sales s ON s.id = b.sale_id
            WHERE s.employee_id = ?1
            ORDER BY b.created_at DESC, b.id
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        into_bills(rows)
    }
}
