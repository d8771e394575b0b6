//! Return processor.
//!
//! Resolves the sale and each returned product through their lookup plans,
//! puts stock back and rewrites the sale's remaining quantities and total.
//! The sale row itself is written once, after every line has been applied.

use chrono::Utc;
use serde::{Deserialize, Deserializer};
use sqlx::SqliteConnection;
use stockroom_core::lookup::{product_plan, sale_plan};
use stockroom_core::returns::{validate_return_lines, ReturnLine, ReturnOutcome};
use stockroom_core::{CartAtomicity, Caller, CoreError};
use stockroom_db::ledger::{increment_stock, resolve_product};
use stockroom_db::repository::sale::{resolve_sale, save_return_state};
use stockroom_db::{Database, DbError};
use tracing::{debug, info};

use crate::error::ApiResult;

/// Body of `POST /api/sales/return`. `saleId` may be the internal id or
/// the sale number, the latter as a string or a JSON number.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    #[serde(deserialize_with = "sale_key")]
    pub sale_id: String,
    #[serde(default)]
    pub return_items: Vec<ReturnLine>,
}

fn sale_key<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SaleKey {
        Number(i64),
        Text(String),
    }

    Ok(match SaleKey::deserialize(deserializer)? {
        SaleKey::Number(n) => n.to_string(),
        SaleKey::Text(key) => key,
    })
}

#[derive(Clone)]
pub struct ReturnService {
    db: Database,
    atomicity: CartAtomicity,
}

impl ReturnService {
    pub fn new(db: Database, atomicity: CartAtomicity) -> Self {
        ReturnService { db, atomicity }
    }

    /// Applies a return request.
    ///
    /// ## Errors
    /// * `NOT_FOUND` - the sale or a product does not resolve
    /// * `VALIDATION_ERROR` - no lines, or a non-positive quantity
    /// * `EXCESSIVE_RETURN` - more than remains sold on the line
    pub async fn process_return(
        &self,
        caller: &Caller,
        request: ReturnRequest,
    ) -> ApiResult<ReturnOutcome> {
        debug!(caller = %caller.employee_id, sale_key = %request.sale_id, "Processing return");

        let outcome = match self.atomicity {
            CartAtomicity::AllOrNothing => {
                let mut tx = self.db.begin().await?;
                let outcome = apply_return(&mut *tx, &request).await?;
                tx.commit().await.map_err(DbError::from)?;
                outcome
            }
            CartAtomicity::PerItem => {
                let mut conn = self.db.acquire().await?;
                apply_return(&mut *conn, &request).await?
            }
        };

        info!(
            sale_id = %outcome.sale_id,
            lines = request.return_items.len(),
            all_returned = outcome.all_returned,
            "Return processed"
        );
        Ok(outcome)
    }
}

async fn apply_return(conn: &mut SqliteConnection, request: &ReturnRequest) -> ApiResult<ReturnOutcome> {
    let mut sale = resolve_sale(conn, &sale_plan(&request.sale_id))
        .await?
        .ok_or_else(|| CoreError::SaleNotFound(request.sale_id.clone()))?;

    validate_return_lines(&request.return_items)?;

    for line in &request.return_items {
        let product = resolve_product(conn, &product_plan(&line.product))
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(line.product.clone()))?;

        let refund = sale.take_return(&product, line.quantity)?;
        increment_stock(conn, &product.id, line.quantity).await?;

        debug!(product_id = %product.id, quantity = line.quantity, refund = %refund, "Return line applied");
    }

    let all_returned = sale.settle_returns(Utc::now());
    save_return_state(conn, &sale).await?;

    Ok(ReturnOutcome::new(sale.id, all_returned))
}
