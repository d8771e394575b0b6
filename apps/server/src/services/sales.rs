//! # Sale Recorder
//!
//! Records a checkout: stock comes off the ledger line by line, the sale is
//! stored with frozen prices under a fresh sale number, then a bill is
//! issued.
//!
//! ## Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  AllOrNothing                        PerItem                            │
//! │  ────────────                        ───────                            │
//! │  BEGIN                               (autocommit connection)            │
//! │   line 1: decrement ✓                 line 1: decrement ✓ (committed)   │
//! │   line 2: decrement ✗                 line 2: decrement ✗               │
//! │  ROLLBACK → line 1 restored          error → line 1 stays decremented   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The bill is issued after the sale commits. A failed bill never undoes
//! the sale.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use stockroom_core::checkout::{validate_cart, CartLine, SaleDraft};
use stockroom_core::receipt::Bill;
use stockroom_core::validation::normalize_customer_info;
use stockroom_core::view::SaleView;
use stockroom_core::{CartAtomicity, Caller, CoreError, PaymentMethod, Sale, SALE_SEQUENCE_KEY};
use stockroom_db::ledger::{decrement_stock, get_product};
use stockroom_db::repository::sale::insert_sale;
use stockroom_db::repository::sequence::next_value;
use stockroom_db::{Database, DbError, Decrement};
use tracing::{info, warn};
use uuid::Uuid;

use super::bills::BillService;
use super::sale_views;
use crate::error::ApiResult;

/// Body of `POST /api/sales`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    #[serde(default)]
    pub items: Vec<CartLine>,
    pub customer_info: Option<String>,
    pub payment_method: Option<PaymentMethod>,
}

/// A recorded sale with its display fields and the bill issued for it.
#[derive(Debug, Clone, Serialize)]
pub struct SaleReceipt {
    pub sale: SaleView,
    pub bill: Option<Bill>,
}

#[derive(Clone)]
pub struct SaleService {
    db: Database,
    atomicity: CartAtomicity,
    bills: BillService,
}

impl SaleService {
    pub fn new(db: Database, atomicity: CartAtomicity, currency: impl Into<String>) -> Self {
        SaleService {
            bills: BillService::new(db.clone(), currency),
            db,
            atomicity,
        }
    }

    /// Records a sale for the caller and issues its bill.
    ///
    /// ## Errors
    /// * `VALIDATION_ERROR` - empty cart or a non-positive quantity
    /// * `NOT_FOUND` - a product id does not resolve
    /// * `INSUFFICIENT_STOCK` - a line asks for more than is on hand
    pub async fn create_sale(
        &self,
        caller: &Caller,
        request: CreateSaleRequest,
    ) -> ApiResult<SaleReceipt> {
        validate_cart(&request.items)?;
        let customer_info = normalize_customer_info(request.customer_info.as_deref())?;
        let payment_method = request.payment_method.unwrap_or_default();

        let sale = match self.atomicity {
            CartAtomicity::AllOrNothing => {
                let mut tx = self.db.begin().await?;
                let sale = record_sale(&mut *tx, &caller.employee_id, &request.items).await?;
                tx.commit().await.map_err(DbError::from)?;
                sale
            }
            CartAtomicity::PerItem => {
                let mut conn = self.db.acquire().await?;
                record_sale(&mut *conn, &caller.employee_id, &request.items).await?
            }
        };

        info!(
            sale_number = sale.sale_number,
            employee_id = %sale.employee_id,
            lines = sale.items.len(),
            total = %sale.total(),
            "Sale recorded"
        );

        let bill = match self.bills.issue(&sale, customer_info, payment_method).await {
            Ok(bill) => Some(bill),
            Err(e) => {
                warn!(sale_number = sale.sale_number, error = %e, "Bill could not be issued");
                None
            }
        };

        let sale = present_sale(&self.db, sale).await;
        Ok(SaleReceipt { sale, bill })
    }
}

/// Display view of a committed sale. Falls back to the bare record when
/// the employee or product lookups fail; the sale stands either way.
async fn present_sale(db: &Database, sale: Sale) -> SaleView {
    let fallback = sale.clone();
    match sale_views(db, vec![sale]).await {
        Ok(mut views) if !views.is_empty() => views.remove(0),
        Ok(_) => SaleView::assemble(fallback, None, &HashMap::new()),
        Err(e) => {
            warn!(sale_number = fallback.sale_number, error = %e, "Sale view could not be assembled");
            SaleView::assemble(fallback, None, &HashMap::new())
        }
    }
}

/// Takes stock for each line in order, then stores the sale. Everything
/// runs on `conn`; the caller decides whether that is one transaction.
async fn record_sale(
    conn: &mut SqliteConnection,
    employee_id: &str,
    lines: &[CartLine],
) -> ApiResult<Sale> {
    let mut draft = SaleDraft::new(employee_id);

    for line in lines {
        let product = get_product(conn, &line.product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

        draft.add_line(&product, line.quantity)?;

        match decrement_stock(conn, &product.id, line.quantity).await? {
            Decrement::Applied { .. } => {}
            Decrement::Insufficient { available } => {
                return Err(CoreError::InsufficientStock {
                    product: product.name,
                    available,
                    requested: line.quantity,
                }
                .into());
            }
            Decrement::Missing => {
                return Err(CoreError::ProductNotFound(line.product_id.clone()).into());
            }
        }
    }

    let sale_number = next_value(conn, SALE_SEQUENCE_KEY).await?;
    let sale = draft.into_sale(Uuid::new_v4().to_string(), sale_number, Utc::now());
    insert_sale(conn, &sale).await?;
    Ok(sale)
}
