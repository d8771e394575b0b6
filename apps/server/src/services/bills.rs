//! Bill issuer.
//!
//! A bill is a structured snapshot of a sale taken when it is issued. The
//! printable receipt is rendered from that snapshot on request, so a later
//! return never changes an issued bill.

use std::collections::HashMap;

use chrono::Utc;
use serde::Deserialize;
use stockroom_core::lookup::sale_plan;
use stockroom_core::receipt::{Bill, BillContent};
use stockroom_core::validation::normalize_customer_info;
use stockroom_core::{Caller, CoreError, PaymentMethod, Sale};
use stockroom_db::Database;
use tracing::{debug, info};
use uuid::Uuid;

use super::require_self_or_admin;
use crate::error::{ApiError, ApiResult};

/// Optional bill details supplied by the cashier.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillRequest {
    pub customer_info: Option<String>,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Clone)]
pub struct BillService {
    db: Database,
    currency: String,
}

impl BillService {
    pub fn new(db: Database, currency: impl Into<String>) -> Self {
        BillService {
            db,
            currency: currency.into(),
        }
    }

    /// Snapshots `sale` and stores the bill.
    pub async fn issue(
        &self,
        sale: &Sale,
        customer_info: String,
        payment_method: PaymentMethod,
    ) -> ApiResult<Bill> {
        let employee = self.db.employees().get_by_id(&sale.employee_id).await?;

        let product_ids: Vec<String> = sale.items.iter().map(|l| l.product_id.clone()).collect();
        let names: HashMap<String, String> = self
            .db
            .products()
            .get_many(&product_ids)
            .await?
            .into_iter()
            .map(|(id, product)| (id, product.name))
            .collect();

        let content = BillContent::capture(
            sale,
            employee.as_ref().map(|e| e.name.as_str()),
            &names,
            customer_info.clone(),
            payment_method,
        );

        let bill = Bill {
            id: Uuid::new_v4().to_string(),
            sale_id: sale.id.clone(),
            customer_info,
            payment_method,
            content,
            created_at: Utc::now(),
        };
        self.db.bills().insert(&bill).await?;

        info!(bill_id = %bill.id, sale_number = sale.sale_number, payment = %payment_method, "Bill issued");
        Ok(bill)
    }

    /// Issues an additional bill for an existing sale, found by internal id
    /// or sale number.
    pub async fn generate(
        &self,
        caller: &Caller,
        sale_key: &str,
        request: BillRequest,
    ) -> ApiResult<Bill> {
        debug!(caller = %caller.employee_id, sale_key, "Generating bill on demand");
        let customer_info = normalize_customer_info(request.customer_info.as_deref())?;

        let sale = self
            .db
            .sales()
            .resolve(&sale_plan(sale_key))
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_key.to_string()))?;

        self.issue(&sale, customer_info, request.payment_method.unwrap_or_default())
            .await
    }

    /// Bills for every sale recorded by `employee_id`, newest first.
    pub async fn employee_bills(&self, caller: &Caller, employee_id: &str) -> ApiResult<Vec<Bill>> {
        require_self_or_admin(caller, employee_id)?;
        Ok(self.db.bills().list_for_employee(employee_id).await?)
    }

    /// Plain-text receipt for a stored bill.
    pub async fn receipt(&self, caller: &Caller, bill_id: &str) -> ApiResult<String> {
        let bill = self
            .db
            .bills()
            .get_by_id(bill_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Bill", bill_id))?;

        if !caller.is_admin() {
            let owner = self
                .db
                .sales()
                .get_by_id(&bill.sale_id)
                .await?
                .map(|sale| sale.employee_id)
                .unwrap_or_default();
            require_self_or_admin(caller, &owner)?;
        }

        Ok(bill.content.render(&self.currency).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::testing::{add_product, admin, cashier, test_db, CASHIER_ID};
    use stockroom_core::checkout::CartLine;
    use stockroom_core::{CartAtomicity, Role};

    use crate::services::sales::{CreateSaleRequest, SaleService};

    async fn one_sale(db: &Database) -> Sale {
        add_product(db, "pen", "Pen", 1000, 5, 2, 20).await;
        let sales = SaleService::new(db.clone(), CartAtomicity::AllOrNothing, "PKR");
        let created = sales
            .create_sale(
                &cashier(),
                CreateSaleRequest {
                    items: vec![CartLine {
                        product_id: "pen".to_string(),
                        quantity: 3,
                    }],
                    customer_info: None,
                    payment_method: None,
                },
            )
            .await
            .unwrap();
        db.sales().get_by_id(&created.sale.id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_generate_by_sale_number_with_defaults() {
        let db = test_db().await;
        let sale = one_sale(&db).await;
        let service = BillService::new(db.clone(), "PKR");

        let bill = service
            .generate(&cashier(), &sale.sale_number.to_string(), BillRequest::default())
            .await
            .unwrap();

        assert_eq!(bill.sale_id, sale.id);
        assert_eq!(bill.customer_info, "N/A");
        assert_eq!(bill.payment_method, PaymentMethod::Cash);
        assert_eq!(bill.content.employee_name, "cashier");
        assert_eq!(bill.content.lines[0].product_name, "Pen");
        assert_eq!(bill.content.total_cents, 3000);

        // auto bill from the sale plus this one
        assert_eq!(db.bills().list_for_sale(&sale.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_generate_unknown_sale() {
        let db = test_db().await;
        let service = BillService::new(db, "PKR");

        let err = service
            .generate(&cashier(), "999", BillRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_receipt_and_employee_bills_guarded() {
        let db = test_db().await;
        let sale = one_sale(&db).await;
        let service = BillService::new(db.clone(), "PKR");

        let bills = service.employee_bills(&cashier(), CASHIER_ID).await.unwrap();
        assert_eq!(bills.len(), 1);
        assert_eq!(bills[0].sale_id, sale.id);

        let text = service.receipt(&admin(), &bills[0].id).await.unwrap();
        assert!(text.contains("PKR 30.00"));

        let stranger = Caller::new("emp-other", Role::Employee);
        let err = service.employee_bills(&stranger, CASHIER_ID).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
        let err = service.receipt(&stranger, &bills[0].id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }
}
