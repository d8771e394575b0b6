//! Service layer.
//!
//! Each service runs one family of operations on behalf of an explicit
//! [`Caller`]. Handlers only parse requests and shape responses.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleService       createSale            ─┐                             │
//! │  ReturnService     processReturn          │  mutate ledger + sales      │
//! │  BillService       issue / receipts      ─┘                             │
//! │  ReportService     analysis, dashboard, monthly, employee sales         │
//! │  InventoryService  catalog CRUD, alerts, inventory report               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod bills;
pub mod inventory;
pub mod reports;
pub mod returns;
pub mod sales;

use stockroom_core::view::SaleView;
use stockroom_core::{Caller, Sale};
use stockroom_db::Database;

use crate::error::{ApiError, ApiResult};

pub use bills::BillService;
pub use inventory::InventoryService;
pub use reports::ReportService;
pub use returns::ReturnService;
pub use sales::SaleService;

/// Fails with `FORBIDDEN` unless the caller is an admin.
pub fn require_admin(caller: &Caller) -> ApiResult<()> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Not authorized as an admin"))
    }
}

/// Fails with `FORBIDDEN` unless the caller is `employee_id` or an admin.
pub fn require_self_or_admin(caller: &Caller, employee_id: &str) -> ApiResult<()> {
    if caller.can_view_employee(employee_id) {
        Ok(())
    } else {
        Err(ApiError::forbidden("Not authorized to view these records"))
    }
}

/// Fills in employee and product display fields for a batch of sales.
pub(crate) async fn sale_views(db: &Database, sales: Vec<Sale>) -> ApiResult<Vec<SaleView>> {
    let mut product_ids: Vec<String> = sales
        .iter()
        .flat_map(|s| s.items.iter().map(|l| l.product_id.clone()))
        .collect();
    product_ids.sort();
    product_ids.dedup();
    let products = db.products().get_many(&product_ids).await?;

    let mut views = Vec::with_capacity(sales.len());
    for sale in sales {
        let employee = db.employees().get_by_id(&sale.employee_id).await?;
        views.push(SaleView::assemble(sale, employee.as_ref(), &products));
    }
    Ok(views)
}
