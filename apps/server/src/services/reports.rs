//! # Aggregation Service
//!
//! Loads sales and the product catalog, then hands them to the pure
//! aggregation functions in `stockroom_core::report`.
//!
//! ```text
//! ┌──────────────────────┬──────────────────────────────┬────────────────┐
//! │ Operation            │ Data loaded                  │ Who may call   │
//! ├──────────────────────┼──────────────────────────────┼────────────────┤
//! │ sales_by_product     │ sales in window, names       │ admin          │
//! │ analysis (top=1)     │ sales in window, names       │ admin          │
//! │ csv_export           │ sales in window, names       │ admin          │
//! │ monthly_report       │ sales in window, names       │ admin          │
//! │ dashboard            │ all-time totals, catalog     │ admin          │
//! │ employee_sales       │ employee's sales (+ window)  │ self or admin  │
//! └──────────────────────┴──────────────────────────────┴────────────────┘
//! ```

use stockroom_core::report::{
    analysis_with_top, dashboard_summary, export_csv, monthly_report, sales_by_product,
    DashboardSummary, MonthlyReport, ProductSales, SalesAnalysis,
};
use stockroom_core::view::SaleView;
use stockroom_core::window::MonthWindow;
use stockroom_core::Caller;
use stockroom_db::Database;
use tracing::info;

use super::{require_admin, require_self_or_admin, sale_views};
use crate::error::ApiResult;

/// A rendered CSV attachment.
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub filename: String,
    pub body: String,
}

#[derive(Clone)]
pub struct ReportService {
    db: Database,
}

impl ReportService {
    pub fn new(db: Database) -> Self {
        ReportService { db }
    }

    /// Per-product quantity and revenue for `window`, best sellers first.
    pub async fn sales_by_product(
        &self,
        caller: &Caller,
        window: &MonthWindow,
    ) -> ApiResult<Vec<ProductSales>> {
        require_admin(caller)?;

        let sales = self.db.sales().list_in_window(window).await?;
        let names = self.db.products().names().await?;
        Ok(sales_by_product(window, &sales, &names))
    }

    /// [`ReportService::sales_by_product`] plus the top five.
    pub async fn analysis(&self, caller: &Caller, window: &MonthWindow) -> ApiResult<SalesAnalysis> {
        let rows = self.sales_by_product(caller, window).await?;
        Ok(analysis_with_top(rows))
    }

    pub async fn csv_export(&self, caller: &Caller, window: &MonthWindow) -> ApiResult<CsvExport> {
        let rows = self.sales_by_product(caller, window).await?;
        let body = export_csv(&rows)?;

        info!(window = %window.label(), rows = rows.len(), "Sales CSV exported");
        Ok(CsvExport {
            filename: window.csv_filename(),
            body,
        })
    }

    pub async fn monthly_report(
        &self,
        caller: &Caller,
        window: &MonthWindow,
    ) -> ApiResult<MonthlyReport> {
        require_admin(caller)?;

        let sales = self.db.sales().list_in_window(window).await?;
        let names = self.db.products().names().await?;
        Ok(monthly_report(window, &sales, &names))
    }

    /// All-time revenue and sale count with current inventory numbers.
    pub async fn dashboard(&self, caller: &Caller) -> ApiResult<DashboardSummary> {
        require_admin(caller)?;

        let totals = self.db.sales().totals().await?;
        let products = self.db.products().list_all().await?;
        Ok(dashboard_summary(totals, &products))
    }

    /// Sales recorded by `employee_id`, newest first, optionally limited to
    /// one month.
    pub async fn employee_sales(
        &self,
        caller: &Caller,
        employee_id: &str,
        window: Option<&MonthWindow>,
    ) -> ApiResult<Vec<SaleView>> {
        require_self_or_admin(caller, employee_id)?;

        let sales = self.db.sales().list_for_employee(employee_id, window).await?;
        sale_views(&self.db, sales).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::testing::{add_product, admin, cashier, test_db, ADMIN_ID, CASHIER_ID};
    use chrono::{DateTime, TimeZone, Utc};
    use stockroom_core::{LineItem, Sale};

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    async fn record(
        db: &Database,
        number: i64,
        employee_id: &str,
        when: DateTime<Utc>,
        lines: &[(&str, i64, i64)],
    ) -> Sale {
        let items: Vec<LineItem> = lines
            .iter()
            .map(|(id, qty, price)| LineItem {
                product_id: id.to_string(),
                quantity: *qty,
                unit_price_cents: *price,
            })
            .collect();
        let total_cents: i64 = items.iter().map(|l| l.quantity * l.unit_price_cents).sum();
        let sale = Sale {
            id: format!("sale-{number}"),
            sale_number: number,
            employee_id: employee_id.to_string(),
            items,
            total_cents,
            is_return: false,
            created_at: when,
            updated_at: when,
        };
        db.sales().insert(&sale).await.unwrap();
        sale
    }

    #[tokio::test]
    async fn test_two_sales_of_one_product_aggregate() {
        let db = test_db().await;
        add_product(&db, "pen", "Pen", 1000, 50, 2, 100).await;
        record(&db, 1, CASHIER_ID, at(2026, 3, 3), &[("pen", 2, 1000)]).await;
        record(&db, 2, CASHIER_ID, at(2026, 3, 30), &[("pen", 3, 1000)]).await;
        record(&db, 3, CASHIER_ID, at(2026, 4, 1), &[("pen", 7, 1000)]).await;

        let window = MonthWindow::new(2026, 3).unwrap();
        let service = ReportService::new(db);

        let rows = service.sales_by_product(&admin(), &window).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_quantity, 5);
        assert_eq!(rows[0].total_revenue_cents, 5000);

        let analysis = service.analysis(&admin(), &window).await.unwrap();
        assert_eq!(analysis.top_selling_products[0].product_name, "Pen");
    }

    #[tokio::test]
    async fn test_csv_export_round_trips_quoted_names() {
        let db = test_db().await;
        add_product(&db, "w1", "Widget, \"Pro\"", 1000, 50, 2, 100).await;
        record(&db, 1, CASHIER_ID, at(2026, 3, 3), &[("w1", 1, 999)]).await;
        record(&db, 2, CASHIER_ID, at(2026, 3, 4), &[("w1", 4, 1000)]).await;

        let window = MonthWindow::new(2026, 3).unwrap();
        let export = ReportService::new(db).csv_export(&admin(), &window).await.unwrap();

        assert_eq!(export.filename, "sales-frequency-2026-3.csv");
        assert!(export.body.contains("\"Widget, \"\"Pro\"\"\",w1,5,49.99"));

        let mut reader = csv::Reader::from_reader(export.body.as_bytes());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "Product Name");
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[0], "Widget, \"Pro\"");
        assert_eq!(&row[3], "49.99");
    }

    #[tokio::test]
    async fn test_monthly_report_and_dashboard() {
        let db = test_db().await;
        add_product(&db, "pen", "Pen", 1000, 1, 2, 100).await;
        add_product(&db, "cap", "Cap", 250, 0, 2, 100).await;
        record(&db, 1, CASHIER_ID, at(2026, 3, 3), &[("pen", 3, 1000)]).await;
        record(&db, 2, ADMIN_ID, at(2026, 3, 9), &[("cap", 4, 250)]).await;
        record(&db, 3, ADMIN_ID, at(2026, 1, 9), &[("cap", 2, 250)]).await;

        let service = ReportService::new(db);
        let window = MonthWindow::new(2026, 3).unwrap();

        let report = service.monthly_report(&admin(), &window).await.unwrap();
        assert_eq!(report.month, "2026-3");
        assert_eq!(report.summary.total_sales_count, 2);
        assert_eq!(report.summary.total_revenue_cents, 4000);
        assert_eq!(report.summary.average_sale_cents, 2000);
        assert_eq!(report.top_selling_products[0].product_name, "Cap");

        let dashboard = service.dashboard(&admin()).await.unwrap();
        assert_eq!(dashboard.total_sales.total_sales_count, 3);
        assert_eq!(dashboard.total_sales.total_revenue_cents, 4500);
        assert_eq!(dashboard.product_summary.total_products, 2);
        assert_eq!(dashboard.product_summary.total_quantity, 1);
        assert_eq!(dashboard.inventory_alerts.low_stock_count, 1);
        assert_eq!(dashboard.inventory_alerts.out_of_stock_count, 1);
    }

    #[tokio::test]
    async fn test_employee_sales_scoped_and_guarded() {
        let db = test_db().await;
        add_product(&db, "pen", "Pen", 1000, 50, 2, 100).await;
        record(&db, 1, CASHIER_ID, at(2026, 3, 3), &[("pen", 1, 1000)]).await;
        record(&db, 2, CASHIER_ID, at(2026, 4, 3), &[("pen", 1, 1000)]).await;
        record(&db, 3, ADMIN_ID, at(2026, 3, 5), &[("pen", 1, 1000)]).await;

        let service = ReportService::new(db);

        let all = service.employee_sales(&cashier(), CASHIER_ID, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].sale_number, 2);
        assert_eq!(all[0].employee.as_ref().unwrap().username, "cashier");

        let march = MonthWindow::new(2026, 3).unwrap();
        let scoped = service
            .employee_sales(&admin(), CASHIER_ID, Some(&march))
            .await
            .unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].sale_number, 1);

        let err = service.employee_sales(&cashier(), ADMIN_ID, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn test_reports_are_admin_only() {
        let service = ReportService::new(test_db().await);
        let window = MonthWindow::new(2026, 3).unwrap();

        let err = service.analysis(&cashier(), &window).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
        let err = service.dashboard(&cashier()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
        let err = service.monthly_report(&cashier(), &window).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }
}
