//! `/api/sales` routes.

use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use stockroom_core::receipt::Bill;
use stockroom_core::report::{DashboardSummary, MonthlyReport};
use stockroom_core::returns::ReturnOutcome;
use stockroom_core::view::SaleView;
use stockroom_core::window::MonthWindow;

use crate::auth::Authenticated;
use crate::error::{ApiError, ApiResult};
use crate::services::bills::BillRequest;
use crate::services::returns::ReturnRequest;
use crate::services::sales::{CreateSaleRequest, SaleReceipt};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_sale))
        .route("/return", post(process_return))
        .route("/analysis", get(analysis))
        .route("/summary", get(summary))
        .route("/report/monthly", get(monthly_report))
        .route("/employee/{id}", get(employee_sales))
        .route("/employee/{id}/bills", get(employee_bills))
        .route("/{id}/bill", post(generate_bill))
}

/// `?month=3&year=2026`
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

/// `?month=3&year=2026&top=1&export=csv`
#[derive(Debug, Default, Deserialize)]
pub struct AnalysisQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub top: Option<String>,
    pub export: Option<String>,
}

impl AnalysisQuery {
    fn wants_top(&self) -> bool {
        matches!(self.top.as_deref(), Some("1") | Some("true"))
    }

    fn wants_csv(&self) -> bool {
        self.export.as_deref() == Some("csv")
    }
}

async fn create_sale(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    payload: Result<Json<CreateSaleRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SaleReceipt>)> {
    let Json(request) = payload?;
    let receipt = state.sales().create_sale(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn process_return(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    payload: Result<Json<ReturnRequest>, JsonRejection>,
) -> ApiResult<Json<ReturnOutcome>> {
    let Json(request) = payload?;
    let outcome = state.returns().process_return(&caller, request).await?;
    Ok(Json(outcome))
}

/// Per-product figures for a month: the plain rows, `{items,
/// topSellingProducts}` with `top=1`, or a CSV attachment with
/// `export=csv`.
async fn analysis(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    query: Result<Query<AnalysisQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query?;
    let window = MonthWindow::from_parts(query.month, query.year)?;
    let reports = state.reports();

    if query.wants_csv() {
        let export = reports.csv_export(&caller, &window).await?;
        let disposition = format!("attachment; filename={}", export.filename);
        return Ok((
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            export.body,
        )
            .into_response());
    }

    if query.wants_top() {
        let analysis = reports.analysis(&caller, &window).await?;
        return Ok(Json(analysis).into_response());
    }

    let rows = reports.sales_by_product(&caller, &window).await?;
    Ok(Json(rows).into_response())
}

async fn summary(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
) -> ApiResult<Json<DashboardSummary>> {
    Ok(Json(state.reports().dashboard(&caller).await?))
}

async fn monthly_report(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> ApiResult<Json<MonthlyReport>> {
    let Query(query) = query?;
    let window = MonthWindow::from_parts(query.month, query.year)?;
    Ok(Json(state.reports().monthly_report(&caller, &window).await?))
}

/// The window applies only when both month and year are given.
async fn employee_sales(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<SaleView>>> {
    let Path(employee_id) = path?;
    let Query(query) = query?;

    let window = match (query.month, query.year) {
        (Some(month), Some(year)) => Some(MonthWindow::new(year, month)?),
        _ => None,
    };

    let sales = state
        .reports()
        .employee_sales(&caller, &employee_id, window.as_ref())
        .await?;
    Ok(Json(sales))
}

async fn employee_bills(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Vec<Bill>>> {
    let Path(employee_id) = path?;
    Ok(Json(state.bills().employee_bills(&caller, &employee_id).await?))
}

/// Issues another bill for a sale. The body is optional.
async fn generate_bill(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    path: Result<Path<String>, PathRejection>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Bill>)> {
    let Path(sale_key) = path?;
    let request: BillRequest = if body.is_empty() {
        BillRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::validation(e.to_string()))?
    };

    let bill = state.bills().generate(&caller, &sale_key, request).await?;
    Ok((StatusCode::CREATED, Json(bill)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::testing::{app, body_json, body_text, send};
    use crate::services::testing::{add_product, admin, cashier, stock, test_db, CASHIER_ID};
    use axum::http::Method;
    use serde_json::json;
    use stockroom_core::{CartAtomicity, Caller, Role};

    #[tokio::test]
    async fn test_sell_then_return_over_http() {
        let db = test_db().await;
        add_product(&db, "pen", "Pen", 1000, 5, 2, 20).await;
        let router = app(db.clone(), CartAtomicity::AllOrNothing);

        let response = send(
            &router,
            Method::POST,
            "/api/sales",
            Some(&cashier()),
            Some(json!({
                "items": [{ "product": "pen", "quantity": 3 }],
                "paymentMethod": "Digital Wallet"
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["sale"]["total"], 30.0);
        assert_eq!(body["sale"]["employee"]["name"], "cashier");
        assert_eq!(body["sale"]["items"][0]["product"]["name"], "Pen");
        assert_eq!(body["bill"]["paymentMethod"], "Digital Wallet");
        assert_eq!(body["bill"]["customerInfo"], "N/A");
        assert_eq!(stock(&db, "pen").await, 2);

        let sale_number = body["sale"]["saleId"].as_i64().unwrap();
        let response = send(
            &router,
            Method::POST,
            "/api/sales/return",
            Some(&cashier()),
            Some(json!({
                "saleId": sale_number,
                "returnItems": [{ "product": "BC-pen", "quantity": 3 }]
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["allReturned"], true);
        assert_eq!(body["message"], "Return processed successfully");
        assert_eq!(stock(&db, "pen").await, 5);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let db = test_db().await;
        add_product(&db, "pen", "Pen", 1000, 2, 2, 20).await;
        let router = app(db.clone(), CartAtomicity::AllOrNothing);

        let response = send(
            &router,
            Method::POST,
            "/api/sales",
            Some(&cashier()),
            Some(json!({ "items": [{ "product": "pen", "quantity": 10 }] })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "INSUFFICIENT_STOCK");

        let response = send(
            &router,
            Method::POST,
            "/api/sales",
            Some(&cashier()),
            Some(json!({ "items": [] })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &router,
            Method::POST,
            "/api/sales/return",
            Some(&cashier()),
            Some(json!({ "saleId": "nope", "returnItems": [{ "product": "pen", "quantity": 1 }] })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(
            &router,
            Method::POST,
            "/api/sales",
            Some(&cashier()),
            Some(json!({ "items": "pen" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_analysis_variants() {
        let db = test_db().await;
        add_product(&db, "pen", "Pen", 1000, 50, 2, 100).await;
        let router = app(db.clone(), CartAtomicity::AllOrNothing);
        for qty in [2, 3] {
            let response = send(
                &router,
                Method::POST,
                "/api/sales",
                Some(&cashier()),
                Some(json!({ "items": [{ "product": "pen", "quantity": qty }] })),
            )
            .await;
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let now = chrono::Utc::now();
        let (month, year) = (chrono::Datelike::month(&now), chrono::Datelike::year(&now));
        let base = format!("/api/sales/analysis?month={month}&year={year}");

        let response = send(&router, Method::GET, &base, Some(&admin()), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let rows = body_json(response).await;
        assert_eq!(rows[0]["totalQuantity"], 5);
        assert_eq!(rows[0]["totalRevenue"], 50.0);

        let response = send(&router, Method::GET, &format!("{base}&top=1"), Some(&admin()), None).await;
        let body = body_json(response).await;
        assert_eq!(body["items"][0]["productName"], "Pen");
        assert_eq!(body["topSellingProducts"][0]["totalQuantity"], 5);

        let response =
            send(&router, Method::GET, &format!("{base}&export=csv"), Some(&admin()), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(content_type.starts_with("text/csv"));
        assert_eq!(
            disposition,
            format!("attachment; filename=sales-frequency-{year}-{month}.csv")
        );
        let text = body_text(response).await;
        assert!(text.starts_with("Product Name,Product ID,Total Quantity,Total Revenue"));
        assert!(text.contains("Pen,pen,5,50.00"));

        let response = send(&router, Method::GET, &base, Some(&cashier()), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(
            &router,
            Method::GET,
            "/api/sales/analysis?month=3",
            Some(&admin()),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_summary_monthly_and_employee_views() {
        let db = test_db().await;
        add_product(&db, "pen", "Pen", 1000, 50, 2, 100).await;
        let router = app(db.clone(), CartAtomicity::PerItem);
        send(
            &router,
            Method::POST,
            "/api/sales",
            Some(&cashier()),
            Some(json!({ "items": [{ "productId": "pen", "quantity": 4 }], "customerInfo": "Ali" })),
        )
        .await;

        let response = send(&router, Method::GET, "/api/sales/summary", Some(&admin()), None).await;
        let body = body_json(response).await;
        assert_eq!(body["totalSales"]["totalRevenue"], 40.0);
        assert_eq!(body["totalSales"]["totalSalesCount"], 1);
        assert_eq!(body["productSummary"]["totalQuantity"], 46);

        let now = chrono::Utc::now();
        let (month, year) = (chrono::Datelike::month(&now), chrono::Datelike::year(&now));
        let uri = format!("/api/sales/report/monthly?month={month}&year={year}");
        let response = send(&router, Method::GET, &uri, Some(&admin()), None).await;
        let body = body_json(response).await;
        assert_eq!(body["month"], format!("{year}-{month}"));
        assert_eq!(body["summary"]["totalSalesCount"], 1);
        assert_eq!(body["topSellingProducts"][0]["totalQuantitySold"], 4);

        let uri = format!("/api/sales/employee/{CASHIER_ID}");
        let response = send(&router, Method::GET, &uri, Some(&cashier()), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

        let response = send(&router, Method::GET, &format!("{uri}/bills"), Some(&cashier()), None).await;
        let bills = body_json(response).await;
        assert_eq!(bills[0]["customerInfo"], "Ali");

        let stranger = Caller::new("emp-other", Role::Employee);
        let response = send(&router, Method::GET, &uri, Some(&stranger), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_generate_bill_with_and_without_body() {
        let db = test_db().await;
        add_product(&db, "pen", "Pen", 1000, 50, 2, 100).await;
        let router = app(db.clone(), CartAtomicity::AllOrNothing);
        let response = send(
            &router,
            Method::POST,
            "/api/sales",
            Some(&cashier()),
            Some(json!({ "items": [{ "product": "pen", "quantity": 1 }] })),
        )
        .await;
        let sale_id = body_json(response).await["sale"]["id"].as_str().unwrap().to_string();

        let uri = format!("/api/sales/{sale_id}/bill");
        let response = send(&router, Method::POST, &uri, Some(&cashier()), None).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["paymentMethod"], "Cash");

        let response = send(
            &router,
            Method::POST,
            &uri,
            Some(&cashier()),
            Some(json!({ "customerInfo": "Sara", "paymentMethod": "Card" })),
        )
        .await;
        let bill = body_json(response).await;
        assert_eq!(bill["customerInfo"], "Sara");
        assert_eq!(bill["paymentMethod"], "Card");

        assert_eq!(db.bills().list_for_sale(&sale_id).await.unwrap().len(), 3);
    }
}
