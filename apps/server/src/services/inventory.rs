//! Catalog management and stock alerts.

use chrono::Utc;
use serde::Deserialize;
use stockroom_core::alerts::{evaluate_alerts, inventory_report, InventoryAlerts, InventoryReport};
use stockroom_core::validation::{
    parse_price, validate_barcode, validate_product_name, validate_stock_level,
};
use stockroom_core::{Caller, Product, DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_OVERSTOCK_THRESHOLD};
use stockroom_db::{generate_product_id, Database};
use tracing::info;

use super::require_admin;
use crate::error::{ApiError, ApiResult};

/// Body of `POST /api/products`. Price is a decimal amount.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub barcode: String,
    #[serde(default)]
    pub quantity: i64,
    pub low_stock_threshold: Option<i64>,
    pub overstock_threshold: Option<i64>,
}

/// Body of `PUT /api/products/{id}`. Absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub barcode: Option<String>,
    pub quantity: Option<i64>,
    pub low_stock_threshold: Option<i64>,
    pub overstock_threshold: Option<i64>,
}

impl ProductPatch {
    fn apply(self, product: &mut Product) -> ApiResult<()> {
        if let Some(name) = self.name {
            product.name = name.trim().to_string();
        }
        if let Some(price) = self.price {
            product.price_cents = parse_price(price)?;
        }
        if let Some(barcode) = self.barcode {
            product.barcode = barcode.trim().to_string();
        }
        if let Some(quantity) = self.quantity {
            product.quantity = quantity;
        }
        if let Some(low) = self.low_stock_threshold {
            product.low_stock_threshold = low;
        }
        if let Some(over) = self.overstock_threshold {
            product.overstock_threshold = over;
        }
        Ok(())
    }
}

fn validate_product(product: &Product) -> ApiResult<()> {
    validate_product_name(&product.name)?;
    validate_barcode(&product.barcode)?;
    validate_stock_level("quantity", product.quantity)?;
    validate_stock_level("lowStockThreshold", product.low_stock_threshold)?;
    validate_stock_level("overstockThreshold", product.overstock_threshold)?;
    Ok(())
}

#[derive(Clone)]
pub struct InventoryService {
    db: Database,
}

impl InventoryService {
    pub fn new(db: Database) -> Self {
        InventoryService { db }
    }

    pub async fn list(&self, _caller: &Caller) -> ApiResult<Vec<Product>> {
        Ok(self.db.products().list_all().await?)
    }

    pub async fn get(&self, _caller: &Caller, id: &str) -> ApiResult<Product> {
        self.db
            .products()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Product", id))
    }

    /// Adds a product to the catalog.
    ///
    /// ## Errors
    /// * `FORBIDDEN` - caller is not an admin
    /// * `VALIDATION_ERROR` - blank name or barcode, negative numbers
    /// * `CONFLICT` - barcode already in use
    pub async fn create(&self, caller: &Caller, input: NewProduct) -> ApiResult<Product> {
        require_admin(caller)?;

        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: input.name.trim().to_string(),
            price_cents: parse_price(input.price)?,
            barcode: input.barcode.trim().to_string(),
            quantity: input.quantity,
            low_stock_threshold: input.low_stock_threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD),
            overstock_threshold: input.overstock_threshold.unwrap_or(DEFAULT_OVERSTOCK_THRESHOLD),
            created_at: now,
            updated_at: now,
        };
        validate_product(&product)?;

        let product = self.db.products().insert(&product).await?;
        info!(id = %product.id, barcode = %product.barcode, "Product created");
        Ok(product)
    }

    /// Applies a partial update. A changed barcode is checked for conflicts
    /// by the database.
    pub async fn update(&self, caller: &Caller, id: &str, patch: ProductPatch) -> ApiResult<Product> {
        require_admin(caller)?;

        let mut product = self.get(caller, id).await?;
        patch.apply(&mut product)?;
        validate_product(&product)?;

        let product = self.db.products().update(&product).await?;
        info!(id = %product.id, "Product updated");
        Ok(product)
    }

    pub async fn delete(&self, caller: &Caller, id: &str) -> ApiResult<()> {
        require_admin(caller)?;

        self.db.products().delete(id).await?;
        info!(id = %id, "Product removed");
        Ok(())
    }

    /// Low-stock, out-of-stock and overstock products.
    pub async fn alerts(&self, caller: &Caller) -> ApiResult<InventoryAlerts> {
        require_admin(caller)?;

        let products = self.db.products().list_all().await?;
        Ok(evaluate_alerts(&products))
    }

    /// The alert lists with catalog totals.
    pub async fn report(&self, caller: &Caller) -> ApiResult<InventoryReport> {
        require_admin(caller)?;

        let products = self.db.products().list_all().await?;
        Ok(inventory_report(&products))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::testing::{add_product, admin, cashier, test_db};
    use stockroom_core::validation::MAX_QUANTITY;

    fn pen() -> NewProduct {
        NewProduct {
            name: "Pen".to_string(),
            price: 10.0,
            barcode: "P1".to_string(),
            quantity: 5,
            low_stock_threshold: Some(2),
            overstock_threshold: Some(20),
        }
    }

    #[tokio::test]
    async fn test_create_and_duplicate_barcode() {
        let service = InventoryService::new(test_db().await);

        let created = service.create(&admin(), pen()).await.unwrap();
        assert_eq!(created.price_cents, 1000);
        assert_eq!(service.get(&cashier(), &created.id).await.unwrap(), created);

        let err = service.create(&admin(), pen()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.message, "barcode 'P1' already exists");
    }

    #[tokio::test]
    async fn test_create_defaults_and_validation() {
        let service = InventoryService::new(test_db().await);

        let mut input = pen();
        input.low_stock_threshold = None;
        input.overstock_threshold = None;
        let created = service.create(&admin(), input).await.unwrap();
        assert_eq!(created.low_stock_threshold, DEFAULT_LOW_STOCK_THRESHOLD);
        assert_eq!(created.overstock_threshold, DEFAULT_OVERSTOCK_THRESHOLD);

        let mut input = pen();
        input.name = "  ".to_string();
        let err = service.create(&admin(), input).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut input = pen();
        input.barcode = "P2".to_string();
        input.price = -1.0;
        let err = service.create(&admin(), input).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut input = pen();
        input.barcode = "P3".to_string();
        input.quantity = -4;
        let err = service.create(&admin(), input).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut input = pen();
        input.barcode = "P4".to_string();
        input.price = 5.0e16;
        let err = service.create(&admin(), input).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "price must be between 0 and 100000000000");

        let mut input = pen();
        input.barcode = "P5".to_string();
        input.quantity = MAX_QUANTITY + 1;
        let err = service.create(&admin(), input).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_partial_update_and_delete() {
        let db = test_db().await;
        add_product(&db, "cap", "Cap", 250, 1, 2, 20).await;
        let service = InventoryService::new(db);
        let created = service.create(&admin(), pen()).await.unwrap();

        let updated = service
            .update(
                &admin(),
                &created.id,
                ProductPatch {
                    price: Some(50.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price_cents, 5000);
        assert_eq!(updated.name, "Pen");
        assert_eq!(updated.quantity, 5);

        let err = service
            .update(
                &admin(),
                &created.id,
                ProductPatch {
                    barcode: Some("BC-cap".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);

        service.delete(&admin(), &created.id).await.unwrap();
        let err = service.get(&admin(), &created.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        let err = service.delete(&admin(), &created.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_alerts_allow_low_and_over_together() {
        let db = test_db().await;
        add_product(&db, "empty", "Empty", 100, 0, 5, 0).await;
        add_product(&db, "low", "Low", 100, 3, 5, 100).await;
        // misconfigured: low threshold above overstock threshold
        add_product(&db, "both", "Both", 100, 8, 10, 5).await;
        add_product(&db, "fine", "Fine", 100, 50, 5, 100).await;
        let service = InventoryService::new(db);

        let alerts = service.alerts(&admin()).await.unwrap();
        let ids = |list: &[Product]| list.iter().map(|p| p.id.clone()).collect::<Vec<_>>();

        assert_eq!(ids(&alerts.out_of_stock), vec!["empty"]);
        assert_eq!(ids(&alerts.low_stock), vec!["both", "low"]);
        assert_eq!(ids(&alerts.overstock), vec!["both"]);

        let report = service.report(&admin()).await.unwrap();
        assert_eq!(report.total_products, 4);
        assert_eq!(report.total_quantity, 61);
    }

    #[tokio::test]
    async fn test_catalog_writes_are_admin_only() {
        let db = test_db().await;
        add_product(&db, "cap", "Cap", 250, 1, 2, 20).await;
        let service = InventoryService::new(db);

        assert_eq!(service.list(&cashier()).await.unwrap().len(), 1);

        let err = service.create(&cashier(), pen()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
        let err = service
            .update(&cashier(), "cap", ProductPatch::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
        let err = service.delete(&cashier(), "cap").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
        let err = service.alerts(&cashier()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }
}
