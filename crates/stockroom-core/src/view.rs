//! # Sale Views
//!
//! API-facing sale shape with employee and product display fields filled
//! in. A line whose product has been deleted keeps its frozen price and
//! reports `product: null`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use ts_rs::TS;

use crate::types::{Employee, Product, Sale};

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRef {
    pub id: String,
    pub name: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    pub id: String,
    pub name: String,
    /// Current catalog price, which may differ from the line's frozen price.
    #[serde(rename = "price", with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub price_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItemView {
    pub product_id: String,
    pub product: Option<ProductRef>,
    pub quantity: i64,
    #[serde(rename = "price", with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub unit_price_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleView {
    pub id: String,
    #[serde(rename = "saleId")]
    pub sale_number: i64,
    pub employee_id: String,
    pub employee: Option<EmployeeRef>,
    pub items: Vec<LineItemView>,
    #[serde(rename = "total", with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub total_cents: i64,
    pub is_return: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl From<&Employee> for EmployeeRef {
    fn from(e: &Employee) -> Self {
        EmployeeRef {
            id: e.id.clone(),
            name: e.name.clone(),
            username: e.username.clone(),
        }
    }
}

impl From<&Product> for ProductRef {
    fn from(p: &Product) -> Self {
        ProductRef {
            id: p.id.clone(),
            name: p.name.clone(),
            price_cents: p.price_cents,
        }
    }
}

impl SaleView {
    /// Joins `sale` with its employee and the products it references.
    pub fn assemble(
        sale: Sale,
        employee: Option<&Employee>,
        products: &HashMap<String, Product>,
    ) -> Self {
        let items = sale
            .items
            .into_iter()
            .map(|line| LineItemView {
                product: products.get(&line.product_id).map(ProductRef::from),
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
            })
            .collect();

        SaleView {
            id: sale.id,
            sale_number: sale.sale_number,
            employee_id: sale.employee_id,
            employee: employee.map(EmployeeRef::from),
            items,
            total_cents: sale.total_cents,
            is_return: sale.is_return,
            created_at: sale.created_at,
            updated_at: sale.updated_at,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
