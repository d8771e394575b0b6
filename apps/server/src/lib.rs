//! # Stockroom Server
//!
//! HTTP API for the stockroom inventory and point-of-sale backend.
//!
//! ## Module Organization
//! ```text
//! stockroom_server/
//! ├── lib.rs          ◄─── You are here (state, router, tracing)
//! ├── main.rs         ◄─── Binary: config → tracing → db → serve
//! ├── config.rs       ◄─── Layered ServerConfig
//! ├── auth.rs         ◄─── Bearer JWT → Caller
//! ├── error.rs        ◄─── ApiError and status mapping
//! ├── services/
//! │   ├── sales.rs    ◄─── Sale recorder
//! │   ├── returns.rs  ◄─── Return processor
//! │   ├── bills.rs    ◄─── Bill issuer and receipts
//! │   ├── reports.rs  ◄─── Aggregation engine
//! │   └── inventory.rs◄─── Catalog and stock alerts
//! └── routes/
//!     ├── mod.rs      ◄─── Router assembly, /health
//!     ├── sales.rs    ◄─── /api/sales/*
//!     ├── products.rs ◄─── /api/products/*
//!     └── bills.rs    ◄─── /api/bills/*
//! ```
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TraceLayer ──► route ──► Authenticated(caller) ──► Service(&caller)   │
//! │                                                          │              │
//! │                                     stockroom-core ◄─────┤              │
//! │                                     stockroom-db   ◄─────┘              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod services;

use std::sync::Arc;

use stockroom_db::Database;
use tracing_subscriber::EnvFilter;

use crate::auth::JwtVerifier;
use crate::config::ServerConfig;
use crate::services::{BillService, InventoryService, ReportService, ReturnService, SaleService};

pub use routes::build_router;

/// Shared application state. Cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ServerConfig>,
    pub verifier: Arc<JwtVerifier>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        let verifier = JwtVerifier::new(&config.jwt_secret);
        AppState {
            db,
            config: Arc::new(config),
            verifier: Arc::new(verifier),
        }
    }

    pub fn sales(&self) -> SaleService {
        SaleService::new(
            self.db.clone(),
            self.config.cart_atomicity,
            self.config.currency_label.clone(),
        )
    }

    pub fn returns(&self) -> ReturnService {
        ReturnService::new(self.db.clone(), self.config.cart_atomicity)
    }

    pub fn bills(&self) -> BillService {
        BillService::new(self.db.clone(), self.config.currency_label.clone())
    }

    pub fn reports(&self) -> ReportService {
        ReportService::new(self.db.clone())
    }

    pub fn inventory(&self) -> InventoryService {
        InventoryService::new(self.db.clone())
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=stockroom=trace` - Show trace for stockroom crates only
/// - Default: `info,stockroom=debug,sqlx=warn`
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stockroom=debug,sqlx=warn"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
