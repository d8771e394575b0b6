//! # stockroom-core: Pure Business Logic for Stockroom
//!
//! Everything that decides *what* happens to stock, sales and reports lives
//! here as plain functions over plain data. Persistence and transport sit in
//! `stockroom-db` and the server app.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API (apps/server)                       │   │
//! │  │   POST /api/sales ── POST /api/sales/return ── GET reports     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockroom-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │  ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌───────┐ │   │
//! │  │  │ checkout │ │ returns  │ │  alerts  │ │  report  │ │receipt│ │   │
//! │  │  │SaleDraft │ │take_ret. │ │ classify │ │ by_prod. │ │ Bill  │ │   │
//! │  │  └──────────┘ └──────────┘ └──────────┘ └──────────┘ └───────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 stockroom-db (Database Layer)                   │   │
//! │  │         SQLite ledger, sequences, sales, bills, catalog         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, Employee, Caller, ...)
//! - [`money`] - Integer money and its decimal wire format
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//! - [`window`] - Calendar-month reporting windows
//! - [`lookup`] - Ordered resolution plans for loosely keyed lookups
//! - [`checkout`] - Building a sale from a cart
//! - [`returns`] - Applying returns to a recorded sale
//! - [`alerts`] - Stock threshold classification
//! - [`report`] - Period aggregation and CSV export
//! - [`receipt`] - Bill content and printable receipt text
//! - [`view`] - Populated sale views for API responses
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::money::Money;
//!
//! let price = Money::from_cents(1000);
//! let line_total = price * 3_i64;
//! assert_eq!(line_total.to_string(), "30.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod alerts;
pub mod checkout;
pub mod error;
pub mod lookup;
pub mod money;
pub mod receipt;
pub mod report;
pub mod returns;
pub mod types;
pub mod validation;
pub mod view;
pub mod window;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Sequence counter key used for human-facing sale numbers.
pub const SALE_SEQUENCE_KEY: &str = "saleId";

/// Default low-stock threshold for new products.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

/// Default overstock threshold for new products.
pub const DEFAULT_OVERSTOCK_THRESHOLD: i64 = 100;

/// Customer info recorded on a bill when the cashier supplies none.
pub const DEFAULT_CUSTOMER_INFO: &str = "N/A";

/// Number of entries in "top selling" lists.
pub const TOP_SELLERS_LIMIT: usize = 5;
