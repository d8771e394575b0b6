//! # Repository Module
//!
//! Database repository implementations for Stockroom.
//!
//! ## Two Access Styles
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Pool-level repositories (reads, catalog admin)                        │
//! │       db.products().list_all()                                         │
//! │       db.sales().list_in_window(&window)                               │
//! │       db.bills().list_for_employee(id)                                 │
//! │                                                                         │
//! │  Connection-level functions (checkout and return paths)                │
//! │       let mut tx = db.begin().await?;                                  │
//! │       sequence::next_value(&mut tx, "saleId")                          │
//! │       sale::insert_sale(&mut tx, &sale)                                │
//! │       tx.commit()                                                      │
//! │                                                                         │
//! │  The second style lets one transaction span several tables.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD
//! - [`EmployeeRepository`](employee::EmployeeRepository) - Employee read model
//! - [`SaleRepository`](sale::SaleRepository) - Sale reads and window queries
//! - [`BillRepository`](bill::BillRepository) - Bill persistence
//! - [`SequenceRepository`](sequence::SequenceRepository) - Named counters

pub mod bill;
pub mod employee;
pub mod product;
pub mod sale;
pub mod sequence;
