//! # Seed Data Generator
//!
//! Populates a database with demo employees and a small stationery catalog.
//!
//! ## Usage
//! ```bash
//! cargo run -p stockroom-db --bin seed
//! cargo run -p stockroom-db --bin seed -- --db ./data/stockroom.db
//! ```
//!
//! Products are spread across the alert bands so the dashboard shows low
//! stock, out of stock and overstock entries straight away.

use std::env;

use anyhow::Context;
use chrono::Utc;
use stockroom_core::{Employee, Product, Role, DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_OVERSTOCK_THRESHOLD};
use stockroom_db::{generate_product_id, Database, DbConfig};
use tracing_subscriber::EnvFilter;

/// (name, barcode, price in cents, quantity)
const PRODUCTS: &[(&str, &str, i64, i64)] = &[
    ("Ballpoint Pen", "590000000001", 5000, 40),
    ("Gel Pen", "590000000002", 8000, 6),
    ("Pencil HB", "590000000003", 2500, 150),
    ("Eraser", "590000000004", 1500, 0),
    ("A4 Notebook", "590000000005", 25000, 22),
    ("Sticky Notes", "590000000006", 12000, 9),
    ("Stapler", "590000000007", 45000, 3),
    ("Highlighter", "590000000008", 9000, 120),
];

/// (id, display name, username, role)
const EMPLOYEES: &[(&str, &str, &str, Role)] = &[
    ("emp-admin", "Store Admin", "admin", Role::Admin),
    ("emp-cashier", "Front Counter", "cashier", Role::Employee),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./stockroom_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./stockroom_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Stockroom Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {db_path}"))?;
    println!("✓ Connected, migrations applied");

    let now = Utc::now();

    for (id, name, username, role) in EMPLOYEES {
        if db.employees().get_by_username(username).await?.is_some() {
            println!("  employee '{}' already present", username);
            continue;
        }
        db.employees()
            .insert(&Employee {
                id: id.to_string(),
                name: name.to_string(),
                username: username.to_string(),
                role: *role,
                created_at: now,
            })
            .await?;
        println!("✓ Added employee '{}' ({:?})", username, role);
    }

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products, skipping catalog", existing);
        return Ok(());
    }

    for (name, barcode, price_cents, quantity) in PRODUCTS {
        let product = Product {
            id: generate_product_id(),
            name: name.to_string(),
            price_cents: *price_cents,
            barcode: barcode.to_string(),
            quantity: *quantity,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            overstock_threshold: DEFAULT_OVERSTOCK_THRESHOLD,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = db.products().insert(&product).await {
            eprintln!("Failed to insert {}: {}", product.name, e);
            continue;
        }
    }

    println!("✓ Added {} products", db.products().count().await?);
    println!();
    println!("✓ Seed complete!");

    Ok(())
}
