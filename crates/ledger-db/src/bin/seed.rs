//! # Seed Data Generator
//!
//! Populates the database with demo discounts for development.
//!
//! ## Usage
//! ```bash
//! # Seed store S1 in ./ledger_dev.db (defaults)
//! cargo run -p ledger-db --bin seed
//!
//! # Specify database path and store
//! cargo run -p ledger-db --bin seed -- --db ./ledger.db --store S1
//! ```
//!
//! ## Generated Discounts
//! One of each shape the ledger has to handle:
//! - expired, currently active, and not-yet-started windows
//! - percentage and fixed amount
//! - a minimum purchase, a usage limit, a category-only discount
//! - an inactive discount inside its window

use chrono::{Duration, Utc};
use ledger_core::{
    ApplicableTo, CallerContext, CreateDiscountInput, DiscountFilter, DiscountType, PageRequest,
    Role,
};
use ledger_db::{Database, DbConfig};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./ledger_dev.db");
    let mut store_id = String::from("S1");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--store" | "-s" => {
                if i + 1 < args.len() {
                    store_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Discount Ledger Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>     Database file path (default: ./ledger_dev.db)");
                println!("  -s, --store <ID>    Store to seed (default: S1)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Discount Ledger Seed Data Generator");
    println!("======================================");
    println!("Database: {}", db_path);
    println!("Store:    {}", store_id);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let ledger = db.ledger();
    let caller = CallerContext::for_store(Role::Admin, store_id.clone());

    // Check existing discounts
    let existing = ledger
        .list(
            &DiscountFilter {
                page: PageRequest::new(Some(1), Some(1)),
                ..Default::default()
            },
            &caller,
        )
        .await?;
    if !existing.is_empty() {
        println!("⚠ Store {} already has discounts", store_id);
        println!("  Skipping seed to avoid duplicate codes.");
        return Ok(());
    }

    println!();
    println!("Generating discounts...");

    let mut generated = 0;
    for input in demo_discounts() {
        let code = input.code.clone();
        match ledger.create(input, &caller).await {
            Ok(discount) => {
                generated += 1;
                println!("  + {:<12} {}", discount.code, discount.name);
            }
            Err(e) => eprintln!("Failed to insert {}: {}", code, e),
        }
    }

    let active = ledger.list_active(&caller, PageRequest::default()).await?;

    println!();
    println!("✓ Generated {} discounts ({} active now)", generated, active.len());
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds the demo set relative to the current time.
fn demo_discounts() -> Vec<CreateDiscountInput> {
    let now = Utc::now();

    let expired = CreateDiscountInput::new(
        "Spring Clearance",
        "SPRING15",
        DiscountType::Percentage,
        15.0,
        now - Duration::days(90),
        now - Duration::days(30),
    );

    let mut summer = CreateDiscountInput::new(
        "Summer Sale",
        "SUMMER10",
        DiscountType::Percentage,
        10.0,
        now - Duration::days(7),
        now + Duration::days(30),
    );
    summer.description = Some("10% off everything".to_string());

    let mut five_off = CreateDiscountInput::new(
        "Five Off Fifty",
        "FIVEOFF50",
        DiscountType::FixedAmount,
        500.0,
        now - Duration::days(1),
        now + Duration::days(60),
    );
    five_off.min_purchase_cents = Some(5_000);

    let mut vip = CreateDiscountInput::new(
        "VIP Launch",
        "VIP-LAUNCH",
        DiscountType::Percentage,
        25.0,
        now - Duration::days(1),
        now + Duration::days(14),
    );
    vip.usage_limit = Some(3);

    let mut drinks = CreateDiscountInput::new(
        "Drinks Week",
        "DRINKS20",
        DiscountType::Percentage,
        20.0,
        now - Duration::days(2),
        now + Duration::days(5),
    );
    drinks.applicable_to = ApplicableTo::SpecificCategories;
    drinks.categories = vec!["BEV".to_string()];

    let holiday = CreateDiscountInput::new(
        "Holiday Preview",
        "HOLIDAY25",
        DiscountType::Percentage,
        25.0,
        now + Duration::days(45),
        now + Duration::days(75),
    );

    let mut paused = CreateDiscountInput::new(
        "Staff Lunch",
        "STAFF_LUNCH",
        DiscountType::FixedAmount,
        300.0,
        now - Duration::days(10),
        now + Duration::days(10),
    );
    paused.is_active = Some(false);

    vec![expired, summer, five_off, vip, drinks, holiday, paused]
}
