//! # Catalog Seed Tool
//!
//! Populates a development catalog with saree categories and products.
//!
//! ## Usage
//! ```bash
//! # Seed ./resham_dev.db
//! cargo run -p resham-db --bin seed
//!
//! # Specify database path
//! cargo run -p resham-db --bin seed -- --db ./data/catalog.db
//! ```
//!
//! ## Generated Products
//! Each weave gets a handful of colourways. Prices are in paise and stock
//! cycles through 0..=6 so out-of-stock and low-stock cases show up in the
//! storefront straight away.

use chrono::Utc;
use std::env;

use resham_core::{Category, Money, Product};
use resham_db::{generate_product_id, Database, DbConfig};

/// (slug, display name, fabric, base price in rupees)
const WEAVES: &[(&str, &str, &str, i64)] = &[
    ("banarasi", "Banarasi", "Katan silk", 18_500),
    ("kanjivaram", "Kanjivaram", "Mulberry silk", 24_000),
    ("chanderi", "Chanderi", "Silk cotton", 6_800),
    ("paithani", "Paithani", "Silk with zari", 21_000),
    ("tussar", "Tussar", "Tussar silk", 9_500),
    ("patola", "Patola", "Double ikat silk", 32_000),
];

const COLOURWAYS: &[&str] = &[
    "Crimson",
    "Emerald",
    "Mustard",
    "Peacock Blue",
    "Onion Pink",
    "Ivory Gold",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./resham_dev.db");

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
                println!("Resham Catalog Seed Tool");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./resham_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Resham Catalog Seed Tool");
    println!("===========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Catalog already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let mut generated = 0;

    for (weave_idx, (slug, name, fabric, base_rupees)) in WEAVES.iter().enumerate() {
        let category = Category {
            id: format!("cat-{}", slug),
            name: name.to_string(),
            slug: slug.to_string(),
        };

        if db.categories().get_by_slug(slug).await?.is_none() {
            db.categories().insert(&category).await?;
        }

        for (colour_idx, colour) in COLOURWAYS.iter().enumerate() {
            let seed = weave_idx * COLOURWAYS.len() + colour_idx;
            let product = saree(&category, colour, fabric, *base_rupees, seed);

            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.slug, e);
                continue;
            }
            generated += 1;
        }
    }

    println!();
    println!("✓ Generated {} products in {} categories", generated, WEAVES.len());
    println!("✓ Seed complete!");

    Ok(())
}

fn saree(category: &Category, colour: &str, fabric: &str, base_rupees: i64, seed: usize) -> Product {
    let now = Utc::now();
    let name = format!("{} {} Saree", colour, category.name);
    let slug = name.to_lowercase().replace(' ', "-");

    // Colourways vary the price by up to ₹2,500
    let rupees = base_rupees + ((seed * 731) % 2_500) as i64;

    Product {
        id: generate_product_id(),
        name,
        description: Some(format!(
            "Handwoven {} {} with a contrast pallu.",
            category.name.to_lowercase(),
            fabric.to_lowercase()
        )),
        price: Money::from_major_minor(rupees, 0),
        stock: (seed % 7) as i64,
        images: vec![
            format!("/images/{}/{}-front.jpg", category.slug, slug),
            format!("/images/{}/{}-pallu.jpg", category.slug, slug),
        ],
        category_id: Some(category.id.clone()),
        fabric: Some(fabric.to_string()),
        is_active: true,
        created_at: now,
        updated_at: now,
        slug,
    }
}
