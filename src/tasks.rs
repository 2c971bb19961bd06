//! One-shot operational tasks run through `burrowmart-task`.
//!
//! Tasks are not idempotent and do not resume; rerun `seed` against a fresh
//! database.
use leptos::logging::log;

use crate::auth::{issue_token, ActorType, DEFAULT_TOKEN_TTL_SECS};
use crate::config::StoreConfig;
use crate::db::Database;
use crate::error::StoreError;
use crate::migrations::Migrator;
use crate::models::catalog::{Category, Product, VariantPrices};
use crate::models::company::LocationAddress;
use crate::models::customer::OrderItem;
use crate::services::company::FLAGSHIP_LOCATION;

#[derive(Debug, Clone, PartialEq)]
pub struct SeedSummary {
    pub collections: usize,
    pub categories: usize,
    pub products: usize,
    pub locations: usize,
    pub customer_id: String,
    pub order_id: String,
}

#[derive(Debug, Default)]
pub struct PriceReport {
    pub priced: Vec<VariantPrices>,
    pub missing: Vec<VariantPrices>,
}

struct DemoProduct {
    title: &'static str,
    handle: &'static str,
    status: &'static str,
    collection: usize,
    category: usize,
    variants: &'static [(&'static str, &'static str, &'static [(&'static str, i64)])],
}

const DEMO_COLLECTIONS: &[(&str, &str)] = &[("Travel Gear", "travel-gear"), ("Kitchen", "kitchen")];

const DEMO_CATEGORIES: &[(&str, &str)] = &[
    ("Cloaks", "cloaks"),
    ("Rope", "rope"),
    ("Cookware", "cookware"),
];

const DEMO_PRODUCTS: &[DemoProduct] = &[
    DemoProduct {
        title: "Elven Cloak",
        handle: "elven-cloak",
        status: "published",
        collection: 0,
        category: 0,
        variants: &[
            ("Grey / S", "CLOAK-GREY-S", &[("eur", 4500), ("usd", 4900)]),
            ("Grey / L", "CLOAK-GREY-L", &[("eur", 4500), ("usd", 4900)]),
        ],
    },
    DemoProduct {
        title: "Elven Rope",
        handle: "elven-rope",
        status: "published",
        collection: 0,
        category: 1,
        variants: &[("30 ells", "ROPE-30", &[("eur", 3000), ("usd", 3300)])],
    },
    DemoProduct {
        title: "Cast Iron Pan",
        handle: "cast-iron-pan",
        status: "draft",
        collection: 1,
        category: 2,
        variants: &[
            ("10 inch", "PAN-10", &[("eur", 2800)]),
            ("12 inch", "PAN-12", &[]),
        ],
    },
];

pub async fn migrate(db: &Database, revert: Option<usize>) -> Result<Vec<&'static str>, StoreError> {
    let migrator = Migrator::reviews()?;
    let names = match revert {
        Some(steps) => migrator.down(db, steps).await?,
        None => migrator.up(db).await?,
    };
    log!(
        "[TASK] {} {} migrations",
        if revert.is_some() { "Reverted" } else { "Applied" },
        names.len()
    );
    Ok(names)
}

/// Demo catalog with a draft product, a variant without prices, two stock
/// locations (the flagship created last) and one customer order.
pub async fn seed_demo_data(db: &Database) -> Result<SeedSummary, StoreError> {
    let mut collection_ids = Vec::new();
    for (title, handle) in DEMO_COLLECTIONS {
        collection_ids.push(db.insert_collection(title, handle).await?);
    }

    let mut category_ids = Vec::new();
    for (rank, (name, handle)) in DEMO_CATEGORIES.iter().enumerate() {
        category_ids.push(db.insert_category(name, handle, rank as i64, None).await?);
    }

    let mut order_items = Vec::new();
    for product in DEMO_PRODUCTS {
        let product_id = db
            .insert_product(
                product.title,
                product.handle,
                product.status,
                collection_ids.get(product.collection).map(String::as_str),
            )
            .await?;
        if let Some(category_id) = category_ids.get(product.category) {
            db.link_product_category(&product_id, category_id).await?;
        }
        for (title, sku, prices) in product.variants {
            let variant_id = db.insert_variant(&product_id, title, Some(*sku)).await?;
            for (currency, amount) in prices.iter() {
                db.insert_price(&variant_id, currency, *amount).await?;
            }
        }
        if product.status == "published" {
            let unit_price = product
                .variants
                .first()
                .and_then(|(_, _, prices)| prices.first())
                .map(|(_, amount)| *amount)
                .unwrap_or_default();
            order_items.push(OrderItem {
                product_id,
                title: product.title.to_string(),
                quantity: 1,
                unit_price,
            });
        }
    }

    db.insert_stock_location(
        "Bag End Warehouse",
        &LocationAddress {
            address_1: Some("1 Bagshot Row".into()),
            city: Some("Hobbiton".into()),
            country_code: Some("nz".into()),
        },
    )
    .await?;
    db.insert_stock_location(
        FLAGSHIP_LOCATION,
        &LocationAddress {
            address_1: Some("3 Party Field Lane".into()),
            city: Some("Hobbiton".into()),
            country_code: Some("nz".into()),
        },
    )
    .await?;

    let customer_id = db
        .insert_customer("frodo@shire.me", Some("Frodo"), Some("Baggins"))
        .await?;
    let order_id = db
        .insert_order(Some(&customer_id), "frodo@shire.me", &order_items)
        .await?;

    let summary = SeedSummary {
        collections: collection_ids.len(),
        categories: category_ids.len(),
        products: DEMO_PRODUCTS.len(),
        locations: 2,
        customer_id,
        order_id,
    };
    log!("[TASK] Seeded {:?}", summary);
    Ok(summary)
}

pub async fn list_products(db: &Database) -> Result<Vec<Product>, StoreError> {
    Ok(db.list_products().await?)
}

/// Splits variants into those with at least one price and those with none.
pub async fn check_prices(db: &Database) -> Result<PriceReport, StoreError> {
    let (priced, missing) = db
        .list_variant_prices()
        .await?
        .into_iter()
        .partition(|variant| !variant.prices.is_empty());
    Ok(PriceReport { priced, missing })
}

pub async fn list_categories(db: &Database) -> Result<Vec<Category>, StoreError> {
    Ok(db.list_categories().await?)
}

pub async fn clear_products(db: &Database) -> Result<usize, StoreError> {
    Ok(db.delete_all_products().await?)
}

pub async fn rename_categories(db: &Database, names: &[String]) -> Result<usize, StoreError> {
    Ok(db.rename_categories(names).await?)
}

pub async fn publish_products(db: &Database) -> Result<usize, StoreError> {
    let published = db.publish_draft_products().await?;
    log!("[TASK] Published {} draft products", published);
    Ok(published)
}

pub fn issue_local_token(
    config: &StoreConfig,
    actor_id: &str,
    admin: bool,
) -> Result<String, StoreError> {
    let actor_type = if admin {
        ActorType::User
    } else {
        ActorType::Customer
    };
    Ok(issue_token(
        actor_id,
        actor_type,
        &config.jwt_secret,
        DEFAULT_TOKEN_TTL_SECS,
    )?)
}
