// Test helpers shared by the database, service and workflow tests.
use super::{new_id, now, Database};
use crate::migrations::Migrator;
use crate::models::customer::OrderItem;
use crate::models::review::{Review, ReviewStatus};

pub(crate) struct Shop {
    pub collection_id: String,
    pub product_id: String,
    pub customer_id: String,
    pub order_id: String,
}

pub(crate) async fn schema_db() -> Database {
    let db = Database::new(":memory:").unwrap();
    db.create_schema().await.unwrap();
    db
}

pub(crate) async fn migrated_db() -> Database {
    let db = schema_db().await;
    Migrator::reviews().unwrap().up(&db).await.unwrap();
    db
}

/// One collection, one product, one customer who ordered that product.
pub(crate) async fn seed_shop(db: &Database) -> Shop {
    let collection_id = db.insert_collection("Travel Gear", "travel-gear").await.unwrap();
    let product_id = db
        .insert_product("Elven Rope", "elven-rope", "published", Some(&collection_id))
        .await
        .unwrap();
    let customer_id = db
        .insert_customer("sam@shire.me", Some("Sam"), Some("Gamgee"))
        .await
        .unwrap();
    let order_id = db
        .insert_order(
            Some(&customer_id),
            "sam@shire.me",
            &[OrderItem {
                product_id: product_id.clone(),
                title: "Elven Rope".into(),
                quantity: 1,
                unit_price: 3000,
            }],
        )
        .await
        .unwrap();
    Shop {
        collection_id,
        product_id,
        customer_id,
        order_id,
    }
}

pub(crate) fn review_for(shop: &Shop, rating: i64) -> Review {
    let ts = now();
    Review {
        id: new_id("rev"),
        title: None,
        content: "Holds fast and unties when asked".into(),
        rating,
        first_name: "Sam".into(),
        last_name: "Gamgee".into(),
        status: ReviewStatus::Pending,
        product_id: shop.product_id.clone(),
        customer_id: Some(shop.customer_id.clone()),
        order_id: shop.order_id.clone(),
        collection_id: Some(shop.collection_id.clone()),
        created_at: ts.clone(),
        updated_at: ts,
        deleted_at: None,
    }
}
