use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WishlistItem {
    pub id: String,
    pub product_id: String,
    pub product_title: String,
    pub created_at: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Wishlist {
    pub customer_id: String,
    pub items: Vec<WishlistItem>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub product_id: String,
    pub title: String,
    pub quantity: i64,
    pub unit_price: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Order {
    pub id: String,
    pub display_id: i64,
    pub customer_id: Option<String>,
    pub email: String,
    pub fulfillment_status: String,
    pub payment_status: String,
    pub items: Vec<OrderItem>,
}
