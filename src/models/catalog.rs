use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub handle: String,
    pub status: String,
    pub collection_id: Option<String>,
    pub variant_count: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Price {
    pub currency_code: String,
    pub amount: i64, // minor units
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VariantPrices {
    pub variant_id: String,
    pub product_title: String,
    pub variant_title: String,
    pub sku: Option<String>,
    pub prices: Vec<Price>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub handle: String,
    pub rank: i64,
    pub parent_category_id: Option<String>,
}
