use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct LocationAddress {
    pub address_1: Option<String>,
    pub city: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StockLocation {
    pub id: String,
    pub name: String,
    pub address: LocationAddress,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CompanyInfo {
    pub name: String,
    pub email: String,
    pub location: Option<StockLocation>,
}
