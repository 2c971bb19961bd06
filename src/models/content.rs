use serde::{Deserialize, Serialize};

/// Marketing page as stored in the headless content platform.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MarketingPage {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub body: Vec<ContentBlock>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ContentBlock {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub text: String,
}
