// Shared setup for the HTTP integration tests.
use actix_web::web;
use burrowmart::auth::{issue_token, ActorType, DEFAULT_TOKEN_TTL_SECS};
use burrowmart::config::StoreConfig;
use burrowmart::container::Container;
use burrowmart::models::customer::OrderItem;

/// Builds the actix test service with every JSON route registered.
#[macro_export]
macro_rules! store_app {
    ($container:expr) => {{
        let config = $container.config.clone();
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($container.clone())
                .configure(|cfg| burrowmart::api::configure(cfg, &config)),
        )
        .await
    }};
}

pub struct Purchase {
    pub product_id: String,
    pub customer_id: String,
    pub order_id: String,
}

pub async fn test_container() -> web::Data<Container> {
    test_container_with(StoreConfig::for_tests()).await
}

pub async fn test_container_with(config: StoreConfig) -> web::Data<Container> {
    let container = Container::bootstrap(config)
        .await
        .expect("in-memory container");
    web::Data::new(container)
}

/// A published product bought once by a customer.
pub async fn purchase(container: &Container) -> Purchase {
    let db = &container.db;
    let collection_id = db.insert_collection("Pipe-weed", "pipe-weed").await.unwrap();
    let product_id = db
        .insert_product("Longbottom Leaf", "longbottom-leaf", "published", Some(&collection_id))
        .await
        .unwrap();
    let customer_id = db
        .insert_customer("merry@buckland.me", Some("Meriadoc"), Some("Brandybuck"))
        .await
        .unwrap();
    let order_id = db
        .insert_order(
            Some(&customer_id),
            "merry@buckland.me",
            &[OrderItem {
                product_id: product_id.clone(),
                title: "Longbottom Leaf".into(),
                quantity: 2,
                unit_price: 1200,
            }],
        )
        .await
        .unwrap();
    Purchase {
        product_id,
        customer_id,
        order_id,
    }
}

pub fn bearer(container: &Container, actor_id: &str, actor_type: ActorType) -> (String, String) {
    let token = issue_token(
        actor_id,
        actor_type,
        &container.config.jwt_secret,
        DEFAULT_TOKEN_TTL_SECS,
    )
    .unwrap();
    ("Authorization".to_string(), format!("Bearer {}", token))
}
