use crate::container::Container;
use crate::error::StoreError;
use crate::models::customer::Wishlist;

pub async fn wishlist(container: &Container, customer_id: &str) -> Result<Wishlist, StoreError> {
    Ok(container.db.get_wishlist(customer_id).await?)
}

pub async fn add_item(
    container: &Container,
    customer_id: &str,
    product_id: &str,
) -> Result<Wishlist, StoreError> {
    if container.db.get_product(product_id).await?.is_none() {
        return Err(StoreError::NotFound(format!(
            "Product with id {} was not found",
            product_id
        )));
    }
    container.db.add_wishlist_item(customer_id, product_id).await?;
    wishlist(container, customer_id).await
}

pub async fn remove_item(
    container: &Container,
    customer_id: &str,
    product_id: &str,
) -> Result<Wishlist, StoreError> {
    container.db.remove_wishlist_item(customer_id, product_id).await?;
    wishlist(container, customer_id).await
}
