use rusqlite::{params, Error, OptionalExtension};

use super::{new_id, now, Database};
use crate::models::customer::{Wishlist, WishlistItem};

impl Database {
    pub async fn insert_customer(
        &self,
        email: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<String, Error> {
        let conn = self.lock().await;
        let id = new_id("cus");
        conn.execute(
            "INSERT INTO customer (id, email, first_name, last_name) VALUES (?1, ?2, ?3, ?4)",
            params![id, email, first_name, last_name],
        )?;
        Ok(id)
    }

    pub async fn get_customer_email(&self, customer_id: &str) -> Result<Option<String>, Error> {
        let conn = self.lock().await;
        conn.query_row(
            "SELECT email FROM customer WHERE id = ?1",
            [customer_id],
            |row| row.get(0),
        )
        .optional()
    }

    pub async fn get_wishlist(&self, customer_id: &str) -> Result<Wishlist, Error> {
        let conn = self.lock().await;
        let mut stmt = conn.prepare(
            "SELECT w.id, w.product_id, p.title, w.created_at
             FROM wishlist_item w
             JOIN product p ON p.id = w.product_id
             WHERE w.customer_id = ?1
             ORDER BY w.created_at ASC, w.rowid ASC",
        )?;
        let items = stmt
            .query_map([customer_id], |row| {
                Ok(WishlistItem {
                    id: row.get(0)?,
                    product_id: row.get(1)?,
                    product_title: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Wishlist {
            customer_id: customer_id.to_string(),
            items,
        })
    }

    /// Adds a product to the wishlist; adding it twice keeps a single entry.
    pub async fn add_wishlist_item(&self, customer_id: &str, product_id: &str) -> Result<(), Error> {
        let conn = self.lock().await;
        conn.execute(
            "INSERT OR IGNORE INTO wishlist_item (id, customer_id, product_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![new_id("wli"), customer_id, product_id, now()],
        )?;
        Ok(())
    }

    pub async fn remove_wishlist_item(
        &self,
        customer_id: &str,
        product_id: &str,
    ) -> Result<usize, Error> {
        let conn = self.lock().await;
        conn.execute(
            "DELETE FROM wishlist_item WHERE customer_id = ?1 AND product_id = ?2",
            params![customer_id, product_id],
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::db::fixtures::{schema_db, seed_shop};

    #[tokio::test]
    async fn test_wishlist_lifecycle() {
        let db = schema_db().await;
        let shop = seed_shop(&db).await;

        assert!(db.get_wishlist(&shop.customer_id).await.unwrap().items.is_empty());

        db.add_wishlist_item(&shop.customer_id, &shop.product_id).await.unwrap();
        db.add_wishlist_item(&shop.customer_id, &shop.product_id).await.unwrap();
        let wishlist = db.get_wishlist(&shop.customer_id).await.unwrap();
        assert_eq!(wishlist.items.len(), 1);
        assert_eq!(wishlist.items[0].product_title, "Elven Rope");

        let removed = db
            .remove_wishlist_item(&shop.customer_id, &shop.product_id)
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(db.get_wishlist(&shop.customer_id).await.unwrap().items.is_empty());
    }
}
