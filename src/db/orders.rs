use rusqlite::{params, Error, OptionalExtension};

use super::{new_id, now, Database};
use crate::models::customer::{Order, OrderItem};

impl Database {
    pub async fn insert_order(
        &self,
        customer_id: Option<&str>,
        email: &str,
        items: &[OrderItem],
    ) -> Result<String, Error> {
        let mut conn = self.lock().await;
        let tx = conn.transaction()?;
        let id = new_id("order");
        let display_id: i64 = tx.query_row(
            "SELECT COALESCE(MAX(display_id), 0) + 1 FROM \"order\"",
            [],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT INTO \"order\" (id, display_id, customer_id, email, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, display_id, customer_id, email, now()],
        )?;
        for item in items {
            tx.execute(
                "INSERT INTO order_item (id, order_id, product_id, title, quantity, unit_price)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    new_id("ordli"),
                    id,
                    item.product_id,
                    item.title,
                    item.quantity,
                    item.unit_price
                ],
            )?;
        }
        tx.commit()?;
        Ok(id)
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Option<Order>, Error> {
        let conn = self.lock().await;
        let order = conn
            .query_row(
                "SELECT id, display_id, customer_id, email, fulfillment_status, payment_status
                 FROM \"order\" WHERE id = ?1",
                [order_id],
                |row| {
                    Ok(Order {
                        id: row.get(0)?,
                        display_id: row.get(1)?,
                        customer_id: row.get(2)?,
                        email: row.get(3)?,
                        fulfillment_status: row.get(4)?,
                        payment_status: row.get(5)?,
                        items: Vec::new(),
                    })
                },
            )
            .optional()?;

        let Some(mut order) = order else {
            return Ok(None);
        };
        let mut stmt = conn.prepare(
            "SELECT product_id, title, quantity, unit_price
             FROM order_item WHERE order_id = ?1 ORDER BY rowid ASC",
        )?;
        order.items = stmt
            .query_map([order_id], |row| {
                Ok(OrderItem {
                    product_id: row.get(0)?,
                    title: row.get(1)?,
                    quantity: row.get(2)?,
                    unit_price: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(order))
    }

    /// True when `order_id` belongs to `customer_id` and has a line for `product_id`.
    pub async fn customer_purchased(
        &self,
        customer_id: &str,
        order_id: &str,
        product_id: &str,
    ) -> Result<bool, Error> {
        let conn = self.lock().await;
        let found: i64 = conn.query_row(
            "SELECT COUNT(*) FROM \"order\" o
             JOIN order_item i ON i.order_id = o.id
             WHERE o.id = ?1 AND o.customer_id = ?2 AND i.product_id = ?3",
            params![order_id, customer_id, product_id],
            |row| row.get(0),
        )?;
        Ok(found > 0)
    }

    /// Sets the fulfillment status and returns the previous one.
    pub async fn set_fulfillment_status(
        &self,
        order_id: &str,
        status: &str,
    ) -> Result<Option<String>, Error> {
        let mut conn = self.lock().await;
        let tx = conn.transaction()?;
        let previous: Option<String> = tx
            .query_row(
                "SELECT fulfillment_status FROM \"order\" WHERE id = ?1",
                [order_id],
                |row| row.get(0),
            )
            .optional()?;
        if previous.is_some() {
            tx.execute(
                "UPDATE \"order\" SET fulfillment_status = ?1 WHERE id = ?2",
                params![status, order_id],
            )?;
        }
        tx.commit()?;
        Ok(previous)
    }

    pub async fn set_payment_status(&self, order_id: &str, status: &str) -> Result<usize, Error> {
        let conn = self.lock().await;
        conn.execute(
            "UPDATE \"order\" SET payment_status = ?1 WHERE id = ?2",
            params![status, order_id],
        )
    }

    pub async fn add_shipments(
        &self,
        order_id: &str,
        tracking_numbers: &[String],
    ) -> Result<Vec<String>, Error> {
        let mut conn = self.lock().await;
        let tx = conn.transaction()?;
        let ts = now();
        let mut ids = Vec::with_capacity(tracking_numbers.len());
        for tracking_number in tracking_numbers {
            let id = new_id("ship");
            tx.execute(
                "INSERT INTO order_shipment (id, order_id, tracking_number, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, order_id, tracking_number, ts],
            )?;
            ids.push(id);
        }
        tx.commit()?;
        Ok(ids)
    }

    pub async fn remove_shipments(&self, shipment_ids: &[String]) -> Result<usize, Error> {
        let conn = self.lock().await;
        let mut removed = 0;
        for id in shipment_ids {
            removed += conn.execute("DELETE FROM order_shipment WHERE id = ?1", [id])?;
        }
        Ok(removed)
    }

    pub async fn list_tracking_numbers(&self, order_id: &str) -> Result<Vec<String>, Error> {
        let conn = self.lock().await;
        let mut stmt = conn.prepare(
            "SELECT tracking_number FROM order_shipment WHERE order_id = ?1 ORDER BY rowid ASC",
        )?;
        let numbers = stmt
            .query_map([order_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(numbers)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::fixtures::{schema_db, seed_shop};

    #[tokio::test]
    async fn test_order_roundtrip_and_purchase_check() {
        let db = schema_db().await;
        let shop = seed_shop(&db).await;

        let order = db.get_order(&shop.order_id).await.unwrap().unwrap();
        assert_eq!(order.display_id, 1);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.fulfillment_status, "not_fulfilled");

        assert!(db
            .customer_purchased(&shop.customer_id, &shop.order_id, &shop.product_id)
            .await
            .unwrap());
        assert!(!db
            .customer_purchased("cus_other", &shop.order_id, &shop.product_id)
            .await
            .unwrap());
        assert!(db.get_order("order_missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fulfillment_status_returns_previous() {
        let db = schema_db().await;
        let shop = seed_shop(&db).await;
        let previous = db
            .set_fulfillment_status(&shop.order_id, "shipped")
            .await
            .unwrap();
        assert_eq!(previous.as_deref(), Some("not_fulfilled"));
        assert_eq!(
            db.set_fulfillment_status("order_missing", "shipped").await.unwrap(),
            None
        );
    }
}
