use leptos::logging::log;
use rusqlite::{params, Error, OptionalExtension};
use std::collections::HashMap;

use super::{new_id, now, Database};
use crate::models::catalog::{Category, Price, Product, VariantPrices};
use crate::models::company::{LocationAddress, StockLocation};

impl Database {
    pub async fn insert_collection(&self, title: &str, handle: &str) -> Result<String, Error> {
        let conn = self.lock().await;
        let id = new_id("pcol");
        conn.execute(
            "INSERT INTO product_collection (id, title, handle) VALUES (?1, ?2, ?3)",
            params![id, title, handle],
        )?;
        Ok(id)
    }

    pub async fn insert_product(
        &self,
        title: &str,
        handle: &str,
        status: &str,
        collection_id: Option<&str>,
    ) -> Result<String, Error> {
        let conn = self.lock().await;
        let id = new_id("prod");
        let ts = now();
        conn.execute(
            "INSERT INTO product (id, title, handle, status, collection_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![id, title, handle, status, collection_id, ts],
        )?;
        Ok(id)
    }

    pub async fn insert_variant(
        &self,
        product_id: &str,
        title: &str,
        sku: Option<&str>,
    ) -> Result<String, Error> {
        let conn = self.lock().await;
        let id = new_id("variant");
        conn.execute(
            "INSERT INTO product_variant (id, product_id, title, sku) VALUES (?1, ?2, ?3, ?4)",
            params![id, product_id, title, sku],
        )?;
        Ok(id)
    }

    pub async fn insert_price(
        &self,
        variant_id: &str,
        currency_code: &str,
        amount: i64,
    ) -> Result<String, Error> {
        let conn = self.lock().await;
        let id = new_id("price");
        conn.execute(
            "INSERT INTO price (id, variant_id, currency_code, amount) VALUES (?1, ?2, ?3, ?4)",
            params![id, variant_id, currency_code.to_lowercase(), amount],
        )?;
        Ok(id)
    }

    pub async fn get_product(&self, product_id: &str) -> Result<Option<Product>, Error> {
        let conn = self.lock().await;
        conn.query_row(
            "SELECT p.id, p.title, p.handle, p.status, p.collection_id,
                    (SELECT COUNT(*) FROM product_variant v WHERE v.product_id = p.id)
             FROM product p WHERE p.id = ?1",
            [product_id],
            |row| {
                Ok(Product {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    handle: row.get(2)?,
                    status: row.get(3)?,
                    collection_id: row.get(4)?,
                    variant_count: row.get(5)?,
                })
            },
        )
        .optional()
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, Error> {
        let conn = self.lock().await;
        let mut stmt = conn.prepare(
            "SELECT p.id, p.title, p.handle, p.status, p.collection_id,
                    (SELECT COUNT(*) FROM product_variant v WHERE v.product_id = p.id)
             FROM product p
             ORDER BY p.created_at ASC, p.rowid ASC",
        )?;
        let products = stmt
            .query_map([], |row| {
                Ok(Product {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    handle: row.get(2)?,
                    status: row.get(3)?,
                    collection_id: row.get(4)?,
                    variant_count: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log!("[DB] Fetched {} products", products.len());
        Ok(products)
    }

    /// Every variant with whatever prices it has, grouped in catalog order.
    pub async fn list_variant_prices(&self) -> Result<Vec<VariantPrices>, Error> {
        let conn = self.lock().await;
        let mut stmt = conn.prepare(
            "SELECT v.id, p.title, v.title, v.sku, pr.currency_code, pr.amount
             FROM product_variant v
             JOIN product p ON p.id = v.product_id
             LEFT JOIN price pr ON pr.variant_id = v.id
             ORDER BY p.created_at ASC, p.rowid ASC, v.rowid ASC, pr.currency_code ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<i64>>(5)?,
            ))
        })?;

        let mut variants: Vec<VariantPrices> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for row in rows {
            let (variant_id, product_title, variant_title, sku, currency, amount) = row?;
            let index = *positions.entry(variant_id.clone()).or_insert_with(|| {
                variants.push(VariantPrices {
                    variant_id,
                    product_title,
                    variant_title,
                    sku,
                    prices: Vec::new(),
                });
                variants.len() - 1
            });
            if let (Some(currency_code), Some(amount)) = (currency, amount) {
                variants[index].prices.push(Price {
                    currency_code,
                    amount,
                });
            }
        }
        Ok(variants)
    }

    /// Deletes every product; variants, prices and links cascade.
    pub async fn delete_all_products(&self) -> Result<usize, Error> {
        let mut conn = self.lock().await;
        let tx = conn.transaction()?;
        let deleted = tx.execute("DELETE FROM product", [])?;
        tx.commit()?;
        log!("[DB] Deleted {} products", deleted);
        Ok(deleted)
    }

    pub async fn publish_draft_products(&self) -> Result<usize, Error> {
        let conn = self.lock().await;
        conn.execute(
            "UPDATE product SET status = 'published', updated_at = ?1 WHERE status = 'draft'",
            [now()],
        )
    }

    pub async fn insert_category(
        &self,
        name: &str,
        handle: &str,
        rank: i64,
        parent_category_id: Option<&str>,
    ) -> Result<String, Error> {
        let conn = self.lock().await;
        let id = new_id("pcat");
        let ts = now();
        conn.execute(
            "INSERT INTO product_category (id, name, handle, rank, parent_category_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![id, name, handle, rank, parent_category_id, ts],
        )?;
        Ok(id)
    }

    pub async fn link_product_category(
        &self,
        product_id: &str,
        category_id: &str,
    ) -> Result<(), Error> {
        let conn = self.lock().await;
        conn.execute(
            "INSERT OR IGNORE INTO product_category_product (product_id, product_category_id)
             VALUES (?1, ?2)",
            params![product_id, category_id],
        )?;
        Ok(())
    }

    /// Categories in listing order: rank, then creation time.
    pub async fn list_categories(&self) -> Result<Vec<Category>, Error> {
        let conn = self.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, name, handle, rank, parent_category_id
             FROM product_category
             ORDER BY rank ASC, created_at ASC, rowid ASC",
        )?;
        let categories = stmt
            .query_map([], |row| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    handle: row.get(2)?,
                    rank: row.get(3)?,
                    parent_category_id: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    /// Gives the i-th category (listing order) the i-th name. Returns the
    /// number of rows renamed, `min(categories, names)`.
    pub async fn rename_categories(&self, names: &[String]) -> Result<usize, Error> {
        let mut conn = self.lock().await;
        let tx = conn.transaction()?;
        let ids: Vec<String> = {
            let mut stmt = tx.prepare(
                "SELECT id FROM product_category ORDER BY rank ASC, created_at ASC, rowid ASC",
            )?;
            let ids = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            ids
        };

        let ts = now();
        let mut renamed = 0;
        for (id, name) in ids.iter().zip(names) {
            renamed += tx.execute(
                "UPDATE product_category SET name = ?1, updated_at = ?2 WHERE id = ?3",
                params![name, ts, id],
            )?;
        }
        tx.commit()?;
        log!("[DB] Renamed {} categories", renamed);
        Ok(renamed)
    }

    pub async fn insert_stock_location(
        &self,
        name: &str,
        address: &LocationAddress,
    ) -> Result<String, Error> {
        let conn = self.lock().await;
        let id = new_id("sloc");
        conn.execute(
            "INSERT INTO stock_location (id, name, address_1, city, country_code, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                name,
                address.address_1,
                address.city,
                address.country_code,
                now()
            ],
        )?;
        Ok(id)
    }

    /// Stock locations, oldest first.
    pub async fn list_stock_locations(&self) -> Result<Vec<StockLocation>, Error> {
        let conn = self.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, name, address_1, city, country_code
             FROM stock_location
             ORDER BY created_at ASC, rowid ASC",
        )?;
        let locations = stmt
            .query_map([], |row| {
                Ok(StockLocation {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    address: LocationAddress {
                        address_1: row.get(2)?,
                        city: row.get(3)?,
                        country_code: row.get(4)?,
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(locations)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::fixtures::schema_db;

    #[tokio::test]
    async fn test_rename_categories_is_positional() {
        let db = schema_db().await;
        db.insert_category("Second", "second", 1, None).await.unwrap();
        db.insert_category("First", "first", 0, None).await.unwrap();
        db.insert_category("Third", "third", 2, None).await.unwrap();

        let renamed = db
            .rename_categories(&["Mugs".to_string(), "Maps".to_string()])
            .await
            .unwrap();
        assert_eq!(renamed, 2);

        let names: Vec<String> = db
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Mugs", "Maps", "Third"]);
    }

    #[tokio::test]
    async fn test_rename_with_more_names_than_categories() {
        let db = schema_db().await;
        db.insert_category("Only", "only", 0, None).await.unwrap();
        let names: Vec<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
        assert_eq!(db.rename_categories(&names).await.unwrap(), 1);
        assert_eq!(db.list_categories().await.unwrap()[0].name, "A");
    }

    #[tokio::test]
    async fn test_variant_prices_and_clear() {
        let db = schema_db().await;
        let product = db
            .insert_product("Pipe-weed Tin", "pipe-weed-tin", "draft", None)
            .await
            .unwrap();
        let priced = db.insert_variant(&product, "Small", Some("TIN-S")).await.unwrap();
        db.insert_variant(&product, "Large", None).await.unwrap();
        db.insert_price(&priced, "EUR", 1200).await.unwrap();
        db.insert_price(&priced, "usd", 1300).await.unwrap();

        let variants = db.list_variant_prices().await.unwrap();
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].prices.len(), 2);
        assert_eq!(variants[0].prices[0].currency_code, "eur");
        assert!(variants[1].prices.is_empty());

        assert_eq!(db.publish_draft_products().await.unwrap(), 1);
        assert_eq!(db.delete_all_products().await.unwrap(), 1);
        assert!(db.list_variant_prices().await.unwrap().is_empty());
    }
}
