use leptos::logging::log;
use rusqlite::{Connection, Error};
use std::sync::Arc;
use tokio::sync::Mutex;

pub mod catalog;
pub mod customers;
pub mod orders;
pub mod reviews;

#[cfg(test)]
pub(crate) mod fixtures;

pub fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
}

pub fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// True when `err` is a UNIQUE constraint (or unique index) failure.
pub fn is_unique_violation(err: &Error) -> bool {
    matches!(
        err,
        Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

// Shared SQLite handle; every method holds the lock for its whole duration.
#[derive(Debug)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(db_path: &str) -> Result<Self, Error> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        log!("[DB] Connection established at: {}", db_path);
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) async fn lock(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }

    /// Creates the commerce tables the store routes read from. The review
    /// tables are owned by the migrations instead.
    pub async fn create_schema(&self) -> Result<(), Error> {
        let conn = self.conn.lock().await;

        // 1. Collections
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS product_collection (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                handle TEXT NOT NULL UNIQUE
            );",
        )
        .map_err(|e| {
            log!("[DB] Failed creating product_collection table: {}", e);
            e
        })?;

        // 2. Products, variants and prices
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS product (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                handle TEXT NOT NULL UNIQUE,
                status TEXT NOT NULL DEFAULT 'draft' CHECK (status IN ('draft', 'published')),
                collection_id TEXT REFERENCES product_collection(id) ON DELETE SET NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS product_variant (
                id TEXT PRIMARY KEY,
                product_id TEXT NOT NULL,
                title TEXT NOT NULL,
                sku TEXT,
                FOREIGN KEY (product_id) REFERENCES product(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS price (
                id TEXT PRIMARY KEY,
                variant_id TEXT NOT NULL,
                currency_code TEXT NOT NULL,
                amount INTEGER NOT NULL,
                FOREIGN KEY (variant_id) REFERENCES product_variant(id) ON DELETE CASCADE
            );",
        )
        .map_err(|e| {
            log!("[DB] Failed creating product tables: {}", e);
            e
        })?;

        // 3. Categories
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS product_category (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                handle TEXT NOT NULL UNIQUE,
                rank INTEGER NOT NULL DEFAULT 0,
                parent_category_id TEXT REFERENCES product_category(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS product_category_product (
                product_id TEXT NOT NULL,
                product_category_id TEXT NOT NULL,
                PRIMARY KEY (product_id, product_category_id),
                FOREIGN KEY (product_id) REFERENCES product(id) ON DELETE CASCADE,
                FOREIGN KEY (product_category_id) REFERENCES product_category(id) ON DELETE CASCADE
            );",
        )
        .map_err(|e| {
            log!("[DB] Failed creating category tables: {}", e);
            e
        })?;

        // 4. Stock locations
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS stock_location (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                address_1 TEXT,
                city TEXT,
                country_code TEXT,
                created_at TEXT NOT NULL
            );",
        )
        .map_err(|e| {
            log!("[DB] Failed creating stock_location table: {}", e);
            e
        })?;

        // 5. Customers and wishlists
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS customer (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                first_name TEXT,
                last_name TEXT
            );
            CREATE TABLE IF NOT EXISTS wishlist_item (
                id TEXT PRIMARY KEY,
                customer_id TEXT NOT NULL,
                product_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (customer_id, product_id),
                FOREIGN KEY (customer_id) REFERENCES customer(id) ON DELETE CASCADE,
                FOREIGN KEY (product_id) REFERENCES product(id) ON DELETE CASCADE
            );",
        )
        .map_err(|e| {
            log!("[DB] Failed creating customer tables: {}", e);
            e
        })?;

        // 6. Orders
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS \"order\" (
                id TEXT PRIMARY KEY,
                display_id INTEGER NOT NULL,
                customer_id TEXT,
                email TEXT NOT NULL,
                fulfillment_status TEXT NOT NULL DEFAULT 'not_fulfilled',
                payment_status TEXT NOT NULL DEFAULT 'awaiting',
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS order_item (
                id TEXT PRIMARY KEY,
                order_id TEXT NOT NULL,
                product_id TEXT NOT NULL,
                title TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                unit_price INTEGER NOT NULL,
                FOREIGN KEY (order_id) REFERENCES \"order\"(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS order_shipment (
                id TEXT PRIMARY KEY,
                order_id TEXT NOT NULL,
                tracking_number TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (order_id) REFERENCES \"order\"(id) ON DELETE CASCADE
            );",
        )
        .map_err(|e| {
            log!("[DB] Failed creating order tables: {}", e);
            e
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_creation() {
        let db = Database::new(":memory:").unwrap();
        db.create_schema().await.unwrap();
        // Running twice must be harmless.
        db.create_schema().await.unwrap();

        let conn = db.lock().await;
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap();
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        for table in [
            "product",
            "product_variant",
            "price",
            "product_category",
            "stock_location",
            "customer",
            "wishlist_item",
            "order",
            "order_item",
            "order_shipment",
        ] {
            assert!(tables.contains(&table.to_string()), "missing {}", table);
        }
    }

    #[test]
    fn test_new_id_prefix() {
        let id = new_id("rev");
        assert!(id.starts_with("rev_"));
        assert_eq!(id.len(), 4 + 32);
    }
}
