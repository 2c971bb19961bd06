//! Schema versioning for the review tables.
//!
//! Migrations are applied in strictly increasing timestamp order, each in its
//! own transaction, and recorded in `schema_migrations`.
use leptos::logging::log;
use rusqlite::params;
use thiserror::Error;

use crate::db::{now, Database};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("migration database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("migration name '{0}' does not carry a Migration<YYYYMMDDhhmmss> timestamp")]
    BadName(&'static str),
    #[error("migration '{next}' is not newer than '{previous}'")]
    OutOfOrder {
        previous: &'static str,
        next: &'static str,
    },
    #[error("applied migration '{0}' is unknown to this build")]
    UnknownApplied(String),
    #[error("migration '{name}' failed: {source}")]
    Failed {
        name: &'static str,
        source: rusqlite::Error,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub name: &'static str,
    pub up: &'static str,
    pub down: &'static str,
}

impl Migration {
    pub fn timestamp(&self) -> Option<u64> {
        let digits = self.name.strip_prefix("Migration")?;
        if digits.len() != 14 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

pub const REVIEW_MIGRATIONS: &[Migration] = &[
    Migration {
        name: "Migration20250301120000",
        up: "CREATE TABLE IF NOT EXISTS review (
                id TEXT PRIMARY KEY,
                title TEXT NULL,
                content TEXT NOT NULL,
                rating INTEGER NOT NULL CHECK (rating >= 1 AND rating <= 5),
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'approved', 'rejected')),
                product_id TEXT NOT NULL,
                customer_id TEXT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                deleted_at TEXT NULL
            );
            CREATE INDEX IF NOT EXISTS IDX_REVIEW_PRODUCT_ID
                ON review (product_id) WHERE deleted_at IS NULL;",
        down: "DROP TABLE IF EXISTS review;",
    },
    Migration {
        name: "Migration20250315093000",
        up: "ALTER TABLE review ADD COLUMN order_id TEXT NULL;
            CREATE INDEX IF NOT EXISTS IDX_REVIEW_ORDER_ID
                ON review (order_id) WHERE deleted_at IS NULL;",
        down: "DROP INDEX IF EXISTS IDX_REVIEW_ORDER_ID;
            ALTER TABLE review DROP COLUMN order_id;",
    },
    // Legacy rows predate purchase-gated reviews and get a placeholder order.
    Migration {
        name: "Migration20250402110000",
        up: "UPDATE review SET order_id = 'order_legacy_' || id WHERE order_id IS NULL;
            CREATE TABLE review_rebuild (
                id TEXT PRIMARY KEY,
                title TEXT NULL,
                content TEXT NOT NULL,
                rating INTEGER NOT NULL CHECK (rating >= 1 AND rating <= 5),
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'approved', 'rejected')),
                product_id TEXT NOT NULL,
                customer_id TEXT NULL,
                order_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                deleted_at TEXT NULL
            );
            INSERT INTO review_rebuild (id, title, content, rating, first_name, last_name, status,
                product_id, customer_id, order_id, created_at, updated_at, deleted_at)
            SELECT id, title, content, rating, first_name, last_name, status,
                product_id, customer_id, order_id, created_at, updated_at, deleted_at
            FROM review;
            DROP TABLE review;
            ALTER TABLE review_rebuild RENAME TO review;
            CREATE INDEX IF NOT EXISTS IDX_REVIEW_PRODUCT_ID
                ON review (product_id) WHERE deleted_at IS NULL;
            CREATE INDEX IF NOT EXISTS IDX_REVIEW_ORDER_ID
                ON review (order_id) WHERE deleted_at IS NULL;",
        down: "CREATE TABLE review_rebuild (
                id TEXT PRIMARY KEY,
                title TEXT NULL,
                content TEXT NOT NULL,
                rating INTEGER NOT NULL CHECK (rating >= 1 AND rating <= 5),
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'approved', 'rejected')),
                product_id TEXT NOT NULL,
                customer_id TEXT NULL,
                order_id TEXT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                deleted_at TEXT NULL
            );
            INSERT INTO review_rebuild SELECT id, title, content, rating, first_name, last_name,
                status, product_id, customer_id, order_id, created_at, updated_at, deleted_at
            FROM review;
            DROP TABLE review;
            ALTER TABLE review_rebuild RENAME TO review;
            CREATE INDEX IF NOT EXISTS IDX_REVIEW_PRODUCT_ID
                ON review (product_id) WHERE deleted_at IS NULL;
            CREATE INDEX IF NOT EXISTS IDX_REVIEW_ORDER_ID
                ON review (order_id) WHERE deleted_at IS NULL;",
    },
    Migration {
        name: "Migration20250420150000",
        up: "ALTER TABLE review ADD COLUMN collection_id TEXT NULL;
            CREATE INDEX IF NOT EXISTS IDX_REVIEW_COLLECTION_ID
                ON review (collection_id) WHERE deleted_at IS NULL;",
        down: "DROP INDEX IF EXISTS IDX_REVIEW_COLLECTION_ID;
            ALTER TABLE review DROP COLUMN collection_id;",
    },
    Migration {
        name: "Migration20250501080000",
        up: "CREATE TABLE IF NOT EXISTS review_collection_link (
                id TEXT PRIMARY KEY,
                review_id TEXT NOT NULL,
                collection_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                deleted_at TEXT NULL,
                UNIQUE (review_id, collection_id),
                FOREIGN KEY (review_id) REFERENCES review(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS IDX_REVIEW_COLLECTION_LINK_COLLECTION_ID
                ON review_collection_link (collection_id) WHERE deleted_at IS NULL;",
        down: "DROP TABLE IF EXISTS review_collection_link;",
    },
    // One live review per order line. Older duplicates keep the earliest row.
    Migration {
        name: "Migration20250515090000",
        up: "UPDATE review SET deleted_at = updated_at
            WHERE deleted_at IS NULL AND EXISTS (
                SELECT 1 FROM review AS earlier
                WHERE earlier.order_id = review.order_id
                    AND earlier.product_id = review.product_id
                    AND earlier.deleted_at IS NULL
                    AND (earlier.created_at < review.created_at
                        OR (earlier.created_at = review.created_at AND earlier.id < review.id))
            );
            CREATE UNIQUE INDEX IF NOT EXISTS IDX_REVIEW_ORDER_PRODUCT_LIVE
                ON review (order_id, product_id) WHERE deleted_at IS NULL;",
        down: "DROP INDEX IF EXISTS IDX_REVIEW_ORDER_PRODUCT_LIVE;",
    },
];

pub struct Migrator {
    migrations: &'static [Migration],
}

impl Migrator {
    pub fn new(migrations: &'static [Migration]) -> Result<Self, MigrationError> {
        let mut previous: Option<(&'static str, u64)> = None;
        for migration in migrations {
            let ts = migration
                .timestamp()
                .ok_or(MigrationError::BadName(migration.name))?;
            if let Some((previous_name, previous_ts)) = previous {
                if ts <= previous_ts {
                    return Err(MigrationError::OutOfOrder {
                        previous: previous_name,
                        next: migration.name,
                    });
                }
            }
            previous = Some((migration.name, ts));
        }
        Ok(Migrator { migrations })
    }

    pub fn reviews() -> Result<Self, MigrationError> {
        Self::new(REVIEW_MIGRATIONS)
    }

    /// Names of applied migrations, oldest first.
    pub async fn applied(&self, db: &Database) -> Result<Vec<String>, MigrationError> {
        let conn = db.lock().await;
        ensure_table(&conn)?;
        let mut stmt = conn.prepare("SELECT name FROM schema_migrations ORDER BY name ASC")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    pub async fn pending(&self, db: &Database) -> Result<Vec<&'static str>, MigrationError> {
        let applied = self.applied(db).await?;
        for name in &applied {
            if !self.migrations.iter().any(|m| m.name == name) {
                return Err(MigrationError::UnknownApplied(name.clone()));
            }
        }
        Ok(self
            .migrations
            .iter()
            .filter(|m| !applied.iter().any(|a| a == m.name))
            .map(|m| m.name)
            .collect())
    }

    /// Applies every pending migration, returning the names that ran.
    pub async fn up(&self, db: &Database) -> Result<Vec<&'static str>, MigrationError> {
        let pending = self.pending(db).await?;
        let mut conn = db.lock().await;
        for name in &pending {
            let Some(migration) = self.migrations.iter().find(|m| m.name == *name) else {
                continue;
            };
            log!("[MIGRATION] Applying {}", migration.name);
            let tx = conn.transaction()?;
            tx.execute_batch(migration.up)
                .map_err(|source| MigrationError::Failed {
                    name: migration.name,
                    source,
                })?;
            tx.execute(
                "INSERT INTO schema_migrations (name, executed_at) VALUES (?1, ?2)",
                params![migration.name, now()],
            )?;
            tx.commit()?;
        }
        if pending.is_empty() {
            log!("[MIGRATION] Schema is up to date");
        }
        Ok(pending)
    }

    /// Reverts the `steps` most recently applied migrations, newest first.
    pub async fn down(&self, db: &Database, steps: usize) -> Result<Vec<&'static str>, MigrationError> {
        let applied = self.applied(db).await?;
        let mut reverted = Vec::new();
        let mut conn = db.lock().await;
        for name in applied.iter().rev().take(steps) {
            let migration = self
                .migrations
                .iter()
                .find(|m| m.name == name)
                .ok_or_else(|| MigrationError::UnknownApplied(name.clone()))?;
            log!("[MIGRATION] Reverting {}", migration.name);
            let tx = conn.transaction()?;
            tx.execute_batch(migration.down)
                .map_err(|source| MigrationError::Failed {
                    name: migration.name,
                    source,
                })?;
            tx.execute(
                "DELETE FROM schema_migrations WHERE name = ?1",
                params![migration.name],
            )?;
            tx.commit()?;
            reverted.push(migration.name);
        }
        Ok(reverted)
    }
}

fn ensure_table(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            name TEXT PRIMARY KEY,
            executed_at TEXT NOT NULL
        );",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn empty_db() -> Database {
        Database::new(":memory:").unwrap()
    }

    async fn review_count_outside_rating_range(db: &Database) -> i64 {
        let conn = db.lock().await;
        conn.query_row(
            "SELECT COUNT(*) FROM review WHERE rating NOT BETWEEN 1 AND 5",
            [],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_applies_in_order_and_is_idempotent() {
        let db = empty_db().await;
        let migrator = Migrator::reviews().unwrap();

        let ran = migrator.up(&db).await.unwrap();
        assert_eq!(ran.len(), REVIEW_MIGRATIONS.len());
        assert_eq!(ran[0], "Migration20250301120000");

        let ran_again = migrator.up(&db).await.unwrap();
        assert!(ran_again.is_empty());
        assert!(migrator.pending(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rating_check_constraint() {
        let db = empty_db().await;
        Migrator::reviews().unwrap().up(&db).await.unwrap();

        let conn = db.lock().await;
        for rating in [0, 6, -1] {
            let result = conn.execute(
                "INSERT INTO review (id, content, rating, first_name, last_name, product_id,
                    order_id, created_at, updated_at)
                 VALUES (?1, 'text', ?2, 'Frodo', 'Baggins', 'prod_1', 'order_1', 'now', 'now')",
                params![format!("rev_{}", rating), rating],
            );
            assert!(result.is_err(), "rating {} should be rejected", rating);
        }
        conn.execute(
            "INSERT INTO review (id, content, rating, first_name, last_name, product_id,
                order_id, created_at, updated_at)
             VALUES ('rev_ok', 'text', 5, 'Frodo', 'Baggins', 'prod_1', 'order_1', 'now', 'now')",
            [],
        )
        .unwrap();
        drop(conn);
        assert_eq!(review_count_outside_rating_range(&db).await, 0);
    }

    #[tokio::test]
    async fn test_legacy_rows_get_placeholder_order() {
        let db = empty_db().await;
        let first_two: &'static [Migration] = &REVIEW_MIGRATIONS[..2];
        Migrator::new(first_two).unwrap().up(&db).await.unwrap();

        {
            let conn = db.lock().await;
            conn.execute(
                "INSERT INTO review (id, content, rating, first_name, last_name, product_id,
                    created_at, updated_at)
                 VALUES ('rev_legacy', 'old', 4, 'Sam', 'Gamgee', 'prod_1', 'then', 'then')",
                [],
            )
            .unwrap();
        }

        Migrator::reviews().unwrap().up(&db).await.unwrap();

        let conn = db.lock().await;
        let order_id: String = conn
            .query_row(
                "SELECT order_id FROM review WHERE id = 'rev_legacy'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(order_id, "order_legacy_rev_legacy");

        let null_insert = conn.execute(
            "INSERT INTO review (id, content, rating, first_name, last_name, product_id,
                created_at, updated_at)
             VALUES ('rev_new', 'new', 4, 'Sam', 'Gamgee', 'prod_1', 'now', 'now')",
            [],
        );
        assert!(null_insert.is_err(), "order_id must be required after tightening");
    }

    fn insert_live_review(
        conn: &rusqlite::Connection,
        id: &str,
        created_at: &str,
    ) -> Result<usize, rusqlite::Error> {
        conn.execute(
            "INSERT INTO review (id, content, rating, first_name, last_name, product_id,
                order_id, created_at, updated_at)
             VALUES (?1, 'text', 5, 'Frodo', 'Baggins', 'prod_1', 'order_1', ?2, ?2)",
            params![id, created_at],
        )
    }

    #[tokio::test]
    async fn test_one_live_review_per_order_line() {
        let db = empty_db().await;
        Migrator::reviews().unwrap().up(&db).await.unwrap();

        let conn = db.lock().await;
        insert_live_review(&conn, "rev_1", "2025-05-01").unwrap();
        let second = insert_live_review(&conn, "rev_2", "2025-05-02").unwrap_err();
        assert!(crate::db::is_unique_violation(&second));

        // Soft-deleted rows free the slot
        conn.execute("UPDATE review SET deleted_at = 'now' WHERE id = 'rev_1'", [])
            .unwrap();
        insert_live_review(&conn, "rev_2", "2025-05-02").unwrap();
    }

    #[tokio::test]
    async fn test_existing_duplicates_keep_earliest() {
        let db = empty_db().await;
        let before_index: &'static [Migration] = &REVIEW_MIGRATIONS[..REVIEW_MIGRATIONS.len() - 1];
        Migrator::new(before_index).unwrap().up(&db).await.unwrap();
        {
            let conn = db.lock().await;
            insert_live_review(&conn, "rev_late", "2025-05-03").unwrap();
            insert_live_review(&conn, "rev_early", "2025-05-01").unwrap();
        }

        Migrator::reviews().unwrap().up(&db).await.unwrap();

        let conn = db.lock().await;
        let live: Vec<String> = conn
            .prepare("SELECT id FROM review WHERE deleted_at IS NULL")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(live, vec!["rev_early".to_string()]);
    }

    #[tokio::test]
    async fn test_down_then_up_again() {
        let db = empty_db().await;
        let migrator = Migrator::reviews().unwrap();
        migrator.up(&db).await.unwrap();

        let reverted = migrator.down(&db, 2).await.unwrap();
        assert_eq!(
            reverted,
            vec!["Migration20250515090000", "Migration20250501080000"]
        );
        assert_eq!(migrator.pending(&db).await.unwrap().len(), 2);

        let reverted = migrator.down(&db, REVIEW_MIGRATIONS.len()).await.unwrap();
        assert_eq!(reverted.len(), REVIEW_MIGRATIONS.len() - 2);

        let ran = migrator.up(&db).await.unwrap();
        assert_eq!(ran.len(), REVIEW_MIGRATIONS.len());
    }

    #[test]
    fn test_rejects_out_of_order_list() {
        static SWAPPED: [Migration; 2] = [
            Migration {
                name: "Migration20250402110000",
                up: "",
                down: "",
            },
            Migration {
                name: "Migration20250301120000",
                up: "",
                down: "",
            },
        ];
        assert!(matches!(
            Migrator::new(&SWAPPED),
            Err(MigrationError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_name() {
        static BAD: [Migration; 1] = [Migration {
            name: "AddReviewTable",
            up: "",
            down: "",
        }];
        assert!(matches!(Migrator::new(&BAD), Err(MigrationError::BadName(_))));
    }
}
