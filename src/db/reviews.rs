use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Value, ValueRef};
use rusqlite::{params, params_from_iter, Error, OptionalExtension, Row, ToSql};

use super::{new_id, now, Database};
use crate::models::review::{CollectionRating, Review, ReviewStatus};

impl FromSql for ReviewStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

impl ToSql for ReviewStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

const REVIEW_COLUMNS: &str = "id, title, content, rating, first_name, last_name, status,
    product_id, customer_id, order_id, collection_id, created_at, updated_at, deleted_at";

fn review_from_row(row: &Row<'_>) -> Result<Review, Error> {
    Ok(Review {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        rating: row.get(3)?,
        first_name: row.get(4)?,
        last_name: row.get(5)?,
        status: row.get(6)?,
        product_id: row.get(7)?,
        customer_id: row.get(8)?,
        order_id: row.get(9)?,
        collection_id: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
        deleted_at: row.get(13)?,
    })
}

fn round_rating(avg: Option<f64>) -> Option<f64> {
    avg.map(|a| (a * 100.0).round() / 100.0)
}

/// Filter for review listings. Soft-deleted rows are always excluded.
#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    pub status: Option<ReviewStatus>,
    pub product_id: Option<String>,
    pub min_rating: Option<i64>,
}

impl ReviewFilter {
    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut clauses = vec!["deleted_at IS NULL".to_string()];
        let mut values = Vec::new();
        if let Some(status) = self.status {
            values.push(Value::Text(status.as_str().to_string()));
            clauses.push(format!("status = ?{}", values.len()));
        }
        if let Some(product_id) = &self.product_id {
            values.push(Value::Text(product_id.clone()));
            clauses.push(format!("product_id = ?{}", values.len()));
        }
        if let Some(min_rating) = self.min_rating {
            values.push(Value::Integer(min_rating));
            clauses.push(format!("rating >= ?{}", values.len()));
        }
        (clauses.join(" AND "), values)
    }
}

pub struct ModeratedReview {
    pub review: Review,
    pub previous_status: ReviewStatus,
}

impl ModeratedReview {
    pub fn changed(&self) -> bool {
        self.previous_status != self.review.status
    }
}

pub struct ReviewListing {
    pub reviews: Vec<Review>,
    pub count: i64,
    pub average_rating: Option<f64>,
}

impl Database {
    /// Inserts the review and, when it carries a collection, its collection link.
    pub async fn insert_review(&self, review: &Review) -> Result<(), Error> {
        let mut conn = self.lock().await;
        let tx = conn.transaction()?;
        tx.execute(
            &format!(
                "INSERT INTO review ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                REVIEW_COLUMNS
            ),
            params![
                review.id,
                review.title,
                review.content,
                review.rating,
                review.first_name,
                review.last_name,
                review.status,
                review.product_id,
                review.customer_id,
                review.order_id,
                review.collection_id,
                review.created_at,
                review.updated_at,
                review.deleted_at,
            ],
        )?;
        if let Some(collection_id) = &review.collection_id {
            tx.execute(
                "INSERT INTO review_collection_link (id, review_id, collection_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![new_id("revcol"), review.id, collection_id, review.created_at],
            )?;
        }
        tx.commit()
    }

    pub async fn get_review(&self, review_id: &str) -> Result<Option<Review>, Error> {
        let conn = self.lock().await;
        conn.query_row(
            &format!(
                "SELECT {} FROM review WHERE id = ?1 AND deleted_at IS NULL",
                REVIEW_COLUMNS
            ),
            [review_id],
            review_from_row,
        )
        .optional()
    }

    /// Live review already left for this product on this order, if any.
    pub async fn find_review_for_purchase(
        &self,
        order_id: &str,
        product_id: &str,
    ) -> Result<Option<String>, Error> {
        let conn = self.lock().await;
        conn.query_row(
            "SELECT id FROM review
             WHERE order_id = ?1 AND product_id = ?2 AND deleted_at IS NULL",
            params![order_id, product_id],
            |row| row.get(0),
        )
        .optional()
    }

    /// Newest-first page of reviews matching `filter`, with count and average
    /// rating taken over every matching row.
    pub async fn list_reviews(
        &self,
        filter: &ReviewFilter,
        limit: i64,
        offset: i64,
    ) -> Result<ReviewListing, Error> {
        let conn = self.lock().await;
        let (where_clause, mut values) = filter.where_clause();

        let (count, average): (i64, Option<f64>) = conn.query_row(
            &format!(
                "SELECT COUNT(*), AVG(rating) FROM review WHERE {}",
                where_clause
            ),
            params_from_iter(values.iter()),
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        values.push(Value::Integer(limit));
        let limit_idx = values.len();
        values.push(Value::Integer(offset));
        let offset_idx = values.len();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM review WHERE {}
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?{} OFFSET ?{}",
            REVIEW_COLUMNS, where_clause, limit_idx, offset_idx
        ))?;
        let reviews = stmt
            .query_map(params_from_iter(values.iter()), review_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ReviewListing {
            reviews,
            count,
            average_rating: round_rating(average),
        })
    }

    /// Moves the given reviews to `status`, skipping unknown or deleted ids.
    /// Rows already in `status` are returned untouched.
    pub async fn update_review_status(
        &self,
        ids: &[String],
        status: ReviewStatus,
    ) -> Result<Vec<ModeratedReview>, Error> {
        let mut conn = self.lock().await;
        let tx = conn.transaction()?;
        let ts = now();
        let mut updated = Vec::new();
        for id in ids {
            let previous_status: Option<ReviewStatus> = tx
                .query_row(
                    "SELECT status FROM review WHERE id = ?1 AND deleted_at IS NULL",
                    [id],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(previous_status) = previous_status else {
                continue;
            };
            if previous_status != status {
                tx.execute(
                    "UPDATE review SET status = ?1, updated_at = ?2 WHERE id = ?3",
                    params![status, ts, id],
                )?;
            }
            let review = tx.query_row(
                &format!("SELECT {} FROM review WHERE id = ?1", REVIEW_COLUMNS),
                [id],
                review_from_row,
            )?;
            updated.push(ModeratedReview {
                review,
                previous_status,
            });
        }
        tx.commit()?;
        Ok(updated)
    }

    /// Soft-deletes the review and its collection links.
    pub async fn soft_delete_review(&self, review_id: &str) -> Result<bool, Error> {
        let mut conn = self.lock().await;
        let tx = conn.transaction()?;
        let ts = now();
        let changed = tx.execute(
            "UPDATE review SET deleted_at = ?1, updated_at = ?1
             WHERE id = ?2 AND deleted_at IS NULL",
            params![ts, review_id],
        )?;
        tx.execute(
            "UPDATE review_collection_link SET deleted_at = ?1
             WHERE review_id = ?2 AND deleted_at IS NULL",
            params![ts, review_id],
        )?;
        tx.commit()?;
        Ok(changed > 0)
    }

    /// Approved-review rollup across every product in a collection.
    pub async fn collection_rating(&self, collection_id: &str) -> Result<CollectionRating, Error> {
        let conn = self.lock().await;
        let (count, average): (i64, Option<f64>) = conn.query_row(
            "SELECT COUNT(r.id), AVG(r.rating)
             FROM review_collection_link l
             JOIN review r ON r.id = l.review_id
             WHERE l.collection_id = ?1
               AND l.deleted_at IS NULL
               AND r.deleted_at IS NULL
               AND r.status = 'approved'",
            [collection_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(CollectionRating {
            collection_id: collection_id.to_string(),
            count,
            average_rating: round_rating(average),
        })
    }
}
