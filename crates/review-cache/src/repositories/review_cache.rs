//! SQLite implementation of LocalReviewCache

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::{QueryBuilder, SqlitePool};
use tracing::instrument;

use review_core::entities::{ReviewRecord, VendorReviewAggregate};
use review_core::error::DomainError;
use review_core::traits::{CacheResult, LocalReviewCache, ReplyFilter, ReviewFilter, ReviewSort};
use review_core::value_objects::{ReviewId, VendorId};

use crate::mappers::{from_millis, to_millis, AggregateInsert, ReviewInsert};
use crate::models::{AggregateModel, ReviewModel, SyncStateModel};
use crate::pool::{create_pool, init_schema, CachePoolConfig, CachePoolError};

use super::error::{like_pattern, map_db_error};

/// SQLite implementation of LocalReviewCache
#[derive(Clone)]
pub struct SqliteReviewCache {
    pool: SqlitePool,
}

impl SqliteReviewCache {
    /// Wrap an existing pool; the schema must already exist
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the database described by `config` and make sure the schema exists
    pub async fn connect(config: &CachePoolConfig) -> Result<Self, CachePoolError> {
        let pool = create_pool(config).await?;
        init_schema(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Get the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn insert_review<'q>(row: &'q ReviewInsert<'q>, synced_at: i64) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO reviews (
            vendor_id, review_id, customer_id, customer_name, rating, star, text, search_text,
            image_urls, created_at, is_verified_purchase, is_anonymous, helpful_count, status,
            flagged, flag_reason, flagged_at, reply_vendor_id, reply_vendor_name, reply_text,
            reply_created_at, reply_edited_at, reply_status, last_synced_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(row.vendor_id)
    .bind(row.review_id)
    .bind(row.customer_id)
    .bind(row.customer_name)
    .bind(row.rating)
    .bind(row.star)
    .bind(row.text)
    .bind(row.search_text.as_str())
    .bind(row.image_urls.as_str())
    .bind(row.created_at)
    .bind(row.is_verified_purchase)
    .bind(row.is_anonymous)
    .bind(row.helpful_count)
    .bind(row.status)
    .bind(row.flagged)
    .bind(row.flag_reason)
    .bind(row.flagged_at)
    .bind(row.reply_vendor_id)
    .bind(row.reply_vendor_name)
    .bind(row.reply_text)
    .bind(row.reply_created_at)
    .bind(row.reply_edited_at)
    .bind(row.reply_status)
    .bind(synced_at)
}

fn order_by(sort: ReviewSort) -> &'static str {
    match sort {
        ReviewSort::Newest => " ORDER BY created_at DESC, review_id ASC",
        ReviewSort::Oldest => " ORDER BY created_at ASC, review_id ASC",
        ReviewSort::HighestRated => " ORDER BY rating DESC, created_at DESC, review_id ASC",
        ReviewSort::LowestRated => " ORDER BY rating ASC, created_at DESC, review_id ASC",
        ReviewSort::MostHelpful => " ORDER BY helpful_count DESC, created_at DESC, review_id ASC",
    }
}

#[async_trait]
impl LocalReviewCache for SqliteReviewCache {
    #[instrument(skip(self))]
    async fn list_active(
        &self,
        vendor_id: &VendorId,
        filter: &ReviewFilter,
    ) -> CacheResult<Vec<ReviewRecord>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM reviews WHERE vendor_id = ", ReviewModel::COLUMNS));
        qb.push_bind(vendor_id.as_str().to_owned());
        qb.push(" AND status <> 'HIDDEN'");

        if let Some(star) = filter.star {
            qb.push(" AND star = ").push_bind(i64::from(star));
        }

        match filter.reply {
            ReplyFilter::Any => {}
            ReplyFilter::WithReply => {
                qb.push(" AND reply_text IS NOT NULL");
            }
            ReplyFilter::WithoutReply => {
                qb.push(" AND reply_text IS NULL");
            }
        }

        if filter.flagged_only {
            qb.push(" AND flagged = 1");
        }

        if let Some(term) = filter.search_term() {
            qb.push(" AND search_text LIKE ")
                .push_bind(like_pattern(term))
                .push(" ESCAPE '\\'");
        }

        qb.push(order_by(filter.sort));

        match filter.effective_limit() {
            Some(limit) => {
                qb.push(" LIMIT ").push_bind(limit);
                qb.push(" OFFSET ").push_bind(filter.offset);
            }
            None if filter.offset > 0 => {
                qb.push(" LIMIT -1 OFFSET ").push_bind(filter.offset);
            }
            None => {}
        }

        let rows = qb
            .build_query_as::<ReviewModel>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        rows.into_iter().map(ReviewRecord::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn get_review(
        &self,
        vendor_id: &VendorId,
        review_id: &ReviewId,
    ) -> CacheResult<Option<ReviewRecord>> {
        let sql = format!(
            "SELECT {} FROM reviews WHERE vendor_id = ? AND review_id = ?",
            ReviewModel::COLUMNS
        );
        let row = sqlx::query_as::<_, ReviewModel>(&sql)
            .bind(vendor_id.as_str())
            .bind(review_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        row.map(ReviewRecord::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn get_aggregate(
        &self,
        vendor_id: &VendorId,
    ) -> CacheResult<Option<VendorReviewAggregate>> {
        let row = sqlx::query_as::<_, AggregateModel>(
            r#"
            SELECT vendor_id, total_reviews, star_1, star_2, star_3, star_4, star_5,
                   average_rating, thirty_day_count, thirty_day_average, last_updated
            FROM vendor_aggregates
            WHERE vendor_id = ?
            "#,
        )
        .bind(vendor_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.map(VendorReviewAggregate::try_from).transpose()
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn replace_all(
        &self,
        vendor_id: &VendorId,
        records: &[ReviewRecord],
        synced_at: DateTime<Utc>,
    ) -> CacheResult<()> {
        if let Some(foreign) = records.iter().find(|r| &r.vendor_id != vendor_id) {
            return Err(DomainError::CacheError(format!(
                "review {} belongs to vendor {}, not {}",
                foreign.review_id, foreign.vendor_id, vendor_id
            )));
        }

        // Flatten before opening the transaction so a bad record aborts early.
        let rows = records
            .iter()
            .map(ReviewInsert::new)
            .collect::<Result<Vec<_>, _>>()?;
        let synced = to_millis(synced_at);

        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query("DELETE FROM reviews WHERE vendor_id = ?")
            .bind(vendor_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        for row in &rows {
            insert_review(row, synced)
                .execute(&mut *tx)
                .await
                .map_err(map_db_error)?;
        }

        sqlx::query("INSERT OR REPLACE INTO vendor_sync_state (vendor_id, last_pulled_at) VALUES (?, ?)")
            .bind(vendor_id.as_str())
            .bind(synced)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        tracing::debug!(vendor_id = %vendor_id, count = rows.len(), "Cache snapshot replaced");
        Ok(())
    }

    #[instrument(skip(self, record), fields(review_id = %record.review_id))]
    async fn upsert_one(&self, record: &ReviewRecord, synced_at: DateTime<Utc>) -> CacheResult<()> {
        let row = ReviewInsert::new(record)?;
        insert_review(&row, to_millis(synced_at))
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self, aggregate), fields(vendor_id = %aggregate.vendor_id))]
    async fn set_aggregate(&self, aggregate: &VendorReviewAggregate) -> CacheResult<()> {
        let row = AggregateInsert::new(aggregate);
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO vendor_aggregates (
                vendor_id, total_reviews, star_1, star_2, star_3, star_4, star_5,
                average_rating, thirty_day_count, thirty_day_average, last_updated
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(row.vendor_id)
        .bind(row.total_reviews)
        .bind(row.histogram[0])
        .bind(row.histogram[1])
        .bind(row.histogram[2])
        .bind(row.histogram[3])
        .bind(row.histogram[4])
        .bind(row.average_rating)
        .bind(row.thirty_day_count)
        .bind(row.thirty_day_average)
        .bind(row.last_updated)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn last_pulled_at(&self, vendor_id: &VendorId) -> CacheResult<Option<DateTime<Utc>>> {
        let row = sqlx::query_as::<_, SyncStateModel>(
            "SELECT vendor_id, last_pulled_at FROM vendor_sync_state WHERE vendor_id = ?",
        )
        .bind(vendor_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.map(|r| from_millis("last_pulled_at", r.last_pulled_at))
            .transpose()
    }

    #[instrument(skip(self))]
    async fn stale_reviews(
        &self,
        vendor_id: &VendorId,
        older_than: DateTime<Utc>,
    ) -> CacheResult<Vec<ReviewId>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT review_id FROM reviews
            WHERE vendor_id = ? AND (last_synced_at IS NULL OR last_synced_at < ?)
            ORDER BY created_at DESC, review_id ASC
            "#,
        )
        .bind(vendor_id.as_str())
        .bind(to_millis(older_than))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(|(id,)| ReviewId::new(id)).collect())
    }
}
