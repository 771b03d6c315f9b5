use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};
use thiserror::Error;
use tracing::instrument;

use crate::database_ops::db::Db;
use crate::database_ops::schema::{self, PatchReport, PoolTarget};
use crate::ingest::record::{FountainRecord, PersistedFountain};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
    #[error("no open transaction")]
    NoTransaction,
    /// Refusal by a non-SQL store (constraint check, injected failure).
    #[error("rejected by store: {0}")]
    Rejected(String),
}

/// Write side of the fountains table as seen by the importer.
///
/// Every mutation happens between `begin` and `commit`/`rollback`; callers
/// drive rows one at a time and in order.
#[async_trait]
pub trait FountainStore: Send {
    /// Best-effort schema reconciliation, run once before the transaction opens.
    async fn reconcile_schema(&mut self) -> Vec<PatchReport> {
        Vec::new()
    }

    async fn begin(&mut self) -> Result<(), StoreError>;

    /// Insert one row, returning the assigned id and the stored images.
    async fn insert_fountain(
        &mut self,
        record: &FountainRecord,
    ) -> Result<PersistedFountain, StoreError>;

    async fn set_images(&mut self, id: i64, images: &[String]) -> Result<(), StoreError>;

    async fn commit(&mut self) -> Result<(), StoreError>;

    async fn rollback(&mut self) -> Result<(), StoreError>;
}

const INSERT_FOUNTAIN: &str = "INSERT INTO fountains \
     (number, location, description, flavordescription, flavorrating, images, other, video) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
     RETURNING id::BIGINT AS id, COALESCE(images, '{}'::TEXT[]) AS images";

/// Postgres-backed store holding one transaction for the whole run.
///
/// Dropping the store with a transaction still open rolls it back and returns
/// the connection to the pool.
pub struct PgFountainStore {
    pool: PgPool,
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgFountainStore {
    pub fn new(db: &Db) -> Self {
        Self {
            pool: db.pool.clone(),
            tx: None,
        }
    }

    fn tx(&mut self) -> Result<&mut Transaction<'static, Postgres>, StoreError> {
        self.tx.as_mut().ok_or(StoreError::NoTransaction)
    }
}

#[async_trait]
impl FountainStore for PgFountainStore {
    async fn reconcile_schema(&mut self) -> Vec<PatchReport> {
        schema::reconcile(&mut PoolTarget(&self.pool)).await
    }

    async fn begin(&mut self) -> Result<(), StoreError> {
        if self.tx.is_none() {
            self.tx = Some(self.pool.begin().await?);
        }
        Ok(())
    }

    #[instrument(skip(self, record), fields(number = %record.number))]
    async fn insert_fountain(
        &mut self,
        record: &FountainRecord,
    ) -> Result<PersistedFountain, StoreError> {
        let tx = self.tx()?;
        let row = sqlx::query(INSERT_FOUNTAIN)
            .persistent(false)
            .bind(&record.number)
            .bind(&record.location)
            .bind(&record.description)
            .bind(&record.flavor_description)
            .bind(&record.flavor_rating)
            .bind(&record.images)
            .bind(&record.other)
            .bind(&record.video)
            .fetch_one(&mut **tx)
            .await?;

        let id: i64 = row.try_get("id")?;
        let images: Vec<String> = row.try_get("images")?;
        Ok(PersistedFountain {
            id,
            record: FountainRecord {
                images,
                ..record.clone()
            },
        })
    }

    #[instrument(skip(self, images))]
    async fn set_images(&mut self, id: i64, images: &[String]) -> Result<(), StoreError> {
        let tx = self.tx()?;
        sqlx::query("UPDATE fountains SET images = $1 WHERE id = $2")
            .persistent(false)
            .bind(images)
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        match self.tx.take() {
            Some(tx) => Ok(tx.commit().await?),
            None => Err(StoreError::NoTransaction),
        }
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        match self.tx.take() {
            Some(tx) => Ok(tx.rollback().await?),
            None => Ok(()),
        }
    }
}
