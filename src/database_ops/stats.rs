use anyhow::Result;
use serde::Serialize;
use sqlx::Row;
use tracing::info;

use crate::database_ops::db::Db;
use crate::ingest::transform::AUTO_NUMBER_PREFIX;

#[derive(Debug, Clone, Default, Serialize)]
pub struct FountainStats {
    pub fountains: i64,
    pub with_placeholder_images: i64,
    pub with_synthesized_number: i64,
}

pub async fn collect(db: &Db) -> Result<FountainStats> {
    let row = sqlx::query(
        r#"
        SELECT
            COUNT(*)::BIGINT AS fountains,
            COUNT(*) FILTER (
                WHERE images = ARRAY[
                    '/fountains/' || id || '_fountain.jpg',
                    '/fountains/' || id || '_cup.jpg'
                ]::TEXT[]
            )::BIGINT AS with_placeholder_images,
            COUNT(*) FILTER (WHERE number LIKE $1 || '%')::BIGINT AS with_synthesized_number
        FROM fountains
    "#,
    )
    .persistent(false)
    .bind(AUTO_NUMBER_PREFIX)
    .fetch_one(&db.pool)
    .await?;

    let stats = FountainStats {
        fountains: row.try_get("fountains")?,
        with_placeholder_images: row.try_get("with_placeholder_images")?,
        with_synthesized_number: row.try_get("with_synthesized_number")?,
    };
    info!(fountains = stats.fountains, "fountain stats collected");
    Ok(stats)
}
