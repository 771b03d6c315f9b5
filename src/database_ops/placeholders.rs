use anyhow::Result;
use sqlx::Row;
use tracing::{info, instrument};

use crate::database_ops::db::Db;
use crate::normalization::images::IMAGE_BASE;

/// Default images for a fountain imported without any: one fountain shot and
/// one cup shot named after the row id.
pub fn placeholder_images(id: i64) -> Vec<String> {
    vec![
        format!("{IMAGE_BASE}{id}_fountain.jpg"),
        format!("{IMAGE_BASE}{id}_cup.jpg"),
    ]
}

/// Rewrite the legacy dash-style placeholders (`<id>-fountain.jpg`,
/// `<id>-cup.jpg`) to the underscore form. Any other entry is left alone.
/// Returns `None` when the list holds no legacy placeholder.
pub fn rename_dash_placeholders(id: i64, images: &[String]) -> Option<Vec<String>> {
    let dash_fountain = format!("{IMAGE_BASE}{id}-fountain.jpg");
    let dash_cup = format!("{IMAGE_BASE}{id}-cup.jpg");
    if !images.iter().any(|i| *i == dash_fountain || *i == dash_cup) {
        return None;
    }
    let fixed = placeholder_images(id);
    Some(
        images
            .iter()
            .map(|img| {
                if *img == dash_fountain {
                    fixed[0].clone()
                } else if *img == dash_cup {
                    fixed[1].clone()
                } else {
                    img.clone()
                }
            })
            .collect(),
    )
}

/// Apply [`rename_dash_placeholders`] to every stored row inside one
/// transaction. Returns the number of rows updated.
#[instrument(skip(db))]
pub async fn migrate_dash_placeholders(db: &Db) -> Result<u64> {
    let mut tx = db.pool.begin().await?;
    let rows = sqlx::query(
        "SELECT id::BIGINT AS id, images FROM fountains \
         WHERE images IS NOT NULL AND cardinality(images) > 0 ORDER BY id",
    )
    .persistent(false)
    .fetch_all(&mut *tx)
    .await?;

    let mut updated = 0u64;
    for row in rows {
        let id: i64 = row.try_get("id")?;
        let images: Vec<String> = row.try_get("images")?;
        let Some(renamed) = rename_dash_placeholders(id, &images) else {
            continue;
        };
        sqlx::query("UPDATE fountains SET images = $1 WHERE id = $2")
            .persistent(false)
            .bind(&renamed)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        updated += 1;
    }
    tx.commit().await?;
    info!(updated, "placeholder rename complete");
    Ok(updated)
}
