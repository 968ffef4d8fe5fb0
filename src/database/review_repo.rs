use sqlx::SqlitePool;

use crate::models::ReviewRow;

const REVIEWABLE_BREWERY: &str = "brewery";

const SQL_AVERAGE_RATING: &str = r#"
SELECT COALESCE(AVG(rating), 0.0)
FROM reviews
WHERE reviewable_type = ?1
  AND reviewable_id = ?2
"#;

pub async fn average_rating_for_brewery(
    pool: &SqlitePool,
    brewery_id: i64,
) -> sqlx::Result<f64> {
    let avg: (f64,) = sqlx::query_as(SQL_AVERAGE_RATING)
        .bind(REVIEWABLE_BREWERY)
        .bind(brewery_id)
        .fetch_one(pool)
        .await?;
    Ok(avg.0)
}

const SQL_RECENT_FOR_BREWERY: &str = r#"
SELECT
    review_id,
    user_id,
    rating,
    body,
    created_at
FROM reviews
WHERE reviewable_type = ?1
  AND reviewable_id = ?2
ORDER BY created_at DESC, review_id DESC
LIMIT ?3
"#;

pub async fn recent_for_brewery(
    pool: &SqlitePool,
    brewery_id: i64,
    limit: i64,
) -> sqlx::Result<Vec<ReviewRow>> {
    sqlx::query_as::<_, ReviewRow>(SQL_RECENT_FOR_BREWERY)
        .bind(REVIEWABLE_BREWERY)
        .bind(brewery_id)
        .bind(limit)
        .fetch_all(pool)
        .await
}
