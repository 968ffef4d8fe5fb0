use sqlx::SqlitePool;

use crate::models::BeerRow;

const SQL_LIST_FOR_BREWERY: &str = r#"
SELECT
    be.beer_id,
    be.name,
    be.style,
    be.abv
FROM brewery_beer bb
JOIN beers be ON be.beer_id = bb.beer_id
WHERE bb.brewery_id = ?1
ORDER BY be.name ASC
LIMIT ?2 OFFSET ?3
"#;

pub async fn list_for_brewery(
    pool: &SqlitePool,
    brewery_id: i64,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<BeerRow>> {
    sqlx::query_as::<_, BeerRow>(SQL_LIST_FOR_BREWERY)
        .bind(brewery_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}
