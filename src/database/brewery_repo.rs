use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::models::{BreweryListRow, BreweryRow};

/// Sort keys accepted by the composable brewery filter. Anything
/// unrecognized falls back to sorting by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreweryOrder {
    Name,
    City,
    FoundedYear,
    Rating,
}

impl BreweryOrder {
    pub fn parse(input: &str) -> BreweryOrder {
        match input {
            "city" => BreweryOrder::City,
            "founded_year" => BreweryOrder::FoundedYear,
            "rating" => BreweryOrder::Rating,
            _ => BreweryOrder::Name,
        }
    }

    fn sql_column(self) -> &'static str {
        match self {
            BreweryOrder::Name => "b.name",
            BreweryOrder::City => "b.city",
            BreweryOrder::FoundedYear => "b.founded_year",
            // Alias computed in the SELECT list below.
            BreweryOrder::Rating => "average_rating",
        }
    }
}

/// Direction is untrusted request input; it never reaches the SQL string
/// unvalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn parse(input: &str) -> OrderDirection {
        match input {
            "desc" => OrderDirection::Desc,
            _ => OrderDirection::Asc,
        }
    }

    fn sql(self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// Composable filter over breweries. All fields optional; an empty filter
/// lists everything newest-first.
#[derive(Debug, Clone, Default)]
pub struct BreweryFilter {
    /// Substring match on city OR street address (case-insensitive).
    pub location: Option<String>,
    /// Substring match on name OR city OR description, as one OR-group.
    pub search: Option<String>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub visitable: Option<bool>,
    pub user_id: Option<i64>,
    pub year_min: Option<i64>,
    pub year_max: Option<i64>,
    /// None keeps the default newest-first ordering.
    pub order: Option<(BreweryOrder, OrderDirection)>,
}

const SQL_LIST_SELECT: &str = r#"
SELECT
  b.brewery_id,
  b.user_id,
  b.name,
  b.slug,
  b.description,
  b.city,
  b.founded_year,
  b.visitable,
  b.image,
  b.created_at,
  COALESCE((
    SELECT AVG(r.rating)
    FROM reviews r
    WHERE r.reviewable_type = 'brewery'
      AND r.reviewable_id = b.brewery_id
  ), 0.0) AS average_rating,
  (
    SELECT json_group_array(json_object(
      'beer_id', beer_id,
      'name', name,
      'style', style
    ))
    FROM (
      SELECT be.beer_id, be.name, be.style
      FROM brewery_beer bb
      JOIN beers be ON be.beer_id = bb.beer_id
      WHERE bb.brewery_id = b.brewery_id
      ORDER BY be.name ASC
    )
  ) AS beers_json
FROM breweries b
WHERE 1 = 1
"#;

fn like_pattern(input: &str) -> String {
    format!("%{}%", input.trim().to_lowercase())
}

pub async fn search(
    pool: &SqlitePool,
    filter: &BreweryFilter,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<BreweryListRow>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SQL_LIST_SELECT);

    if let Some(location) = filter.location.as_deref().filter(|s| !s.trim().is_empty()) {
        let like = like_pattern(location);
        qb.push(" AND (lower(b.city) LIKE ")
            .push_bind(like.clone())
            .push(" OR lower(b.address) LIKE ")
            .push_bind(like)
            .push(")");
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let like = like_pattern(search);
        qb.push(" AND (lower(b.name) LIKE ")
            .push_bind(like.clone())
            .push(" OR lower(b.city) LIKE ")
            .push_bind(like.clone())
            .push(" OR lower(b.description) LIKE ")
            .push_bind(like)
            .push(")");
    }
    if let Some(name) = filter.name.as_deref().filter(|s| !s.trim().is_empty()) {
        qb.push(" AND lower(b.name) LIKE ").push_bind(like_pattern(name));
    }
    if let Some(city) = filter.city.as_deref().filter(|s| !s.trim().is_empty()) {
        qb.push(" AND lower(b.city) LIKE ").push_bind(like_pattern(city));
    }
    if let Some(visitable) = filter.visitable {
        qb.push(" AND b.visitable = ")
            .push_bind(if visitable { 1i64 } else { 0i64 });
    }
    if let Some(user_id) = filter.user_id {
        qb.push(" AND b.user_id = ").push_bind(user_id);
    }
    if let Some(year_min) = filter.year_min {
        qb.push(" AND b.founded_year >= ").push_bind(year_min);
    }
    if let Some(year_max) = filter.year_max {
        qb.push(" AND b.founded_year <= ").push_bind(year_max);
    }

    match filter.order {
        Some((order, direction)) => {
            qb.push(" ORDER BY ")
                .push(order.sql_column())
                .push(" ")
                .push(direction.sql())
                .push(", b.brewery_id ASC");
        }
        None => {
            qb.push(" ORDER BY b.created_at DESC, b.brewery_id DESC");
        }
    }

    qb.push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    qb.build_query_as::<BreweryListRow>().fetch_all(pool).await
}

const SQL_BREWERY_COLUMNS: &str = r#"
SELECT
    brewery_id,
    user_id,
    name,
    slug,
    description,
    city,
    address,
    latitude,
    longitude,
    founded_year,
    website,
    visitable,
    image,
    created_at
FROM breweries
"#;

pub async fn find_by_id(pool: &SqlitePool, brewery_id: i64) -> sqlx::Result<Option<BreweryRow>> {
    let sql = format!("{SQL_BREWERY_COLUMNS} WHERE brewery_id = ?1 LIMIT 1");
    sqlx::query_as::<_, BreweryRow>(&sql)
        .bind(brewery_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_name(pool: &SqlitePool, name: &str) -> sqlx::Result<Option<BreweryRow>> {
    let sql = format!("{SQL_BREWERY_COLUMNS} WHERE name = ?1 LIMIT 1");
    sqlx::query_as::<_, BreweryRow>(&sql)
        .bind(name)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> sqlx::Result<Option<BreweryRow>> {
    let sql = format!("{SQL_BREWERY_COLUMNS} WHERE slug = ?1 LIMIT 1");
    sqlx::query_as::<_, BreweryRow>(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await
}

pub async fn name_exists(pool: &SqlitePool, name: &str) -> sqlx::Result<bool> {
    let exists: (i64,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM breweries WHERE name = ?1)")
            .bind(name)
            .fetch_one(pool)
            .await?;
    Ok(exists.0 == 1)
}

pub async fn slug_exists(pool: &SqlitePool, slug: &str) -> sqlx::Result<bool> {
    let exists: (i64,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM breweries WHERE slug = ?1)")
            .bind(slug)
            .fetch_one(pool)
            .await?;
    Ok(exists.0 == 1)
}

pub async fn favorites_count(pool: &SqlitePool, brewery_id: i64) -> sqlx::Result<i64> {
    let count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM brewery_favorites WHERE brewery_id = ?1")
            .bind(brewery_id)
            .fetch_one(pool)
            .await?;
    Ok(count.0)
}

#[derive(Debug, Clone)]
pub struct NewBrewery {
    pub user_id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub city: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub founded_year: Option<i64>,
    pub website: Option<String>,
    pub visitable: bool,
    pub image: Option<String>,
}

const SQL_INSERT: &str = r#"
INSERT INTO breweries (
    user_id, name, slug, description, city, address,
    latitude, longitude, founded_year, website, visitable, image
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
"#;

pub async fn insert(pool: &SqlitePool, brewery: &NewBrewery) -> sqlx::Result<i64> {
    let result = sqlx::query(SQL_INSERT)
        .bind(brewery.user_id)
        .bind(&brewery.name)
        .bind(&brewery.slug)
        .bind(&brewery.description)
        .bind(&brewery.city)
        .bind(&brewery.address)
        .bind(brewery.latitude)
        .bind(brewery.longitude)
        .bind(brewery.founded_year)
        .bind(&brewery.website)
        .bind(if brewery.visitable { 1i64 } else { 0i64 })
        .bind(&brewery.image)
        .execute(pool)
        .await?;
    Ok(result.last_insert_rowid())
}

/// Field updates applied on edit. The slug is generated once at create time
/// and never rewritten; the image has its own update path because it only
/// changes when a new file was uploaded.
#[derive(Debug, Clone)]
pub struct BreweryChanges {
    pub name: String,
    pub description: String,
    pub city: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub founded_year: Option<i64>,
    pub website: Option<String>,
    pub visitable: bool,
}

const SQL_UPDATE: &str = r#"
UPDATE breweries SET
    name = ?1,
    description = ?2,
    city = ?3,
    address = ?4,
    latitude = ?5,
    longitude = ?6,
    founded_year = ?7,
    website = ?8,
    visitable = ?9
WHERE brewery_id = ?10
"#;

pub async fn update(
    pool: &SqlitePool,
    brewery_id: i64,
    changes: &BreweryChanges,
) -> sqlx::Result<()> {
    sqlx::query(SQL_UPDATE)
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(&changes.city)
        .bind(&changes.address)
        .bind(changes.latitude)
        .bind(changes.longitude)
        .bind(changes.founded_year)
        .bind(&changes.website)
        .bind(if changes.visitable { 1i64 } else { 0i64 })
        .bind(brewery_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_image(pool: &SqlitePool, brewery_id: i64, image: &str) -> sqlx::Result<()> {
    sqlx::query("UPDATE breweries SET image = ?1 WHERE brewery_id = ?2")
        .bind(image)
        .bind(brewery_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete(pool: &SqlitePool, brewery_id: i64) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM breweries WHERE brewery_id = ?1")
        .bind(brewery_id)
        .execute(pool)
        .await?;
    Ok(())
}
