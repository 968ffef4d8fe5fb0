use sqlx::SqlitePool;

/// Applied on startup and by the test suite. Everything is
/// `CREATE ... IF NOT EXISTS` so re-running against an existing database is
/// a no-op. The unique indexes on `name` and `slug` are the backstop for the
/// check-then-insert race on slug generation.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT,
    email TEXT,
    role TEXT NOT NULL DEFAULT 'user'
);

CREATE TABLE IF NOT EXISTS breweries (
    brewery_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER REFERENCES users(user_id) ON DELETE SET NULL,
    name TEXT NOT NULL,
    slug TEXT NOT NULL,
    description TEXT NOT NULL,
    city TEXT NOT NULL,
    address TEXT NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    founded_year INTEGER,
    website TEXT,
    visitable INTEGER NOT NULL DEFAULT 0,
    image TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_breweries_name ON breweries(name);
CREATE UNIQUE INDEX IF NOT EXISTS idx_breweries_slug ON breweries(slug);

CREATE TABLE IF NOT EXISTS beers (
    beer_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    style TEXT,
    abv REAL
);

CREATE TABLE IF NOT EXISTS brewery_beer (
    brewery_id INTEGER NOT NULL REFERENCES breweries(brewery_id) ON DELETE CASCADE,
    beer_id INTEGER NOT NULL REFERENCES beers(beer_id) ON DELETE CASCADE,
    PRIMARY KEY (brewery_id, beer_id)
);

CREATE TABLE IF NOT EXISTS brewery_favorites (
    brewery_id INTEGER NOT NULL REFERENCES breweries(brewery_id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    PRIMARY KEY (brewery_id, user_id)
);

CREATE TABLE IF NOT EXISTS reviews (
    review_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER REFERENCES users(user_id) ON DELETE SET NULL,
    reviewable_type TEXT NOT NULL,
    reviewable_id INTEGER NOT NULL,
    rating INTEGER NOT NULL,
    body TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_reviews_reviewable ON reviews(reviewable_type, reviewable_id);
"#;

pub async fn ensure_schema(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}
