use std::path::PathBuf;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use uuid::Uuid;

use brouwgids::database::schema;
use brouwgids::services::brewery_commands::{Actor, BreweryInput};
use brouwgids::services::image_store::UploadedImage;

/// Fresh in-memory database with the schema applied. One connection so
/// every query sees the same memory instance.
pub async fn setup_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    schema::ensure_schema(&pool).await.expect("schema");
    pool
}

pub async fn seed_user(pool: &SqlitePool, name: &str, role: &str) -> i64 {
    let result = sqlx::query("INSERT INTO users (name, email, role) VALUES (?1, ?2, ?3)")
        .bind(name)
        .bind(format!("{}@example.test", name.to_lowercase().replace(' ', ".")))
        .bind(role)
        .execute(pool)
        .await
        .expect("seed user");
    result.last_insert_rowid()
}

pub fn owner(user_id: i64) -> Actor {
    Actor {
        user_id,
        is_admin: false,
    }
}

pub fn admin(user_id: i64) -> Actor {
    Actor {
        user_id,
        is_admin: true,
    }
}

pub fn brewery_input(name: &str, city: &str) -> BreweryInput {
    BreweryInput {
        name: name.to_string(),
        description: format!("{name} makes small batch beer"),
        city: city.to_string(),
        address: "Main Street 1".to_string(),
        latitude: "52.0907".to_string(),
        longitude: "5.1214".to_string(),
        founded_year: "1998".to_string(),
        website: String::new(),
        visitable: false,
    }
}

pub fn png_upload(bytes: &[u8]) -> UploadedImage {
    UploadedImage {
        file_name: "photo.png".to_string(),
        content_type: "image/png".to_string(),
        bytes: bytes.to_vec(),
    }
}

/// Unique scratch directory standing in for the public file root.
pub fn temp_public_root() -> PathBuf {
    let root = std::env::temp_dir().join(format!("brouwgids-test-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&root).expect("temp public root");
    root
}

pub async fn attach_beer(pool: &SqlitePool, brewery_id: i64, name: &str, style: &str) {
    let result = sqlx::query("INSERT INTO beers (name, style) VALUES (?1, ?2)")
        .bind(name)
        .bind(style)
        .execute(pool)
        .await
        .expect("seed beer");
    sqlx::query("INSERT INTO brewery_beer (brewery_id, beer_id) VALUES (?1, ?2)")
        .bind(brewery_id)
        .bind(result.last_insert_rowid())
        .execute(pool)
        .await
        .expect("link beer");
}

pub async fn add_review(pool: &SqlitePool, brewery_id: i64, rating: i64) {
    sqlx::query(
        "INSERT INTO reviews (reviewable_type, reviewable_id, rating, body)
         VALUES ('brewery', ?1, ?2, 'ok')",
    )
    .bind(brewery_id)
    .bind(rating)
    .execute(pool)
    .await
    .expect("seed review");
}
