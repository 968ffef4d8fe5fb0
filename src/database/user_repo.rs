use sqlx::SqlitePool;

use crate::models::AuthUserRow;

const SQL_LOAD_AUTH_USER: &str = r#"
SELECT
    user_id,
    name,
    role
FROM users
WHERE user_id = ?1
LIMIT 1
"#;

pub async fn load_auth_user(
    pool: &SqlitePool,
    user_id: i64,
) -> sqlx::Result<Option<AuthUserRow>> {
    sqlx::query_as::<_, AuthUserRow>(SQL_LOAD_AUTH_USER)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}
