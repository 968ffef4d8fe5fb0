#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthUserRow {
    pub user_id: i64,
    pub name: Option<String>,
    pub role: Option<String>,
}
