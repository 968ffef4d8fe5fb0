/// Reviews are polymorphic: `reviewable_type` + `reviewable_id` point at the
/// reviewed entity, breweries being one of several types on the site.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReviewRow {
    pub review_id: i64,
    pub user_id: Option<i64>,
    pub rating: i64,
    pub body: Option<String>,
    pub created_at: String,
}
