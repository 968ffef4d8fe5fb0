#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BeerRow {
    pub beer_id: i64,
    pub name: String,
    pub style: Option<String>,
    pub abv: Option<f64>,
}
