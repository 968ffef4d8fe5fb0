/// Default image shown when a brewery has no uploaded photo. Stored rows keep
/// `image` NULL in that case; reads substitute this sentinel and delete paths
/// must never touch it.
pub const DEFAULT_IMAGE: &str = "breweries/default.png";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BreweryRow {
    pub brewery_id: i64,
    pub user_id: Option<i64>,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub city: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub founded_year: Option<i64>,
    pub website: Option<String>,
    pub visitable: i64,
    pub image: Option<String>,
    pub created_at: String,
}

impl BreweryRow {
    pub fn image_path(&self) -> &str {
        self.image.as_deref().unwrap_or(DEFAULT_IMAGE)
    }

    pub fn has_custom_image(&self) -> bool {
        self.image.as_deref().is_some_and(|p| p != DEFAULT_IMAGE)
    }
}

/// Row shape for listing pages: the brewery plus its beers aggregated to a
/// JSON array and the average review rating, both computed in the query.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BreweryListRow {
    pub brewery_id: i64,
    pub user_id: Option<i64>,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub city: String,
    pub founded_year: Option<i64>,
    pub visitable: i64,
    pub image: Option<String>,
    pub created_at: String,
    pub average_rating: f64,
    pub beers_json: Option<String>,
}
