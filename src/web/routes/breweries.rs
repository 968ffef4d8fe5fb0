use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Extension,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::warn;

use crate::services::brewery_service::{self, BreweryListQuery};
use crate::web::middleware::auth::AuthenticatedUser;

pub fn notice_message(code: Option<&str>) -> String {
    match code.unwrap_or("") {
        "created" => "Brewery listed.".to_string(),
        "updated" => "Brewery updated.".to_string(),
        "deleted" => "Brewery removed.".to_string(),
        _ => String::new(),
    }
}

#[derive(Template)]
#[template(path = "breweries.html")]
pub struct BreweriesTemplate {
    pub breweries: Vec<brewery_service::BreweryCardView>,
    pub filters: brewery_service::AppliedBreweryFilters,
    pub page: i64,
    pub notice: String,
}

pub async fn breweries_handler(
    Query(query): Query<BreweryListQuery>,
    State(pool): State<SqlitePool>,
) -> impl IntoResponse {
    let data = match brewery_service::build_brewery_index(&pool, &query).await {
        Ok(data) => data,
        Err(e) => {
            warn!("Brewery index load failed: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let template = BreweriesTemplate {
        breweries: data.breweries,
        filters: data.filters,
        page: data.page,
        notice: notice_message(query.notice.as_deref()),
    };
    Html(template.render().unwrap()).into_response()
}

#[derive(Debug, Deserialize, Default)]
pub struct MyBreweriesQuery {
    pub page: Option<i64>,
    pub notice: Option<String>,
}

#[derive(Template)]
#[template(path = "my_breweries.html")]
pub struct MyBreweriesTemplate {
    pub breweries: Vec<brewery_service::BreweryCardView>,
    pub page: i64,
    pub notice: String,
}

pub async fn my_breweries_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(query): Query<MyBreweriesQuery>,
    State(pool): State<SqlitePool>,
) -> impl IntoResponse {
    let data =
        match brewery_service::build_my_listings(&pool, auth_user.user_id, query.page).await {
            Ok(data) => data,
            Err(e) => {
                warn!(
                    "My listings load failed for user {}: {}",
                    auth_user.user_id, e
                );
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

    let template = MyBreweriesTemplate {
        breweries: data.breweries,
        page: data.page,
        notice: notice_message(query.notice.as_deref()),
    };
    Html(template.render().unwrap()).into_response()
}
