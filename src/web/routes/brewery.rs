use askama::Template;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
    Extension,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::warn;

use crate::models::BreweryRow;
use crate::services::brewery_commands::{
    self, Actor, BreweryInput, CommandError, FieldError,
};
use crate::services::brewery_service;
use crate::services::image_store::{self, UploadedImage};
use crate::web::middleware::auth::AuthenticatedUser;

#[derive(Template)]
#[template(path = "brewery.html")]
pub struct BreweryDetailTemplate {
    pub brewery: brewery_service::BreweryDetailView,
}

#[derive(Debug, Deserialize, Default)]
pub struct BreweryDetailQuery {
    pub page: Option<i64>,
}

pub async fn brewery_detail_handler(
    Path(identifier): Path<String>,
    Query(query): Query<BreweryDetailQuery>,
    State(pool): State<SqlitePool>,
) -> impl IntoResponse {
    let view = match brewery_service::load_brewery_detail(&pool, &identifier, query.page).await {
        Ok(v) => v,
        Err(e) => {
            warn!("Brewery detail load failed for {}: {}", identifier, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let Some(view) = view else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let template = BreweryDetailTemplate { brewery: view };
    Html(template.render().unwrap()).into_response()
}

/// Field values echoed back into the form, both for the edit flow and for
/// re-rendering a rejected submission.
#[derive(Debug, Clone, Default)]
pub struct BreweryFormValues {
    pub name: String,
    pub description: String,
    pub city: String,
    pub address: String,
    pub latitude: String,
    pub longitude: String,
    pub founded_year: String,
    pub website: String,
    pub visitable: bool,
}

impl BreweryFormValues {
    fn from_input(input: &BreweryInput) -> BreweryFormValues {
        BreweryFormValues {
            name: input.name.clone(),
            description: input.description.clone(),
            city: input.city.clone(),
            address: input.address.clone(),
            latitude: input.latitude.clone(),
            longitude: input.longitude.clone(),
            founded_year: input.founded_year.clone(),
            website: input.website.clone(),
            visitable: input.visitable,
        }
    }

    fn from_row(brewery: &BreweryRow) -> BreweryFormValues {
        BreweryFormValues {
            name: brewery.name.clone(),
            description: brewery.description.clone(),
            city: brewery.city.clone(),
            address: brewery.address.clone(),
            latitude: brewery.latitude.to_string(),
            longitude: brewery.longitude.to_string(),
            founded_year: brewery
                .founded_year
                .map(|y| y.to_string())
                .unwrap_or_default(),
            website: brewery.website.clone().unwrap_or_default(),
            visitable: brewery.visitable == 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormErrorView {
    pub field: String,
    pub message: String,
}

fn error_views(errors: Vec<FieldError>) -> Vec<FormErrorView> {
    errors
        .into_iter()
        .map(|e| FormErrorView {
            field: e.field.to_string(),
            message: e.message,
        })
        .collect()
}

#[derive(Template)]
#[template(path = "brewery_form.html")]
pub struct BreweryFormTemplate {
    pub heading: String,
    pub action: String,
    pub values: BreweryFormValues,
    pub errors: Vec<FormErrorView>,
}

pub async fn new_brewery_handler(
    Extension(_auth_user): Extension<AuthenticatedUser>,
) -> Html<String> {
    let template = BreweryFormTemplate {
        heading: "List your brewery".to_string(),
        action: "/breweries/new".to_string(),
        values: BreweryFormValues::default(),
        errors: Vec::new(),
    };
    Html(template.render().unwrap())
}

pub async fn create_brewery_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
    multipart: Multipart,
) -> impl IntoResponse {
    let Ok((input, upload)) = read_brewery_form(multipart).await else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let actor = Actor {
        user_id: auth_user.user_id,
        is_admin: auth_user.is_admin,
    };
    let result =
        brewery_commands::create_brewery(&pool, &image_store::public_root(), actor, &input, upload)
            .await;

    match result {
        Ok(_) => Redirect::to("/my/breweries?notice=created").into_response(),
        Err(CommandError::Validation(errors)) => {
            let template = BreweryFormTemplate {
                heading: "List your brewery".to_string(),
                action: "/breweries/new".to_string(),
                values: BreweryFormValues::from_input(&input),
                errors: error_views(errors),
            };
            Html(template.render().unwrap()).into_response()
        }
        Err(CommandError::Forbidden) => StatusCode::FORBIDDEN.into_response(),
        Err(e) => {
            warn!("Brewery create failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn edit_brewery_handler(
    Extension(_auth_user): Extension<AuthenticatedUser>,
    Path(identifier): Path<String>,
    State(pool): State<SqlitePool>,
) -> impl IntoResponse {
    let brewery = match brewery_service::resolve_brewery(&pool, &identifier).await {
        Ok(b) => b,
        Err(e) => {
            warn!("Brewery edit load failed for {}: {}", identifier, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let Some(brewery) = brewery else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let template = BreweryFormTemplate {
        heading: format!("Edit {}", brewery.name),
        action: format!("/breweries/{}/edit", brewery.brewery_id),
        values: BreweryFormValues::from_row(&brewery),
        errors: Vec::new(),
    };
    Html(template.render().unwrap()).into_response()
}

pub async fn update_brewery_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(identifier): Path<String>,
    State(pool): State<SqlitePool>,
    multipart: Multipart,
) -> impl IntoResponse {
    let brewery = match brewery_service::resolve_brewery(&pool, &identifier).await {
        Ok(Some(b)) => b,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!("Brewery update load failed for {}: {}", identifier, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let Ok((input, upload)) = read_brewery_form(multipart).await else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let actor = Actor {
        user_id: auth_user.user_id,
        is_admin: auth_user.is_admin,
    };
    let result = brewery_commands::update_brewery(
        &pool,
        &image_store::public_root(),
        actor,
        &brewery,
        &input,
        upload,
    )
    .await;

    match result {
        Ok(()) => Redirect::to("/my/breweries?notice=updated").into_response(),
        Err(CommandError::Validation(errors)) => {
            let template = BreweryFormTemplate {
                heading: format!("Edit {}", brewery.name),
                action: format!("/breweries/{}/edit", brewery.brewery_id),
                values: BreweryFormValues::from_input(&input),
                errors: error_views(errors),
            };
            Html(template.render().unwrap()).into_response()
        }
        Err(CommandError::Forbidden) => StatusCode::FORBIDDEN.into_response(),
        Err(e) => {
            warn!("Brewery update failed for {}: {}", brewery.brewery_id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn delete_brewery_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(identifier): Path<String>,
    State(pool): State<SqlitePool>,
) -> impl IntoResponse {
    let brewery = match brewery_service::resolve_brewery(&pool, &identifier).await {
        Ok(Some(b)) => b,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!("Brewery delete load failed for {}: {}", identifier, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let actor = Actor {
        user_id: auth_user.user_id,
        is_admin: auth_user.is_admin,
    };
    match brewery_commands::delete_brewery(&pool, &image_store::public_root(), actor, &brewery)
        .await
    {
        Ok(()) => Redirect::to("/breweries?notice=deleted").into_response(),
        Err(CommandError::Forbidden) => StatusCode::FORBIDDEN.into_response(),
        Err(e) => {
            warn!("Brewery delete failed for {}: {}", brewery.brewery_id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Reads the multipart create/edit submission into raw form input plus the
/// optional image upload. An empty file part (no filename, no bytes) counts
/// as "no upload".
async fn read_brewery_form(
    mut multipart: Multipart,
) -> Result<(BreweryInput, Option<UploadedImage>), axum::extract::multipart::MultipartError> {
    let mut input = BreweryInput::default();
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "name" => input.name = field.text().await?,
            "description" => input.description = field.text().await?,
            "city" => input.city = field.text().await?,
            "address" => input.address = field.text().await?,
            "latitude" => input.latitude = field.text().await?,
            "longitude" => input.longitude = field.text().await?,
            "founded_year" => input.founded_year = field.text().await?,
            "website" => input.website = field.text().await?,
            "visitable" => {
                let value = field.text().await?;
                input.visitable = matches!(value.as_str(), "on" | "true" | "1");
            }
            "image" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().unwrap_or("").to_string();
                let bytes = field.bytes().await?;
                if !file_name.is_empty() && !bytes.is_empty() {
                    upload = Some(UploadedImage {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok((input, upload))
}
