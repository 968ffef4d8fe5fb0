use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use sqlx::SqlitePool;
use thiserror::Error;
use url::Url;

use crate::database::brewery_repo::{self, BreweryChanges, NewBrewery};
use crate::models::BreweryRow;
use crate::services::image_store::{self, UploadedImage, MAX_IMAGE_BYTES};
use crate::services::slug;

const MIN_FOUNDED_YEAR: i64 = 1800;

/// The credential every write operation receives explicitly; handlers build
/// it from the authenticated session.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: i64,
    pub is_admin: bool,
}

/// Raw form fields as submitted. Parsing and bounds checks happen in
/// validation so every problem comes back as a per-field message instead of
/// a deserialization failure.
#[derive(Debug, Clone, Default)]
pub struct BreweryInput {
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

#[derive(Debug, Clone)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> FieldError {
        FieldError {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("not allowed")]
    Forbidden,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
    #[error("image store failed: {0}")]
    Image(#[from] std::io::Error),
}

struct ValidatedBrewery {
    name: String,
    description: String,
    city: String,
    address: String,
    latitude: f64,
    longitude: f64,
    founded_year: Option<i64>,
    website: Option<String>,
    visitable: bool,
}

fn require_text(
    field: &'static str,
    value: &str,
    max_len: Option<usize>,
    errors: &mut Vec<FieldError>,
) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.push(FieldError::new(field, format!("{field} is required")));
    } else if max_len.is_some_and(|max| value.chars().count() > max) {
        errors.push(FieldError::new(
            field,
            format!("{field} may be at most 255 characters"),
        ));
    }
    value.to_string()
}

fn parse_coordinate(field: &'static str, value: &str, errors: &mut Vec<FieldError>) -> f64 {
    let value = value.trim();
    if value.is_empty() {
        errors.push(FieldError::new(field, format!("{field} is required")));
        return 0.0;
    }
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            errors.push(FieldError::new(field, format!("{field} must be a number")));
            0.0
        }
    }
}

fn parse_founded_year(value: &str, errors: &mut Vec<FieldError>) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let Ok(year) = value.parse::<i64>() else {
        errors.push(FieldError::new(
            "founded_year",
            "founded_year must be a whole year",
        ));
        return None;
    };
    let max = current_year();
    if !(MIN_FOUNDED_YEAR..=max).contains(&year) {
        errors.push(FieldError::new(
            "founded_year",
            format!("founded_year must be between {MIN_FOUNDED_YEAR} and {max}"),
        ));
        return None;
    }
    Some(year)
}

fn parse_website(value: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if value.chars().count() > 255 {
        errors.push(FieldError::new(
            "website",
            "website may be at most 255 characters",
        ));
        return None;
    }
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(value.to_string()),
        _ => {
            errors.push(FieldError::new("website", "website must be a valid URL"));
            None
        }
    }
}

fn check_upload(upload: Option<&UploadedImage>, errors: &mut Vec<FieldError>) {
    let Some(upload) = upload else {
        return;
    };
    if !upload.content_type.starts_with("image/") {
        errors.push(FieldError::new("image", "image must be an image file"));
    }
    if upload.bytes.len() > MAX_IMAGE_BYTES {
        errors.push(FieldError::new("image", "image may be at most 2048 KB"));
    }
}

/// Returns `Some` iff no errors were pushed.
fn validate(
    input: &BreweryInput,
    upload: Option<&UploadedImage>,
    errors: &mut Vec<FieldError>,
) -> Option<ValidatedBrewery> {
    let name = require_text("name", &input.name, Some(255), errors);
    let description = require_text("description", &input.description, None, errors);
    let city = require_text("city", &input.city, Some(255), errors);
    let address = require_text("address", &input.address, Some(255), errors);
    let latitude = parse_coordinate("latitude", &input.latitude, errors);
    let longitude = parse_coordinate("longitude", &input.longitude, errors);
    let founded_year = parse_founded_year(&input.founded_year, errors);
    let website = parse_website(&input.website, errors);
    check_upload(upload, errors);

    if !errors.is_empty() {
        return None;
    }
    Some(ValidatedBrewery {
        name,
        description,
        city,
        address,
        latitude,
        longitude,
        founded_year,
        website,
        visitable: input.visitable,
    })
}

/// Validates, stores the upload (if any), generates a unique slug and
/// inserts the brewery owned by `actor`. The file write is not transactional
/// with the insert: a failed insert can leave an orphaned file behind.
pub async fn create_brewery(
    pool: &SqlitePool,
    public_root: &Path,
    actor: Actor,
    input: &BreweryInput,
    upload: Option<UploadedImage>,
) -> Result<i64, CommandError> {
    let mut errors = Vec::new();
    let validated = validate(input, upload.as_ref(), &mut errors);

    let trimmed_name = input.name.trim();
    if !trimmed_name.is_empty() && brewery_repo::name_exists(pool, trimmed_name).await? {
        errors.push(FieldError::new("name", "name is already taken"));
    }
    let Some(validated) = validated.filter(|_| errors.is_empty()) else {
        return Err(CommandError::Validation(errors));
    };

    let slug = slug::unique_slug(pool, &validated.name).await?;
    let image = match upload {
        Some(upload) => Some(image_store::store_image(public_root, &upload).await?),
        None => None,
    };

    let id = brewery_repo::insert(
        pool,
        &NewBrewery {
            user_id: actor.user_id,
            name: validated.name,
            slug,
            description: validated.description,
            city: validated.city,
            address: validated.address,
            latitude: validated.latitude,
            longitude: validated.longitude,
            founded_year: validated.founded_year,
            website: validated.website,
            visitable: validated.visitable,
            image,
        },
    )
    .await?;

    Ok(id)
}

/// Owner or admin only. Name uniqueness is deliberately not re-checked on
/// update; the unique index still rejects an exact collision at the database
/// level.
pub async fn update_brewery(
    pool: &SqlitePool,
    public_root: &Path,
    actor: Actor,
    brewery: &BreweryRow,
    input: &BreweryInput,
    upload: Option<UploadedImage>,
) -> Result<(), CommandError> {
    if !actor.is_admin && brewery.user_id != Some(actor.user_id) {
        return Err(CommandError::Forbidden);
    }

    let mut errors = Vec::new();
    let Some(validated) = validate(input, upload.as_ref(), &mut errors) else {
        return Err(CommandError::Validation(errors));
    };

    // Replace the stored file before touching the row; the sentinel default
    // is never deleted.
    let new_image = match upload {
        Some(upload) => {
            if brewery.has_custom_image() {
                image_store::remove_image(public_root, brewery.image_path()).await?;
            }
            Some(image_store::store_image(public_root, &upload).await?)
        }
        None => None,
    };

    brewery_repo::update(
        pool,
        brewery.brewery_id,
        &BreweryChanges {
            name: validated.name,
            description: validated.description,
            city: validated.city,
            address: validated.address,
            latitude: validated.latitude,
            longitude: validated.longitude,
            founded_year: validated.founded_year,
            website: validated.website,
            visitable: validated.visitable,
        },
    )
    .await?;

    if let Some(path) = new_image {
        brewery_repo::set_image(pool, brewery.brewery_id, &path).await?;
    }

    Ok(())
}

/// Admin only. Removes the stored image file first (never the sentinel),
/// then the row; join-table rows go with it via cascades.
pub async fn delete_brewery(
    pool: &SqlitePool,
    public_root: &Path,
    actor: Actor,
    brewery: &BreweryRow,
) -> Result<(), CommandError> {
    if !actor.is_admin {
        return Err(CommandError::Forbidden);
    }

    if brewery.has_custom_image() {
        image_store::remove_image(public_root, brewery.image_path()).await?;
    }
    brewery_repo::delete(pool, brewery.brewery_id).await?;

    Ok(())
}

/// Current calendar year (UTC) without pulling in a date crate; days since
/// the epoch converted with the civil-from-days algorithm.
pub fn current_year() -> i64 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    year_from_epoch_days((secs / 86_400) as i64)
}

fn year_from_epoch_days(days: i64) -> i64 {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    if m <= 2 {
        y + 1
    } else {
        y
    }
}
