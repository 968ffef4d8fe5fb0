use serde::Deserialize;
use sqlx::SqlitePool;

use crate::database::brewery_repo::{self, BreweryFilter, BreweryOrder, OrderDirection};
use crate::database::{beer_repo, review_repo};
use crate::models::{BreweryListRow, BreweryRow};

pub const INDEX_PAGE_SIZE: i64 = 12;
pub const MY_LISTINGS_PAGE_SIZE: i64 = 10;
pub const DETAIL_BEERS_PAGE_SIZE: i64 = 8;
const DETAIL_REVIEWS_LIMIT: i64 = 5;

#[derive(Debug, Deserialize, Default)]
pub struct BreweryListQuery {
    pub location: Option<String>,
    pub search: Option<String>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub visitable: Option<bool>,
    pub year_min: Option<i64>,
    pub year_max: Option<i64>,
    pub order_by: Option<String>,
    pub order_direction: Option<String>,
    pub page: Option<i64>,
    pub notice: Option<String>,
}

/// Echo of the applied filters for the template form fields.
#[derive(Debug, Clone, Default)]
pub struct AppliedBreweryFilters {
    pub location: String,
    pub search: String,
    pub order_by: String,
    pub order_direction: String,
}

#[derive(Debug, Clone)]
pub struct BeerSummaryView {
    pub name: String,
    pub style: String,
}

pub struct BreweryCardView {
    pub brewery_id: i64,
    pub name: String,
    pub slug: String,
    pub city: String,
    pub description: String,
    pub image: String,
    pub founded_year_label: String,
    pub visitable: bool,
    pub average_rating_label: String,
    pub beers: Vec<BeerSummaryView>,
}

pub struct BreweryIndexPage {
    pub breweries: Vec<BreweryCardView>,
    pub filters: AppliedBreweryFilters,
    pub page: i64,
}

pub async fn build_brewery_index(
    pool: &SqlitePool,
    query: &BreweryListQuery,
) -> sqlx::Result<BreweryIndexPage> {
    let filter = BreweryFilter {
        location: query.location.clone(),
        search: query.search.clone(),
        name: query.name.clone(),
        city: query.city.clone(),
        visitable: query.visitable,
        year_min: query.year_min,
        year_max: query.year_max,
        order: parse_order(query.order_by.as_deref(), query.order_direction.as_deref()),
        ..BreweryFilter::default()
    };

    let (page, offset) = page_offset(query.page, INDEX_PAGE_SIZE);
    let rows = brewery_repo::search(pool, &filter, INDEX_PAGE_SIZE, offset).await?;

    Ok(BreweryIndexPage {
        breweries: rows.into_iter().map(card_from_row).collect(),
        filters: AppliedBreweryFilters {
            location: query.location.clone().unwrap_or_default(),
            search: query.search.clone().unwrap_or_default(),
            order_by: query.order_by.clone().unwrap_or_default(),
            order_direction: query.order_direction.clone().unwrap_or_default(),
        },
        page,
    })
}

pub struct MyListingsPage {
    pub breweries: Vec<BreweryCardView>,
    pub page: i64,
}

pub async fn build_my_listings(
    pool: &SqlitePool,
    owner_user_id: i64,
    page: Option<i64>,
) -> sqlx::Result<MyListingsPage> {
    let filter = BreweryFilter {
        user_id: Some(owner_user_id),
        ..BreweryFilter::default()
    };
    let (page, offset) = page_offset(page, MY_LISTINGS_PAGE_SIZE);
    let rows = brewery_repo::search(pool, &filter, MY_LISTINGS_PAGE_SIZE, offset).await?;

    Ok(MyListingsPage {
        breweries: rows.into_iter().map(card_from_row).collect(),
        page,
    })
}

/// Resolution chain for detail/edit URLs: a numeric identifier is a primary
/// key, otherwise try the exact name, then the slug. First match wins.
pub async fn resolve_brewery(
    pool: &SqlitePool,
    identifier: &str,
) -> sqlx::Result<Option<BreweryRow>> {
    if let Ok(id) = identifier.parse::<i64>() {
        if let Some(brewery) = brewery_repo::find_by_id(pool, id).await? {
            return Ok(Some(brewery));
        }
    }
    if let Some(brewery) = brewery_repo::find_by_name(pool, identifier).await? {
        return Ok(Some(brewery));
    }
    brewery_repo::find_by_slug(pool, identifier).await
}

pub struct BeerView {
    pub name: String,
    pub style: String,
    pub abv_label: String,
}

pub struct ReviewView {
    pub rating: i64,
    pub body: String,
    pub created_at: String,
}

pub struct BreweryDetailView {
    pub brewery_id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub city: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub founded_year_label: String,
    pub website: String,
    pub visitable: bool,
    pub image: String,
    pub average_rating_label: String,
    pub favorites_count: i64,
    pub beers: Vec<BeerView>,
    pub beers_page: i64,
    pub reviews: Vec<ReviewView>,
}

pub async fn load_brewery_detail(
    pool: &SqlitePool,
    identifier: &str,
    beers_page: Option<i64>,
) -> sqlx::Result<Option<BreweryDetailView>> {
    let Some(brewery) = resolve_brewery(pool, identifier).await? else {
        return Ok(None);
    };

    let (beers_page, offset) = page_offset(beers_page, DETAIL_BEERS_PAGE_SIZE);
    let beers = beer_repo::list_for_brewery(pool, brewery.brewery_id, DETAIL_BEERS_PAGE_SIZE, offset)
        .await?
        .into_iter()
        .map(|b| BeerView {
            name: b.name,
            style: b.style.unwrap_or_default(),
            abv_label: b.abv.map(|v| format!("{v:.1}%")).unwrap_or_default(),
        })
        .collect();

    let average_rating =
        review_repo::average_rating_for_brewery(pool, brewery.brewery_id).await?;
    let favorites_count = brewery_repo::favorites_count(pool, brewery.brewery_id).await?;
    let reviews = review_repo::recent_for_brewery(pool, brewery.brewery_id, DETAIL_REVIEWS_LIMIT)
        .await?
        .into_iter()
        .map(|r| ReviewView {
            rating: r.rating,
            body: r.body.unwrap_or_default(),
            created_at: r.created_at,
        })
        .collect();

    Ok(Some(BreweryDetailView {
        brewery_id: brewery.brewery_id,
        name: brewery.name.clone(),
        slug: brewery.slug.clone(),
        description: brewery.description.clone(),
        city: brewery.city.clone(),
        address: brewery.address.clone(),
        latitude: brewery.latitude,
        longitude: brewery.longitude,
        founded_year_label: brewery
            .founded_year
            .map(|y| y.to_string())
            .unwrap_or_default(),
        website: brewery.website.clone().unwrap_or_default(),
        visitable: brewery.visitable == 1,
        image: brewery.image_path().to_string(),
        average_rating_label: format!("{average_rating:.1}"),
        favorites_count,
        beers,
        beers_page,
        reviews,
    }))
}

/// Clamps an optional request page to 1-or-higher and derives the row offset.
/// The page comes straight from the query string; the multiply saturates so an
/// absurd value yields an empty page instead of an overflow.
fn page_offset(page: Option<i64>, page_size: i64) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    (page, (page - 1).saturating_mul(page_size))
}

fn parse_order(
    order_by: Option<&str>,
    order_direction: Option<&str>,
) -> Option<(BreweryOrder, OrderDirection)> {
    let order_by = order_by.map(str::trim).filter(|s| !s.is_empty())?;
    Some((
        BreweryOrder::parse(order_by),
        OrderDirection::parse(order_direction.map(str::trim).unwrap_or("")),
    ))
}

#[derive(Debug, Deserialize)]
struct BeerJson {
    name: Option<String>,
    style: Option<String>,
}

fn parse_beers_json(raw_json: Option<&str>) -> Vec<BeerSummaryView> {
    let Some(raw) = raw_json.map(str::trim).filter(|s| !s.is_empty()) else {
        return Vec::new();
    };
    let parsed: Vec<BeerJson> = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };

    parsed
        .into_iter()
        .filter_map(|b| {
            let name = b.name.map(|n| n.trim().to_string())?;
            if name.is_empty() {
                return None;
            }
            Some(BeerSummaryView {
                name,
                style: b.style.unwrap_or_default(),
            })
        })
        .collect()
}

fn card_from_row(row: BreweryListRow) -> BreweryCardView {
    let beers = parse_beers_json(row.beers_json.as_deref());
    BreweryCardView {
        brewery_id: row.brewery_id,
        name: row.name,
        slug: row.slug,
        city: row.city,
        description: row.description,
        image: row
            .image
            .unwrap_or_else(|| crate::models::breweries::DEFAULT_IMAGE.to_string()),
        founded_year_label: row
            .founded_year
            .map(|y| y.to_string())
            .unwrap_or_default(),
        visitable: row.visitable == 1,
        average_rating_label: format!("{:.1}", row.average_rating),
        beers,
    }
}
