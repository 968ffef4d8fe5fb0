mod common;

use std::path::Path;

use brouwgids::database::brewery_repo::{self, BreweryFilter, BreweryOrder, OrderDirection};
use brouwgids::models::breweries::DEFAULT_IMAGE;
use brouwgids::services::brewery_commands::{self, CommandError};
use brouwgids::services::brewery_service;
use brouwgids::services::image_store;
use brouwgids::services::slug;

use common::{
    add_review, admin, attach_beer, brewery_input, owner, png_upload, seed_user, setup_pool,
    temp_public_root,
};

async fn create(
    pool: &sqlx::SqlitePool,
    root: &Path,
    user_id: i64,
    name: &str,
    city: &str,
) -> i64 {
    brewery_commands::create_brewery(pool, root, owner(user_id), &brewery_input(name, city), None)
        .await
        .expect("create brewery")
}

#[tokio::test]
async fn create_assigns_owner_and_slug() {
    let pool = setup_pool().await;
    let root = temp_public_root();
    let user = seed_user(&pool, "Anna", "user").await;

    let id = create(&pool, &root, user, "River Brew", "Utrecht").await;

    let row = brewery_repo::find_by_id(&pool, id)
        .await
        .unwrap()
        .expect("row");
    assert_eq!(row.slug, "river-brew");
    assert_eq!(row.user_id, Some(user));
    assert_eq!(row.founded_year, Some(1998));
    assert!(row.image.is_none());
    assert_eq!(row.image_path(), DEFAULT_IMAGE);
}

#[tokio::test]
async fn slug_collisions_take_the_smallest_free_suffix() {
    let pool = setup_pool().await;
    let root = temp_public_root();
    let user = seed_user(&pool, "Anna", "user").await;

    // Distinct names that slugify identically.
    let first = create(&pool, &root, user, "River Brew", "Utrecht").await;
    let second = create(&pool, &root, user, "River  Brew", "Utrecht").await;

    let first = brewery_repo::find_by_id(&pool, first).await.unwrap().unwrap();
    let second = brewery_repo::find_by_id(&pool, second).await.unwrap().unwrap();
    assert_eq!(first.slug, "river-brew");
    assert_eq!(second.slug, "river-brew-1");

    assert_eq!(slug::unique_slug(&pool, "River Brew").await.unwrap(), "river-brew-2");
}

#[tokio::test]
async fn punctuation_only_names_get_a_fallback_slug() {
    let pool = setup_pool().await;
    let root = temp_public_root();
    let user = seed_user(&pool, "Anna", "user").await;

    // Validation only requires a non-empty name, so these are legal.
    let first = create(&pool, &root, user, "???", "Utrecht").await;
    let second = create(&pool, &root, user, "!!!", "Utrecht").await;

    let first = brewery_repo::find_by_id(&pool, first).await.unwrap().unwrap();
    let second = brewery_repo::find_by_id(&pool, second).await.unwrap().unwrap();
    assert_eq!(first.slug, "brouwerij");
    assert_eq!(second.slug, "brouwerij-1");

    // The fallback slug still routes to the detail page.
    let found = brewery_service::resolve_brewery(&pool, "brouwerij")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.brewery_id, first.brewery_id);
}

#[tokio::test]
async fn detail_resolves_by_id_name_and_slug() {
    let pool = setup_pool().await;
    let root = temp_public_root();
    let user = seed_user(&pool, "Anna", "user").await;
    let id = create(&pool, &root, user, "Oak House", "Austin").await;

    for identifier in [id.to_string(), "Oak House".to_string(), "oak-house".to_string()] {
        let found = brewery_service::resolve_brewery(&pool, &identifier)
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("no match for {identifier}"));
        assert_eq!(found.brewery_id, id);
    }

    assert!(brewery_service::resolve_brewery(&pool, "pine-hall")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn duplicate_name_is_rejected_on_create_but_not_validated_on_update() {
    let pool = setup_pool().await;
    let root = temp_public_root();
    let user = seed_user(&pool, "Anna", "user").await;
    create(&pool, &root, user, "Oak House", "Austin").await;
    let second = create(&pool, &root, user, "Pine Hall", "Denver").await;

    let err = brewery_commands::create_brewery(
        &pool,
        &root,
        owner(user),
        &brewery_input("Oak House", "Dallas"),
        None,
    )
    .await
    .expect_err("duplicate create");
    match err {
        CommandError::Validation(errors) => {
            assert!(errors.iter().any(|e| e.field == "name"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    // Update has no uniqueness validation; only the unique index catches the
    // collision, surfacing as a database error rather than a field message.
    let second_row = brewery_repo::find_by_id(&pool, second).await.unwrap().unwrap();
    let err = brewery_commands::update_brewery(
        &pool,
        &root,
        owner(user),
        &second_row,
        &brewery_input("Oak House", "Denver"),
        None,
    )
    .await
    .expect_err("duplicate update");
    assert!(matches!(err, CommandError::Db(_)));
}

#[tokio::test]
async fn update_and_delete_enforce_ownership_and_admin() {
    let pool = setup_pool().await;
    let root = temp_public_root();
    let anna = seed_user(&pool, "Anna", "user").await;
    let bart = seed_user(&pool, "Bart", "user").await;
    let site_admin = seed_user(&pool, "Admin", "admin").await;

    let id = create(&pool, &root, anna, "Oak House", "Austin").await;
    let row = brewery_repo::find_by_id(&pool, id).await.unwrap().unwrap();

    // Non-owner, non-admin cannot update and the record stays unchanged.
    let err = brewery_commands::update_brewery(
        &pool,
        &root,
        owner(bart),
        &row,
        &brewery_input("Hijacked", "Nowhere"),
        None,
    )
    .await
    .expect_err("foreign update");
    assert!(matches!(err, CommandError::Forbidden));
    let unchanged = brewery_repo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(unchanged.name, "Oak House");

    // Owner can update.
    brewery_commands::update_brewery(
        &pool,
        &root,
        owner(anna),
        &row,
        &brewery_input("Oak House Brewing", "Austin"),
        None,
    )
    .await
    .expect("owner update");

    // Delete is admin-only, even for the owner.
    let row = brewery_repo::find_by_id(&pool, id).await.unwrap().unwrap();
    let err = brewery_commands::delete_brewery(&pool, &root, owner(anna), &row)
        .await
        .expect_err("owner delete");
    assert!(matches!(err, CommandError::Forbidden));
    assert!(brewery_repo::find_by_id(&pool, id).await.unwrap().is_some());

    brewery_commands::delete_brewery(&pool, &root, admin(site_admin), &row)
        .await
        .expect("admin delete");
    assert!(brewery_repo::find_by_id(&pool, id).await.unwrap().is_none());
}

#[tokio::test]
async fn average_rating_is_zero_without_reviews_and_the_mean_with() {
    let pool = setup_pool().await;
    let root = temp_public_root();
    let user = seed_user(&pool, "Anna", "user").await;
    let id = create(&pool, &root, user, "Oak House", "Austin").await;

    let rows = brewery_repo::search(&pool, &BreweryFilter::default(), 10, 0)
        .await
        .unwrap();
    assert_eq!(rows[0].average_rating, 0.0);

    add_review(&pool, id, 3).await;
    add_review(&pool, id, 5).await;

    let rows = brewery_repo::search(&pool, &BreweryFilter::default(), 10, 0)
        .await
        .unwrap();
    assert_eq!(rows[0].average_rating, 4.0);

    let detail = brewery_service::load_brewery_detail(&pool, "oak-house", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(detail.average_rating_label, "4.0");
    assert_eq!(detail.reviews.len(), 2);
}

#[tokio::test]
async fn search_and_location_filters_select_the_right_rows() {
    let pool = setup_pool().await;
    let root = temp_public_root();
    let user = seed_user(&pool, "Anna", "user").await;
    create(&pool, &root, user, "Oak House", "Austin").await;
    create(&pool, &root, user, "Pine Hall", "Denver").await;

    let filter = BreweryFilter {
        search: Some("Oak".to_string()),
        ..BreweryFilter::default()
    };
    let rows = brewery_repo::search(&pool, &filter, 10, 0).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Oak House");

    let filter = BreweryFilter {
        location: Some("Denver".to_string()),
        ..BreweryFilter::default()
    };
    let rows = brewery_repo::search(&pool, &filter, 10, 0).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Pine Hall");

    // Search also matches the description.
    let filter = BreweryFilter {
        search: Some("small batch".to_string()),
        ..BreweryFilter::default()
    };
    let rows = brewery_repo::search(&pool, &filter, 10, 0).await.unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn name_and_city_filters_match_substrings() {
    let pool = setup_pool().await;
    let root = temp_public_root();
    let user = seed_user(&pool, "Anna", "user").await;
    create(&pool, &root, user, "Oak House", "Austin").await;
    create(&pool, &root, user, "Pine Hall", "Denver").await;

    let filter = BreweryFilter {
        name: Some("oak".to_string()),
        ..BreweryFilter::default()
    };
    let rows = brewery_repo::search(&pool, &filter, 10, 0).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Oak House");

    let filter = BreweryFilter {
        city: Some("denv".to_string()),
        ..BreweryFilter::default()
    };
    let rows = brewery_repo::search(&pool, &filter, 10, 0).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Pine Hall");

    // Both at once narrows to the intersection.
    let filter = BreweryFilter {
        name: Some("oak".to_string()),
        city: Some("denv".to_string()),
        ..BreweryFilter::default()
    };
    let rows = brewery_repo::search(&pool, &filter, 10, 0).await.unwrap();
    assert!(rows.is_empty());

    // The index accepts the same filters as query parameters.
    let page = brewery_service::build_brewery_index(
        &pool,
        &brewery_service::BreweryListQuery {
            name: Some("pine".to_string()),
            city: Some("Denver".to_string()),
            ..brewery_service::BreweryListQuery::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(page.breweries.len(), 1);
    assert_eq!(page.breweries[0].name, "Pine Hall");
}

#[tokio::test]
async fn filter_builder_supports_bounds_flags_and_rating_sort() {
    let pool = setup_pool().await;
    let root = temp_public_root();
    let user = seed_user(&pool, "Anna", "user").await;

    let mut input = brewery_input("Oak House", "Austin");
    input.founded_year = "1920".to_string();
    input.visitable = true;
    let oak = brewery_commands::create_brewery(&pool, &root, owner(user), &input, None)
        .await
        .unwrap();

    let mut input = brewery_input("Pine Hall", "Denver");
    input.founded_year = "1999".to_string();
    let pine = brewery_commands::create_brewery(&pool, &root, owner(user), &input, None)
        .await
        .unwrap();

    add_review(&pool, oak, 2).await;
    add_review(&pool, pine, 5).await;

    let filter = BreweryFilter {
        visitable: Some(true),
        ..BreweryFilter::default()
    };
    let rows = brewery_repo::search(&pool, &filter, 10, 0).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].brewery_id, oak);

    let filter = BreweryFilter {
        year_min: Some(1900),
        year_max: Some(1950),
        ..BreweryFilter::default()
    };
    let rows = brewery_repo::search(&pool, &filter, 10, 0).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].brewery_id, oak);

    // One-sided bound.
    let filter = BreweryFilter {
        year_min: Some(1990),
        ..BreweryFilter::default()
    };
    let rows = brewery_repo::search(&pool, &filter, 10, 0).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].brewery_id, pine);

    let filter = BreweryFilter {
        order: Some((BreweryOrder::Rating, OrderDirection::Desc)),
        ..BreweryFilter::default()
    };
    let rows = brewery_repo::search(&pool, &filter, 10, 0).await.unwrap();
    assert_eq!(rows[0].brewery_id, pine);
    assert_eq!(rows[1].brewery_id, oak);

    // Unrecognized sort key falls back to name ascending.
    let filter = BreweryFilter {
        order: Some((BreweryOrder::parse("bogus"), OrderDirection::parse("sideways"))),
        ..BreweryFilter::default()
    };
    let rows = brewery_repo::search(&pool, &filter, 10, 0).await.unwrap();
    assert_eq!(rows[0].name, "Oak House");
    assert_eq!(rows[1].name, "Pine Hall");
}

#[tokio::test]
async fn index_is_newest_first_in_pages_of_twelve() {
    let pool = setup_pool().await;
    let root = temp_public_root();
    let user = seed_user(&pool, "Anna", "user").await;

    for i in 0..13 {
        create(&pool, &root, user, &format!("Brewery {i:02}"), "Utrecht").await;
    }

    let page = brewery_service::build_brewery_index(
        &pool,
        &brewery_service::BreweryListQuery::default(),
    )
    .await
    .unwrap();
    assert_eq!(page.breweries.len(), 12);
    assert_eq!(page.breweries[0].name, "Brewery 12");

    let page = brewery_service::build_brewery_index(
        &pool,
        &brewery_service::BreweryListQuery {
            page: Some(2),
            ..brewery_service::BreweryListQuery::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(page.breweries.len(), 1);
    assert_eq!(page.breweries[0].name, "Brewery 00");
}

#[tokio::test]
async fn my_listings_only_show_the_owners_breweries() {
    let pool = setup_pool().await;
    let root = temp_public_root();
    let anna = seed_user(&pool, "Anna", "user").await;
    let bart = seed_user(&pool, "Bart", "user").await;

    create(&pool, &root, anna, "Oak House", "Austin").await;
    let pine = create(&pool, &root, anna, "Pine Hall", "Denver").await;
    create(&pool, &root, bart, "Elm Works", "Boston").await;

    attach_beer(&pool, pine, "Tripel", "Belgian").await;

    let mine = brewery_service::build_my_listings(&pool, anna, None).await.unwrap();
    assert_eq!(mine.breweries.len(), 2);
    // Newest first.
    assert_eq!(mine.breweries[0].name, "Pine Hall");
    assert_eq!(mine.breweries[0].beers.len(), 1);
    assert_eq!(mine.breweries[0].beers[0].name, "Tripel");
}

#[tokio::test]
async fn image_files_follow_the_listing_lifecycle() {
    let pool = setup_pool().await;
    let root = temp_public_root();
    let anna = seed_user(&pool, "Anna", "user").await;
    let site_admin = seed_user(&pool, "Admin", "admin").await;

    let id = brewery_commands::create_brewery(
        &pool,
        &root,
        owner(anna),
        &brewery_input("Oak House", "Austin"),
        Some(png_upload(&[1, 2, 3, 4])),
    )
    .await
    .expect("create with image");

    let row = brewery_repo::find_by_id(&pool, id).await.unwrap().unwrap();
    let first_image = row.image.clone().expect("stored image path");
    assert!(root.join(&first_image).is_file());

    // A replacement upload removes the previous file.
    brewery_commands::update_brewery(
        &pool,
        &root,
        owner(anna),
        &row,
        &brewery_input("Oak House", "Austin"),
        Some(png_upload(&[9, 9, 9])),
    )
    .await
    .expect("update with new image");

    let row = brewery_repo::find_by_id(&pool, id).await.unwrap().unwrap();
    let second_image = row.image.clone().expect("replaced image path");
    assert_ne!(first_image, second_image);
    assert!(!root.join(&first_image).exists());
    assert!(root.join(&second_image).is_file());

    // Admin delete removes the stored file along with the row.
    brewery_commands::delete_brewery(&pool, &root, admin(site_admin), &row)
        .await
        .expect("admin delete");
    assert!(!root.join(&second_image).exists());
}

#[tokio::test]
async fn the_default_image_sentinel_is_never_deleted() {
    let root = temp_public_root();
    let sentinel = root.join(DEFAULT_IMAGE);
    std::fs::create_dir_all(sentinel.parent().unwrap()).unwrap();
    std::fs::write(&sentinel, b"placeholder").unwrap();

    image_store::remove_image(&root, DEFAULT_IMAGE)
        .await
        .expect("sentinel remove is a no-op");
    assert!(sentinel.is_file());

    // Removing a path that was already cleaned up is not an error either.
    image_store::remove_image(&root, "breweries/uploads/gone.png")
        .await
        .expect("missing file remove");
}
