pub mod beer_repo;
pub mod brewery_repo;
pub mod review_repo;
pub mod schema;
pub mod user_repo;
