pub mod beers;
pub mod breweries;
pub mod reviews;
pub mod users;

pub use beers::BeerRow;
pub use breweries::{BreweryListRow, BreweryRow};
pub use reviews::ReviewRow;
pub use users::AuthUserRow;
