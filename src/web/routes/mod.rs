pub mod breweries;
pub mod brewery;
