//! Query and aggregation catalog
//!
//! Fixed, parameterizable reads over `restaurants` and `inspections`:
//! - cuisine filter, violations by date, rating threshold
//! - average rating per cuisine, inspection result distribution
//! - restaurant/inspection join, clean-record restaurants
//! - worst restaurants overall and per cuisine
//!
//! Entries are pure read specifications (`CatalogQuery`); `Catalog` runs
//! them in memory and decodes typed rows.

#[allow(clippy::module_inception)]
mod catalog;
mod errors;
mod queries;
mod rows;

pub use catalog::{Catalog, CatalogEntry, QueryParams};
pub use errors::{CatalogError, CatalogResult};
pub use queries::{
    average_rating_by_cuisine, clean_record_restaurants, inspection_result_distribution, restaurants_by_cuisine,
    restaurants_rated_above, restaurants_with_inspections, violations_by_date, worst_restaurants,
    worst_restaurants_by_cuisine, CatalogQuery, DEFAULT_MAX_CUISINES, DEFAULT_MIN_RATING, DEFAULT_WORST_LIMIT,
    DEFAULT_WORST_PER_CUISINE,
};
pub use rows::{CuisineRating, CuisineWorst, RankedRestaurant, ResultShare, RestaurantWithInspections, WorstRestaurant};
