//! Typed catalog facade
//!
//! Runs catalog queries against a `CollectionSource` inside an
//! `ObservationScope` and decodes result documents into row types.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::errors::{CatalogError, CatalogResult};
use super::queries::{self, CatalogQuery};
use super::rows::{CuisineRating, CuisineWorst, ResultShare, RestaurantWithInspections, WorstRestaurant};
use crate::model::{Inspection, Restaurant};
use crate::observability::ObservationScope;
use crate::pipeline::CollectionSource;

/// Named catalog entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogEntry {
    RestaurantsByCuisine,
    ViolationsByDate,
    RatedAbove,
    AverageRating,
    ResultDistribution,
    RestaurantsWithInspections,
    CleanRecord,
    Worst,
    WorstByCuisine,
}

impl CatalogEntry {
    pub const ALL: [CatalogEntry; 9] = [
        CatalogEntry::RestaurantsByCuisine,
        CatalogEntry::ViolationsByDate,
        CatalogEntry::RatedAbove,
        CatalogEntry::AverageRating,
        CatalogEntry::ResultDistribution,
        CatalogEntry::RestaurantsWithInspections,
        CatalogEntry::CleanRecord,
        CatalogEntry::Worst,
        CatalogEntry::WorstByCuisine,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CatalogEntry::RestaurantsByCuisine => "restaurants-by-cuisine",
            CatalogEntry::ViolationsByDate => "violations-by-date",
            CatalogEntry::RatedAbove => "rated-above",
            CatalogEntry::AverageRating => "average-rating",
            CatalogEntry::ResultDistribution => "result-distribution",
            CatalogEntry::RestaurantsWithInspections => "restaurants-with-inspections",
            CatalogEntry::CleanRecord => "clean-record",
            CatalogEntry::Worst => "worst",
            CatalogEntry::WorstByCuisine => "worst-by-cuisine",
        }
    }

    /// Builds the query for this entry
    pub fn query(&self, params: &QueryParams) -> CatalogQuery {
        match self {
            CatalogEntry::RestaurantsByCuisine => queries::restaurants_by_cuisine(&params.cuisine),
            CatalogEntry::ViolationsByDate => queries::violations_by_date(),
            CatalogEntry::RatedAbove => queries::restaurants_rated_above(params.min_rating),
            CatalogEntry::AverageRating => queries::average_rating_by_cuisine(),
            CatalogEntry::ResultDistribution => queries::inspection_result_distribution(),
            CatalogEntry::RestaurantsWithInspections => queries::restaurants_with_inspections(),
            CatalogEntry::CleanRecord => queries::clean_record_restaurants(),
            CatalogEntry::Worst => queries::worst_restaurants(params.limit),
            CatalogEntry::WorstByCuisine => {
                queries::worst_restaurants_by_cuisine(params.per_cuisine, params.max_cuisines)
            }
        }
    }
}

impl fmt::Display for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CatalogEntry {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|entry| entry.name() == s)
            .ok_or_else(|| CatalogError::UnknownEntry(s.to_string()))
    }
}

/// Parameters of the parameterized entries
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    pub cuisine: String,
    pub min_rating: f64,
    pub limit: i64,
    pub per_cuisine: i64,
    pub max_cuisines: i64,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            cuisine: "Chinese".to_string(),
            min_rating: queries::DEFAULT_MIN_RATING,
            limit: queries::DEFAULT_WORST_LIMIT,
            per_cuisine: queries::DEFAULT_WORST_PER_CUISINE,
            max_cuisines: queries::DEFAULT_MAX_CUISINES,
        }
    }
}

/// Runs catalog queries against a source
pub struct Catalog<'a, S: CollectionSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: CollectionSource + ?Sized> Catalog<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Runs an entry and returns raw result documents
    pub fn run(&self, entry: CatalogEntry, params: &QueryParams) -> CatalogResult<Vec<Value>> {
        let scope = ObservationScope::begin(entry.name());
        match entry.query(params).run(self.source) {
            Ok(result) => {
                scope.complete(result.returned_count);
                Ok(result.into_documents())
            }
            Err(e) => {
                scope.fail(&e.to_string());
                Err(e.into())
            }
        }
    }

    fn rows<T: DeserializeOwned>(&self, entry: CatalogEntry, params: &QueryParams) -> CatalogResult<Vec<T>> {
        self.run(entry, params)?
            .into_iter()
            .map(|doc| {
                serde_json::from_value(doc).map_err(|source| CatalogError::Decode {
                    query: entry.name(),
                    source,
                })
            })
            .collect()
    }

    pub fn restaurants_by_cuisine(&self, cuisine: &str) -> CatalogResult<Vec<Restaurant>> {
        let params = QueryParams {
            cuisine: cuisine.to_string(),
            ..QueryParams::default()
        };
        self.rows(CatalogEntry::RestaurantsByCuisine, &params)
    }

    pub fn violations_by_date(&self) -> CatalogResult<Vec<Inspection>> {
        self.rows(CatalogEntry::ViolationsByDate, &QueryParams::default())
    }

    pub fn restaurants_rated_above(&self, threshold: f64) -> CatalogResult<Vec<Restaurant>> {
        let params = QueryParams {
            min_rating: threshold,
            ..QueryParams::default()
        };
        self.rows(CatalogEntry::RatedAbove, &params)
    }

    pub fn average_rating_by_cuisine(&self) -> CatalogResult<Vec<CuisineRating>> {
        self.rows(CatalogEntry::AverageRating, &QueryParams::default())
    }

    pub fn inspection_result_distribution(&self) -> CatalogResult<Vec<ResultShare>> {
        self.rows(CatalogEntry::ResultDistribution, &QueryParams::default())
    }

    pub fn restaurants_with_inspections(&self) -> CatalogResult<Vec<RestaurantWithInspections>> {
        self.rows(CatalogEntry::RestaurantsWithInspections, &QueryParams::default())
    }

    pub fn clean_record_restaurants(&self) -> CatalogResult<Vec<RestaurantWithInspections>> {
        self.rows(CatalogEntry::CleanRecord, &QueryParams::default())
    }

    pub fn worst_restaurants(&self, limit: i64) -> CatalogResult<Vec<WorstRestaurant>> {
        let params = QueryParams {
            limit,
            ..QueryParams::default()
        };
        self.rows(CatalogEntry::Worst, &params)
    }

    pub fn worst_restaurants_by_cuisine(&self, per_cuisine: i64, max_cuisines: i64) -> CatalogResult<Vec<CuisineWorst>> {
        let params = QueryParams {
            per_cuisine,
            max_cuisines,
            ..QueryParams::default()
        };
        self.rows(CatalogEntry::WorstByCuisine, &params)
    }
}
