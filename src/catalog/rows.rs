//! Typed result rows

use serde::{Deserialize, Serialize};

use crate::model::{Inspection, Restaurant};
use crate::store::ObjectId;

/// Row of the average-rating report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuisineRating {
    #[serde(rename = "_id")]
    pub type_of_food: Option<String>,
    /// Null when no restaurant of the cuisine has a rating
    #[serde(rename = "avgRating")]
    pub avg_rating: Option<f64>,
}

/// Row of the result-distribution report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultShare {
    pub result: String,
    pub count: u64,
    /// Share of all inspections, 0 to 100
    pub percentage: f64,
}

/// Row of the worst-restaurants report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorstRestaurant {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub failed_inspection_count: u64,
    #[serde(rename = "URL", default)]
    pub url: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub type_of_food: String,
}

/// Entry of a cuisine's worst list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRestaurant {
    pub name: String,
    pub failed_inspection_count: u64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(rename = "URL", default)]
    pub url: Option<String>,
}

/// Row of the worst-per-cuisine report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuisineWorst {
    pub type_of_food: String,
    #[serde(rename = "worstRestaurants")]
    pub worst_restaurants: Vec<RankedRestaurant>,
}

/// A restaurant with its joined inspections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantWithInspections {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    #[serde(alias = "inspection_history")]
    pub inspections: Vec<Inspection>,
}
