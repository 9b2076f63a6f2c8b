//! Catalog Scenario Tests
//!
//! End-to-end reads over a validated in-memory store:
//! - joins on the string form of the restaurant `_id`
//! - grouping, averaging and percentage reports
//! - worst-restaurant rankings, overall and per cuisine
//! - rendered command text

use inspectdb::catalog::{Catalog, CatalogEntry, QueryParams};
use inspectdb::model::{Inspection, InspectionResult, Restaurant};
use inspectdb::schema::{ValidatorCommand, INSPECTIONS, RESTAURANTS};
use inspectdb::store::{DocumentStore, ObjectId};
use serde_json::json;

use InspectionResult::{Fail, Pass, ViolationIssued};

// =============================================================================
// Helper Functions
// =============================================================================

fn empty_store() -> DocumentStore {
    let mut store = DocumentStore::with_collections([RESTAURANTS, INSPECTIONS]);
    for command in ValidatorCommand::defaults() {
        store.apply_command(&command).unwrap();
    }
    store
}

fn add_restaurant(store: &mut DocumentStore, restaurant: Restaurant) -> ObjectId {
    store.insert_record(RESTAURANTS, &restaurant).unwrap()
}

fn inspect(store: &mut DocumentStore, restaurant: &ObjectId, date: &str, results: &[InspectionResult]) {
    for result in results {
        store
            .insert_record(INSPECTIONS, &Inspection::of(restaurant, date, *result))
            .unwrap();
    }
}

// =============================================================================
// Find Scenarios
// =============================================================================

/// Cuisine filter is exact and case-sensitive.
#[test]
fn test_restaurants_by_cuisine() {
    let mut store = empty_store();
    add_restaurant(&mut store, Restaurant::new("Golden Dragon", "Chinese"));
    add_restaurant(&mut store, Restaurant::new("Jade Garden", "chinese"));
    add_restaurant(&mut store, Restaurant::new("Bangkok Bites", "Thai"));

    let rows = Catalog::new(&store).restaurants_by_cuisine("Chinese").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Golden Dragon");
    assert!(rows[0].id.is_some());
}

/// Rating threshold is exclusive; unrated restaurants never qualify.
#[test]
fn test_rated_above_threshold() {
    let mut store = empty_store();
    add_restaurant(&mut store, Restaurant::new("A", "Thai").with_rating(4.0));
    add_restaurant(&mut store, Restaurant::new("B", "Thai").with_rating(4.5));
    add_restaurant(&mut store, Restaurant::new("C", "Thai"));

    let rows = Catalog::new(&store).restaurants_rated_above(4.0).unwrap();
    let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["B"]);
}

/// Dates sort as strings: "Apr 1 2023" comes before "Jan 5 2020".
#[test]
fn test_violations_sort_lexicographically() {
    let mut store = empty_store();
    let id = add_restaurant(&mut store, Restaurant::new("A", "Thai"));
    inspect(&mut store, &id, "Jan 5 2020", &[ViolationIssued]);
    inspect(&mut store, &id, "Apr 1 2023", &[ViolationIssued]);
    inspect(&mut store, &id, "Feb 2 2021", &[Pass]);

    let rows = Catalog::new(&store).violations_by_date().unwrap();
    let dates: Vec<_> = rows.iter().map(|r| r.date.as_str()).collect();
    assert_eq!(dates, vec!["Apr 1 2023", "Jan 5 2020"]);
}

// =============================================================================
// Aggregation Scenarios
// =============================================================================

/// A 5.0 and B 3.0, both Chinese, average 4.0.
#[test]
fn test_average_rating() {
    let mut store = empty_store();
    add_restaurant(&mut store, Restaurant::new("A", "Chinese").with_rating(5.0));
    add_restaurant(&mut store, Restaurant::new("B", "Chinese").with_rating(3.0));
    add_restaurant(&mut store, Restaurant::new("C", "Thai"));

    let rows = Catalog::new(&store).average_rating_by_cuisine().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].type_of_food.as_deref(), Some("Chinese"));
    assert_eq!(rows[0].avg_rating, Some(4.0));
    assert_eq!(rows[1].type_of_food.as_deref(), Some("Thai"));
    assert_eq!(rows[1].avg_rating, None);
}

/// Pass x3 and Fail x1 give 75% and 25%, Pass first.
#[test]
fn test_result_distribution() {
    let mut store = empty_store();
    let id = add_restaurant(&mut store, Restaurant::new("A", "Thai"));
    inspect(&mut store, &id, "Jan 5 2020", &[Fail, Pass, Pass, Pass]);

    let rows = Catalog::new(&store).inspection_result_distribution().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!((rows[0].result.as_str(), rows[0].count, rows[0].percentage), ("Pass", 3, 75.0));
    assert_eq!((rows[1].result.as_str(), rows[1].count, rows[1].percentage), ("Fail", 1, 25.0));

    let total: f64 = rows.iter().map(|r| r.percentage).sum();
    assert!((total - 100.0).abs() < 1e-9);
}

/// No inspections, no rows.
#[test]
fn test_result_distribution_empty() {
    let store = empty_store();
    assert!(Catalog::new(&store).inspection_result_distribution().unwrap().is_empty());
}

// =============================================================================
// Join Scenarios
// =============================================================================

/// Restaurant X and an inspection keyed by toString(X) pair up exactly once.
#[test]
fn test_join_round_trip() {
    let mut store = empty_store();
    let x = add_restaurant(&mut store, Restaurant::new("X", "Thai"));
    let y = add_restaurant(&mut store, Restaurant::new("Y", "Thai"));
    inspect(&mut store, &x, "Mar 3 2023", &[Pass]);

    let rows = Catalog::new(&store).restaurants_with_inspections().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].restaurant.id, Some(x));
    assert_eq!(rows[0].inspections.len(), 1);
    assert_eq!(rows[0].inspections[0].restaurant_id, x.to_hex());
    assert_eq!(rows[1].restaurant.id, Some(y));
    assert!(rows[1].inspections.is_empty());
}

/// Zero Fail inspections qualify; a single Fail disqualifies.
#[test]
fn test_clean_record() {
    let mut store = empty_store();
    let clean = add_restaurant(&mut store, Restaurant::new("Clean", "Thai"));
    let failed = add_restaurant(&mut store, Restaurant::new("Failed", "Thai"));
    add_restaurant(&mut store, Restaurant::new("Uninspected", "Thai"));
    inspect(&mut store, &clean, "Jan 5 2020", &[Pass, ViolationIssued]);
    inspect(&mut store, &failed, "Jan 5 2020", &[Pass, Fail]);

    let rows = Catalog::new(&store).clean_record_restaurants().unwrap();
    let names: Vec<_> = rows.iter().map(|r| r.restaurant.name.as_str()).collect();
    assert_eq!(names, vec!["Clean", "Uninspected"]);
    assert_eq!(rows[0].inspections.len(), 2);
}

// =============================================================================
// Ranking Scenarios
// =============================================================================

/// Top ten of three restaurants is all three, worst first.
#[test]
fn test_worst_restaurants_fewer_than_limit() {
    let mut store = empty_store();
    let a = add_restaurant(&mut store, Restaurant::new("A", "Thai").with_address("1 Main St"));
    let b = add_restaurant(&mut store, Restaurant::new("B", "Thai").with_url("http://b.example"));
    add_restaurant(&mut store, Restaurant::new("C", "Chinese"));
    inspect(&mut store, &a, "Jan 5 2020", &[Fail, Pass]);
    inspect(&mut store, &b, "Jan 5 2020", &[Fail, ViolationIssued]);

    let rows = Catalog::new(&store).worst_restaurants(10).unwrap();
    assert_eq!(rows.len(), 3);

    let ranked: Vec<_> = rows.iter().map(|r| (r.name.as_str(), r.failed_inspection_count)).collect();
    assert_eq!(ranked, vec![("B", 2), ("A", 1), ("C", 0)]);
    assert_eq!(rows[0].id, b);
    assert_eq!(rows[0].url.as_deref(), Some("http://b.example"));
    assert_eq!(rows[1].address.as_deref(), Some("1 Main St"));
}

/// Each cuisine's list keeps the global worst-first order, capped per cuisine.
#[test]
fn test_worst_by_cuisine_push_order() {
    let mut store = empty_store();
    let t1 = add_restaurant(&mut store, Restaurant::new("T1", "Thai"));
    let t2 = add_restaurant(&mut store, Restaurant::new("T2", "Thai"));
    let t3 = add_restaurant(&mut store, Restaurant::new("T3", "Thai"));
    add_restaurant(&mut store, Restaurant::new("C1", "Chinese"));
    inspect(&mut store, &t1, "Jan 5 2020", &[Fail, Fail, ViolationIssued]);
    inspect(&mut store, &t2, "Jan 5 2020", &[Fail]);
    inspect(&mut store, &t3, "Jan 5 2020", &[Fail, ViolationIssued, Pass]);

    let rows = Catalog::new(&store).worst_restaurants_by_cuisine(2, 10).unwrap();
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0].type_of_food, "Thai");
    let thai: Vec<_> = rows[0]
        .worst_restaurants
        .iter()
        .map(|r| (r.name.as_str(), r.failed_inspection_count))
        .collect();
    assert_eq!(thai, vec![("T1", 3), ("T3", 2)]);

    assert_eq!(rows[1].type_of_food, "Chinese");
    assert_eq!(rows[1].worst_restaurants.len(), 1);
    assert_eq!(rows[1].worst_restaurants[0].failed_inspection_count, 0);
}

/// The cuisine cap limits the number of rows.
#[test]
fn test_worst_by_cuisine_cap() {
    let mut store = empty_store();
    for cuisine in ["Thai", "Chinese", "Pizza"] {
        add_restaurant(&mut store, Restaurant::new(format!("{} place", cuisine), cuisine));
    }

    let rows = Catalog::new(&store).worst_restaurants_by_cuisine(2, 2).unwrap();
    assert_eq!(rows.len(), 2);
}

/// Rankings over a sample-sized dataset.
#[test]
fn test_worst_restaurants_at_dataset_scale() {
    let mut store = empty_store();
    let ids: Vec<_> = (0..400)
        .map(|n| add_restaurant(&mut store, Restaurant::new(format!("R{}", n), "Thai")))
        .collect();
    for (n, id) in ids.iter().enumerate() {
        let fails = vec![Fail; n % 7];
        let passes = vec![Pass; 20];
        inspect(&mut store, id, "Jan 5 2020", &fails);
        inspect(&mut store, id, "Feb 2 2021", &passes);
    }
    assert!(store.count(INSPECTIONS) > 8_000);

    let rows = Catalog::new(&store).worst_restaurants(10).unwrap();
    assert_eq!(rows.len(), 10);
    assert!(rows.iter().all(|r| r.failed_inspection_count == 6));
    assert_eq!(rows[0].name, "R6");
}

// =============================================================================
// Rendering Scenarios
// =============================================================================

/// Raw documents of the worst-by-cuisine entry have only the projected keys.
#[test]
fn test_worst_by_cuisine_raw_shape() {
    let mut store = empty_store();
    add_restaurant(&mut store, Restaurant::new("C1", "Chinese"));

    let docs = Catalog::new(&store)
        .run(CatalogEntry::WorstByCuisine, &QueryParams::default())
        .unwrap();
    let mut keys: Vec<_> = docs[0].as_object().unwrap().keys().cloned().collect();
    keys.sort();
    assert_eq!(keys, vec!["type_of_food", "worstRestaurants"]);
    assert_eq!(docs[0]["type_of_food"], json!("Chinese"));
}

/// Every entry renders a command against the right collection.
#[test]
fn test_rendered_commands() {
    let params = QueryParams::default();
    for entry in CatalogEntry::ALL {
        let query = entry.query(&params);
        let command = query.to_command();
        let shell = query.to_shell();
        let collection = query.collection();

        match command.get("find") {
            Some(find) => {
                assert_eq!(find, &json!(collection));
                assert!(shell.starts_with(&format!("db.{}.find(", collection)));
            }
            None => {
                assert_eq!(command["aggregate"], json!(collection));
                assert!(shell.starts_with(&format!("db.{}.aggregate([", collection)));
            }
        }
    }

    assert_eq!(
        CatalogEntry::RestaurantsByCuisine.query(&params).to_shell(),
        r#"db.restaurants.find({"type_of_food":"Chinese"})"#
    );
}
