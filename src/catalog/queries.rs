//! Catalog query builders
//!
//! Each builder returns a `CatalogQuery`: a pure read specification that can
//! be evaluated in memory or rendered as a database command.
//!
//! Joins compare `toString(restaurant._id)` with `inspection.restaurant_id`,
//! since inspections store the restaurant identifier as a string.

use serde_json::{json, Value};

use crate::pipeline::{
    Accumulator, CollectionSource, ExecutionResult, Expr, Filter, Lookup, Pipeline, PipelineExecutor, Predicate,
    ProjectField, QueryResult, SortSpec,
};
use crate::model::InspectionResult;
use crate::schema::{INSPECTIONS, RESTAURANTS};

pub const DEFAULT_MIN_RATING: f64 = 4.0;
pub const DEFAULT_WORST_LIMIT: i64 = 10;
pub const DEFAULT_WORST_PER_CUISINE: i64 = 2;
pub const DEFAULT_MAX_CUISINES: i64 = 10;

/// A read against one collection
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogQuery {
    Find {
        collection: String,
        filter: Filter,
        sort: Vec<SortSpec>,
    },
    Aggregate {
        collection: String,
        pipeline: Pipeline,
    },
}

impl CatalogQuery {
    pub fn collection(&self) -> &str {
        match self {
            CatalogQuery::Find { collection, .. } | CatalogQuery::Aggregate { collection, .. } => collection,
        }
    }

    /// Evaluates the query in memory
    pub fn run<S: CollectionSource + ?Sized>(&self, source: &S) -> QueryResult<ExecutionResult> {
        let executor = PipelineExecutor::new(source);
        match self {
            CatalogQuery::Find {
                collection,
                filter,
                sort,
            } => executor.find(collection, filter, sort),
            CatalogQuery::Aggregate { collection, pipeline } => executor.aggregate(collection, pipeline),
        }
    }

    /// Database command document (`find` or `aggregate`)
    pub fn to_command(&self) -> Value {
        match self {
            CatalogQuery::Find {
                collection,
                filter,
                sort,
            } => {
                let mut command = json!({ "find": collection, "filter": filter.render() });
                if !sort.is_empty() {
                    command["sort"] = SortSpec::render(sort);
                }
                command
            }
            CatalogQuery::Aggregate { collection, pipeline } => json!({
                "aggregate": collection,
                "pipeline": pipeline.render(),
                "cursor": {},
            }),
        }
    }

    /// Shell form, e.g. `db.inspections.find({..}).sort({..})`
    pub fn to_shell(&self) -> String {
        match self {
            CatalogQuery::Find {
                collection,
                filter,
                sort,
            } => {
                let mut out = format!("db.{}.find({})", collection, filter.render());
                if !sort.is_empty() {
                    out.push_str(&format!(".sort({})", SortSpec::render(sort)));
                }
                out
            }
            CatalogQuery::Aggregate { collection, pipeline } => {
                format!("db.{}.aggregate({})", collection, pipeline.render())
            }
        }
    }
}

/// Integral values render without a fractional part
fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        Value::from(n as i64)
    } else {
        json!(n)
    }
}

/// Correlated lookup of a restaurant's inspections
fn inspections_of_restaurant(as_field: &str, extra: Option<Predicate>) -> Lookup {
    let mut filter = Filter::new().with_expr(Expr::eq(Expr::field("restaurant_id"), Expr::var("restaurantId")));
    if let Some(predicate) = extra {
        filter = filter.with(predicate);
    }

    Lookup::Correlated {
        from: INSPECTIONS.to_string(),
        let_vars: vec![("restaurantId".to_string(), Expr::string_of(Expr::field("_id")))],
        pipeline: Pipeline::new().match_on(filter),
        as_field: as_field.to_string(),
    }
}

/// Attaches failed inspections, counts them and sorts worst first
fn ranked_by_failures() -> Pipeline {
    let failed = InspectionResult::ALL
        .into_iter()
        .filter(InspectionResult::is_failure)
        .map(|r| json!(r.as_str()))
        .collect();
    Pipeline::new()
        .lookup(inspections_of_restaurant(
            "failed_inspections",
            Some(Predicate::in_list("result", failed)),
        ))
        .add_fields([("failed_inspection_count", Expr::size(Expr::field("failed_inspections")))])
        .sort(vec![SortSpec::desc("failed_inspection_count")])
}

/// Restaurants serving the given cuisine (exact, case-sensitive)
pub fn restaurants_by_cuisine(cuisine: &str) -> CatalogQuery {
    CatalogQuery::Find {
        collection: RESTAURANTS.to_string(),
        filter: Filter::new().with(Predicate::eq("type_of_food", json!(cuisine))),
        sort: Vec::new(),
    }
}

/// Inspections with a violation, sorted by `date`.
///
/// Dates are strings, so the order is lexicographic rather than
/// chronological: "Apr 1 2023" sorts before "Jan 5 2020".
pub fn violations_by_date() -> CatalogQuery {
    CatalogQuery::Find {
        collection: INSPECTIONS.to_string(),
        filter: Filter::new().with(Predicate::eq("result", json!("Violation Issued"))),
        sort: vec![SortSpec::asc("date")],
    }
}

/// Restaurants with `rating` strictly above the threshold
pub fn restaurants_rated_above(threshold: f64) -> CatalogQuery {
    CatalogQuery::Find {
        collection: RESTAURANTS.to_string(),
        filter: Filter::new().with(Predicate::gt("rating", number(threshold))),
        sort: Vec::new(),
    }
}

/// Mean rating per cuisine, highest first
pub fn average_rating_by_cuisine() -> CatalogQuery {
    CatalogQuery::Aggregate {
        collection: RESTAURANTS.to_string(),
        pipeline: Pipeline::new()
            .group(
                Expr::field("type_of_food"),
                [("avgRating", Accumulator::Avg(Expr::field("rating")))],
            )
            .sort(vec![SortSpec::desc("avgRating")]),
    }
}

/// Count and share of each inspection result, most frequent first
pub fn inspection_result_distribution() -> CatalogQuery {
    let share = Expr::multiply(vec![
        Expr::divide(Expr::field("results.count"), Expr::field("total")),
        Expr::lit(json!(100)),
    ]);

    CatalogQuery::Aggregate {
        collection: INSPECTIONS.to_string(),
        pipeline: Pipeline::new()
            .group(Expr::field("result"), [("count", Accumulator::Sum(Expr::lit(json!(1))))])
            .group(
                Expr::lit(Value::Null),
                [
                    ("total", Accumulator::Sum(Expr::field("count"))),
                    (
                        "results",
                        Accumulator::Push(Expr::object([
                            ("result", Expr::field("_id")),
                            ("count", Expr::field("count")),
                        ])),
                    ),
                ],
            )
            .unwind("results")
            .project([
                ("result", ProjectField::Computed(Expr::field("results.result"))),
                ("count", ProjectField::Computed(Expr::field("results.count"))),
                ("percentage", ProjectField::Computed(share)),
            ])
            .sort(vec![SortSpec::desc("count")]),
    }
}

/// Every restaurant with its inspections attached as `inspections`
pub fn restaurants_with_inspections() -> CatalogQuery {
    CatalogQuery::Aggregate {
        collection: RESTAURANTS.to_string(),
        pipeline: Pipeline::new().lookup(inspections_of_restaurant("inspections", None)),
    }
}

/// Restaurants none of whose inspections failed.
///
/// Inspections are attached as `inspection_history`; restaurants without
/// inspections qualify.
pub fn clean_record_restaurants() -> CatalogQuery {
    CatalogQuery::Aggregate {
        collection: RESTAURANTS.to_string(),
        pipeline: Pipeline::new()
            .lookup(inspections_of_restaurant("inspection_history", None))
            .match_on(Filter::new().with(Predicate::ne("inspection_history.result", json!("Fail")))),
    }
}

/// The `limit` restaurants with the most failed inspections
pub fn worst_restaurants(limit: i64) -> CatalogQuery {
    CatalogQuery::Aggregate {
        collection: RESTAURANTS.to_string(),
        pipeline: ranked_by_failures().limit(limit).project([
            ("name", ProjectField::Include),
            ("failed_inspection_count", ProjectField::Include),
            ("URL", ProjectField::Include),
            ("address", ProjectField::Include),
            ("type_of_food", ProjectField::Include),
        ]),
    }
}

/// Worst `per_cuisine` restaurants of each cuisine, for at most
/// `max_cuisines` cuisines.
///
/// Restaurants are ranked before grouping, so each list keeps the global
/// worst-first order. Cuisines appear in order of their worst restaurant.
pub fn worst_restaurants_by_cuisine(per_cuisine: i64, max_cuisines: i64) -> CatalogQuery {
    CatalogQuery::Aggregate {
        collection: RESTAURANTS.to_string(),
        pipeline: ranked_by_failures()
            .group(
                Expr::field("type_of_food"),
                [(
                    "worstRestaurants",
                    Accumulator::Push(Expr::object([
                        ("name", Expr::field("name")),
                        ("failed_inspection_count", Expr::field("failed_inspection_count")),
                        ("address", Expr::field("address")),
                        ("URL", Expr::field("URL")),
                    ])),
                )],
            )
            .add_fields([(
                "worstRestaurants",
                Expr::slice(Expr::field("worstRestaurants"), per_cuisine),
            )])
            .limit(max_cuisines)
            .project([
                ("_id", ProjectField::Exclude),
                ("type_of_food", ProjectField::Computed(Expr::field("_id"))),
                ("worstRestaurants", ProjectField::Include),
            ]),
    }
}
