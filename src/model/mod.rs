//! Typed documents for the `restaurants` and `inspections` collections

mod inspection;
mod restaurant;

pub use inspection::{Inspection, InspectionResult};
pub use restaurant::Restaurant;
