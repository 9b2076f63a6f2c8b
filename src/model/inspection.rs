//! Inspection documents

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::store::ObjectId;

/// Outcome of an inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InspectionResult {
    Pass,
    Fail,
    #[serde(rename = "Violation Issued")]
    ViolationIssued,
}

impl InspectionResult {
    pub const ALL: [InspectionResult; 3] = [
        InspectionResult::Pass,
        InspectionResult::Fail,
        InspectionResult::ViolationIssued,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            InspectionResult::Pass => "Pass",
            InspectionResult::Fail => "Fail",
            InspectionResult::ViolationIssued => "Violation Issued",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == s)
    }

    /// Counted by the worst-restaurant reports
    pub fn is_failure(&self) -> bool {
        matches!(self, InspectionResult::Fail | InspectionResult::ViolationIssued)
    }
}

impl fmt::Display for InspectionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document in `inspections`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Hex string of the restaurant's `_id`
    pub restaurant_id: String,
    /// `Mon D YYYY`; sorts as a string
    pub date: String,
    pub result: InspectionResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_number: Option<i32>,
}

impl Inspection {
    pub fn new(restaurant_id: impl Into<String>, date: impl Into<String>, result: InspectionResult) -> Self {
        Self {
            id: None,
            restaurant_id: restaurant_id.into(),
            date: date.into(),
            result,
            certificate_number: None,
        }
    }

    /// Inspection referencing a stored restaurant
    pub fn of(restaurant: &ObjectId, date: impl Into<String>, result: InspectionResult) -> Self {
        Self::new(restaurant.to_hex(), date, result)
    }

    pub fn with_certificate(mut self, number: i32) -> Self {
        self.certificate_number = Some(number);
        self
    }
}
