//! Weighted scoring model
//!
//! Folds the coverage metrics of one document into a 0-100 readiness score
//! and a letter grade. Weights and grade thresholds are fixed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Flat points for declaring any security scheme
pub const AUTH_WEIGHT: f64 = 20.0;
/// Maximum points for response example coverage
pub const EXAMPLE_WEIGHT: f64 = 15.0;
/// Maximum points for response schema coverage
pub const SCHEMA_WEIGHT: f64 = 15.0;
/// Maximum points for status code diversity
pub const STATUS_WEIGHT: f64 = 20.0;
/// Maximum points for operation description coverage
pub const DESCRIPTION_WEIGHT: f64 = 30.0;
/// Number of distinct status codes that earns the full status weight
pub const STATUS_CODE_CAP: usize = 5;

const GRADE_THRESHOLDS: [(u8, Grade); 4] = [
    (90, Grade::A),
    (80, Grade::B),
    (70, Grade::C),
    (60, Grade::D),
];

/// Metrics the score is computed from. Coverages are fractions in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    pub has_auth: bool,
    pub example_coverage: f64,
    pub schema_coverage: f64,
    pub distinct_status_count: usize,
    pub description_coverage: f64,
}

/// Unrounded contribution of each scoring dimension
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub auth: f64,
    pub example: f64,
    pub schema: f64,
    pub status: f64,
    pub description: f64,
}

/// Letter grade derived from the readiness score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl ScoreBreakdown {
    pub fn from_inputs(inputs: &ScoreInputs) -> Self {
        let status_fraction =
            inputs.distinct_status_count.min(STATUS_CODE_CAP) as f64 / STATUS_CODE_CAP as f64;

        Self {
            auth: if inputs.has_auth { AUTH_WEIGHT } else { 0.0 },
            example: clamp_fraction(inputs.example_coverage) * EXAMPLE_WEIGHT,
            schema: clamp_fraction(inputs.schema_coverage) * SCHEMA_WEIGHT,
            status: status_fraction * STATUS_WEIGHT,
            description: clamp_fraction(inputs.description_coverage) * DESCRIPTION_WEIGHT,
        }
    }

    /// Sum of all contributions before rounding
    pub fn sum(&self) -> f64 {
        self.auth + self.example + self.schema + self.status + self.description
    }

    /// Readiness score: the sum rounded once, half away from zero
    pub fn total(&self) -> u8 {
        self.sum().round().clamp(0.0, 100.0) as u8
    }
}

fn clamp_fraction(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

impl Grade {
    pub fn from_score(score: u8) -> Self {
        GRADE_THRESHOLDS
            .iter()
            .find(|(floor, _)| score >= *floor)
            .map(|(_, grade)| *grade)
            .unwrap_or(Grade::F)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
