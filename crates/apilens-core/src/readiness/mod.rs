//! Readiness analysis
//!
//! Walks a resolved OpenAPI document, derives one [`MethodFact`] per
//! (route, method) pair, aggregates coverage metrics and folds them into a
//! score and grade through the [`scoring`] model.

pub mod scoring;

use indexmap::IndexSet;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::model::OpenApiDocument;

pub use scoring::{Grade, ScoreBreakdown, ScoreInputs};

/// Reported in `authTypes` when the document declares no security scheme
pub const NO_AUTH_SENTINEL: &str = "None";

/// Readiness report for a single OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// API title from `info.title`
    pub title: String,

    /// API version from `info.version`
    pub version: String,

    /// Number of routes declared under `paths`
    pub endpoint_count: usize,

    /// One entry per operation, in document order
    pub methods: Vec<MethodSummary>,

    /// Aggregate coverage figures
    pub insights: Insights,

    /// Overall readiness score (0-100)
    pub readiness_score: u8,

    /// Letter grade for the score
    pub grade: Grade,

    /// Per-dimension contributions that sum to the score before rounding
    pub score_breakdown: ScoreBreakdown,
}

/// Projection of a [`MethodFact`] exposed in the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodSummary {
    pub route: String,
    pub method: String,
    pub has_example: bool,
    pub response_codes: Vec<String>,
}

/// Coverage block of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    /// Security scheme names, or `["None"]`
    pub auth_types: Vec<String>,

    /// Share of operations with a response example, e.g. `"66.7%"`
    pub example_coverage: String,

    /// Share of operations with a response schema
    pub schema_coverage: String,

    /// Number of distinct status codes across all operations
    pub status_code_count: usize,

    /// The distinct status codes, in first-seen order
    pub common_status_codes: Vec<String>,

    /// Share of operations with a non-blank description
    pub description_coverage: String,

    /// `"METHOD /route"` for every operation without a description
    pub undocumented_endpoints: Vec<String>,
}

/// Facts derived for one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodFact {
    pub route: String,
    pub method: String,
    pub response_codes: Vec<String>,
    pub has_example: bool,
    pub has_schema: bool,
    pub has_description: bool,
}

impl MethodFact {
    /// `"GET /pets"` style label
    pub fn label(&self) -> String {
        format!("{} {}", self.method.to_uppercase(), self.route)
    }

    fn summary(&self) -> MethodSummary {
        MethodSummary {
            route: self.route.clone(),
            method: self.method.clone(),
            has_example: self.has_example,
            response_codes: self.response_codes.clone(),
        }
    }
}

/// Flatten `paths` into one fact per operation, keeping document order
pub fn collect_method_facts(document: &OpenApiDocument) -> Vec<MethodFact> {
    document
        .paths
        .iter()
        .flat_map(|(route, item)| {
            item.operations.iter().map(move |(method, operation)| MethodFact {
                route: route.clone(),
                method: method.clone(),
                response_codes: operation.responses.keys().cloned().collect(),
                has_example: operation.has_example(),
                has_schema: operation.has_schema(),
                has_description: operation.has_description(),
            })
        })
        .collect()
}

/// Analyze a resolved document and build its readiness report.
///
/// Fails with [`AnalysisError::InvalidDocumentShape`] when `info.title` or
/// `info.version` is missing, and with [`AnalysisError::EmptyDocument`] when
/// there are no operations to compute coverage over.
pub fn analyze(document: &OpenApiDocument) -> Result<AnalysisReport> {
    let title = document
        .info
        .title
        .clone()
        .ok_or_else(|| AnalysisError::InvalidDocumentShape("info.title is missing".to_string()))?;
    let version = document
        .info
        .version
        .clone()
        .ok_or_else(|| {
            AnalysisError::InvalidDocumentShape("info.version is missing".to_string())
        })?;

    let facts = collect_method_facts(document);
    if facts.is_empty() {
        return Err(AnalysisError::EmptyDocument);
    }

    let total = facts.len();
    let example_count = facts.iter().filter(|f| f.has_example).count();
    let schema_count = facts.iter().filter(|f| f.has_schema).count();
    let described_count = facts.iter().filter(|f| f.has_description).count();

    let status_codes: IndexSet<&str> = facts
        .iter()
        .flat_map(|f| f.response_codes.iter().map(String::as_str))
        .collect();

    let security_schemes = document.security_scheme_names();

    let inputs = ScoreInputs {
        has_auth: !security_schemes.is_empty(),
        example_coverage: fraction(example_count, total),
        schema_coverage: fraction(schema_count, total),
        distinct_status_count: status_codes.len(),
        description_coverage: fraction(described_count, total),
    };
    let score_breakdown = ScoreBreakdown::from_inputs(&inputs);
    let readiness_score = score_breakdown.total();
    let grade = Grade::from_score(readiness_score);

    debug!(
        "analyzed '{title}' {version}: {total} operations, {} status codes, score {readiness_score} ({grade})",
        status_codes.len()
    );

    let undocumented_endpoints = facts
        .iter()
        .filter(|f| !f.has_description)
        .map(MethodFact::label)
        .collect();

    let auth_types = if security_schemes.is_empty() {
        vec![NO_AUTH_SENTINEL.to_string()]
    } else {
        security_schemes
    };

    Ok(AnalysisReport {
        title,
        version,
        endpoint_count: document.paths.len(),
        methods: facts.iter().map(MethodFact::summary).collect(),
        insights: Insights {
            auth_types,
            example_coverage: format_percentage(example_count, total),
            schema_coverage: format_percentage(schema_count, total),
            status_code_count: status_codes.len(),
            common_status_codes: status_codes.iter().map(|c| c.to_string()).collect(),
            description_coverage: format_percentage(described_count, total),
            undocumented_endpoints,
        },
        readiness_score,
        grade,
        score_breakdown,
    })
}

fn fraction(count: usize, total: usize) -> f64 {
    count as f64 / total as f64
}

/// Percentage with one decimal, e.g. `"66.7%"`
fn format_percentage(count: usize, total: usize) -> String {
    format!("{:.1}%", count as f64 * 100.0 / total as f64)
}
