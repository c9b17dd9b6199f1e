//! # apilens-core
//!
//! Core library for grading how ready an OpenAPI document is for consumers.
//!
//! This library provides:
//! - Loading JSON/YAML specs and resolving internal `$ref`s
//! - A readiness engine that scores auth, examples, schemas, status codes
//!   and descriptions into a 0-100 score and a letter grade
//! - Discovery of the spec file behind Redoc and Swagger UI pages
//!
//! ## Features
//!
//! - `default`: Parsing, validation, analysis and discovery (WASM-compatible)
//! - `fetch`: Fetch specs and documentation pages over HTTP
//!
//! ## Example
//!
//! ```no_run
//! use apilens_core::{analyze, validator};
//!
//! # fn example() -> anyhow::Result<()> {
//! let yaml = br#"
//! openapi: 3.0.0
//! info: { title: Ping, version: 1.0.0 }
//! paths:
//!   /ping:
//!     get:
//!       responses:
//!         "200": { description: pong }
//! "#;
//!
//! let document = validator::validate_bytes(yaml, "ping.yaml")?;
//! let report = analyze(&document)?;
//! println!("{} ({})", report.readiness_score, report.grade);
//! # Ok(())
//! # }
//! ```

pub mod discover;
pub mod error;
pub mod loader;
pub mod model;
pub mod readiness;
pub mod source;
pub mod url_utils;
pub mod validator;

// Re-export commonly used types
pub use discover::{DiscoveredSpec, DiscoverySource, discover_spec_url};
pub use error::AnalysisError;
pub use loader::SpecFormat;
pub use model::OpenApiDocument;
pub use readiness::{AnalysisReport, Grade, Insights, MethodSummary, ScoreBreakdown, analyze};
pub use source::ContentKind;

#[cfg(feature = "fetch")]
pub use source::{FetchConfig, analyze_path, analyze_source, analyze_url};
