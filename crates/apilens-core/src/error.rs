//! Error taxonomy shared by the loader, validator, engine and transports

use thiserror::Error;

/// Terminal conditions raised while turning an input into a readiness report.
///
/// Every variant carries enough context for a transport to render a
/// user-facing message. None of them are retried.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The document failed parsing, reference resolution or schema validation.
    #[error("validation failed: {0}")]
    ValidationFailure(String),

    /// A field the engine requires (such as `info.title`) is absent.
    #[error("invalid document shape: {0}")]
    InvalidDocumentShape(String),

    /// The document declares no operations, so coverage is undefined.
    #[error("the document declares no operations; nothing to score")]
    EmptyDocument,

    /// An HTML page was fetched but carries no discoverable spec reference.
    #[error(
        "No OpenAPI spec found in {page}. This documentation page does not embed a spec file. \
         Please try providing a direct link to a .yaml or .json spec instead."
    )]
    SpecNotFound { page: String },

    /// The payload is neither JSON nor YAML (nor an HTML page to search).
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The supplied location is not an absolute http(s) URL.
    #[error("invalid URL '{0}': only absolute http and https URLs are supported")]
    InvalidUrl(String),
}

/// Convenience result type for apilens core.
pub type Result<T> = std::result::Result<T, AnalysisError>;
