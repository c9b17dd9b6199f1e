//! Remote and local spec sources
//!
//! Classifies fetched payloads and, with the `fetch` feature, retrieves spec
//! files and documentation pages over HTTP before handing them to the
//! validator and the readiness engine.

#[cfg(feature = "fetch")]
use anyhow::{Context, Result};
#[cfg(feature = "fetch")]
use log::{debug, info};
#[cfg(feature = "fetch")]
use std::path::Path;
#[cfg(feature = "fetch")]
use std::time::Duration;
use url::Url;

use crate::error::AnalysisError;
use crate::loader::SpecFormat;
use crate::url_utils;
#[cfg(feature = "fetch")]
use crate::{discover, readiness, validator};

/// HTTP request timeout for fetching specs and documentation pages
#[cfg(feature = "fetch")]
pub const FETCH_TIMEOUT_SECS: u64 = 15;

/// Kind of payload a URL returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    Yaml,
    Html,
}

impl ContentKind {
    /// Classify a response by its `Content-Type` header and URL extension.
    ///
    /// JSON is checked first, then YAML, then HTML. Returns `None` when the
    /// payload is none of them.
    pub fn classify(content_type: Option<&str>, url: &Url) -> Option<Self> {
        let content_type = content_type.unwrap_or_default().to_ascii_lowercase();
        let extension = SpecFormat::from_extension(url_utils::file_name(url));

        if content_type.contains("application/json") || extension == Some(SpecFormat::Json) {
            Some(Self::Json)
        } else if ["application/yaml", "application/x-yaml", "text/yaml", "text/x-yaml"]
            .iter()
            .any(|t| content_type.contains(t))
            || extension == Some(SpecFormat::Yaml)
        {
            Some(Self::Yaml)
        } else if content_type.contains("text/html") {
            Some(Self::Html)
        } else {
            None
        }
    }

    /// Spec format for JSON and YAML payloads; `None` for HTML pages
    pub fn spec_format(self) -> Option<SpecFormat> {
        match self {
            Self::Json => Some(SpecFormat::Json),
            Self::Yaml => Some(SpecFormat::Yaml),
            Self::Html => None,
        }
    }
}

/// Classify a payload or fail with [`AnalysisError::UnsupportedFormat`]
pub fn classify_or_reject(content_type: Option<&str>, url: &Url) -> Result<ContentKind, AnalysisError> {
    ContentKind::classify(content_type, url).ok_or_else(|| {
        AnalysisError::UnsupportedFormat(format!(
            "Unsupported content type or file format ({}) at {url}",
            content_type.unwrap_or("no content type")
        ))
    })
}

/// Format of a spec file linked from a documentation page, by extension only
pub fn linked_spec_format(url: &Url) -> Result<SpecFormat, AnalysisError> {
    SpecFormat::from_extension(url_utils::file_name(url)).ok_or_else(|| {
        AnalysisError::UnsupportedFormat(format!("Unsupported linked spec format: {url}"))
    })
}

/// Settings for remote fetching
#[cfg(feature = "fetch")]
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

#[cfg(feature = "fetch")]
impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(FETCH_TIMEOUT_SECS),
            user_agent: format!("apilens/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[cfg(feature = "fetch")]
struct Fetched {
    body: String,
    content_type: Option<String>,
}

/// Analyze a local file path or an http(s) URL
#[cfg(feature = "fetch")]
pub async fn analyze_source(input: &str, config: &FetchConfig) -> Result<readiness::AnalysisReport> {
    if input.starts_with("http://") || input.starts_with("https://") {
        analyze_url(input, config).await
    } else {
        analyze_path(Path::new(input)).await
    }
}

/// Analyze a spec file on disk
#[cfg(feature = "fetch")]
pub async fn analyze_path(path: &Path) -> Result<readiness::AnalysisReport> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let hint = path.to_string_lossy();
    let document = validator::validate_bytes(&bytes, &hint)?;
    Ok(readiness::analyze(&document)?)
}

/// Fetch a spec (or a documentation page embedding one) and analyze it
#[cfg(feature = "fetch")]
pub async fn analyze_url(url: &str, config: &FetchConfig) -> Result<readiness::AnalysisReport> {
    let url = url_utils::parse_http_url(url)?;
    let client = build_client(config)?;

    let fetched = fetch(&client, &url).await?;
    let kind = classify_or_reject(fetched.content_type.as_deref(), &url)?;
    debug!("{url} classified as {kind:?}");

    let document = match kind.spec_format() {
        Some(format) => validator::validate_str(&fetched.body, format)?,
        None => {
            let discovered = discover::discover_spec_url(&fetched.body, &url).ok_or_else(|| {
                AnalysisError::SpecNotFound {
                    page: url.to_string(),
                }
            })?;
            info!(
                "found spec {} in {url} via {:?}",
                discovered.url, discovered.source
            );

            let format = linked_spec_format(&discovered.url)?;
            let spec = fetch(&client, &discovered.url).await?;
            validator::validate_str(&spec.body, format)?
        }
    };

    Ok(readiness::analyze(&document)?)
}

#[cfg(feature = "fetch")]
fn build_client(config: &FetchConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .user_agent(config.user_agent.as_str())
        .build()
        .context("failed to build HTTP client")
}

#[cfg(feature = "fetch")]
async fn fetch(client: &reqwest::Client, url: &Url) -> Result<Fetched> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("failed to fetch {url}"))?;

    let response = response
        .error_for_status()
        .with_context(|| format!("non-success status from {url}"))?;

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let body = response
        .text()
        .await
        .with_context(|| format!("failed to read response body from {url}"))?;

    debug!("fetched {} bytes from {url}", body.len());
    Ok(Fetched { body, content_type })
}
