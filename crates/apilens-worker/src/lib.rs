//! Cloudflare Worker for apilens
//!
//! Serves the upload page and two analysis endpoints on top of apilens-core:
//! `POST /api/upload` takes a multipart spec file, `POST /api/upload-url`
//! takes `{"url": ...}` pointing at a spec or a documentation page.

use apilens_core::{
    AnalysisError, AnalysisReport, ContentKind, analyze, discover_spec_url, source, url_utils,
    validator,
};
use std::net::{Ipv4Addr, Ipv6Addr};

use serde::Deserialize;
use url::{Host, Url};
use worker::*;

/// Multipart field carrying the uploaded spec
const UPLOAD_FIELD: &str = "apiSpec";

const USER_AGENT: &str = concat!("apilens/", env!("CARGO_PKG_VERSION"), " (Cloudflare Worker)");

// Frontend HTML will be included as a separate file
const FRONTEND_HTML: &str = include_str!("frontend.html");

#[derive(Debug, Deserialize)]
struct UrlRequest {
    url: Option<String>,
}

/// A failed request: HTTP status plus the message sent as `{"error": ...}`
#[derive(Debug, PartialEq, Eq)]
struct ApiError {
    status: u16,
    message: String,
}

impl ApiError {
    fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn upstream(message: impl Into<String>) -> Self {
        Self::new(502, message)
    }
}

impl From<AnalysisError> for ApiError {
    fn from(error: AnalysisError) -> Self {
        Self::new(error_status(&error), error.to_string())
    }
}

/// HTTP status for an analysis failure
fn error_status(error: &AnalysisError) -> u16 {
    match error {
        AnalysisError::ValidationFailure(_) => 422,
        AnalysisError::SpecNotFound { .. }
        | AnalysisError::UnsupportedFormat(_)
        | AnalysisError::InvalidUrl(_)
        | AnalysisError::EmptyDocument
        | AnalysisError::InvalidDocumentShape(_) => 400,
    }
}

/// Analyze an uploaded file held in memory
fn analyze_upload(
    bytes: &[u8],
    file_name: &str,
) -> std::result::Result<AnalysisReport, AnalysisError> {
    let document = validator::validate_bytes(bytes, file_name)?;
    analyze(&document)
}

/// Parse a user-supplied target, refusing hosts inside the worker's network
fn parse_target_url(input: &str) -> std::result::Result<Url, ApiError> {
    let url = url_utils::parse_http_url(input)?;
    if is_blocked_host(&url) {
        return Err(ApiError::new(400, format!("Refusing to fetch private address {url}")));
    }
    Ok(url)
}

fn is_blocked_host(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => {
            let domain = domain.to_ascii_lowercase();
            domain == "localhost" || domain.ends_with(".localhost")
        }
        Some(Host::Ipv4(addr)) => is_internal_ipv4(addr),
        Some(Host::Ipv6(addr)) => is_internal_ipv6(addr),
        None => true,
    }
}

fn is_internal_ipv4(addr: Ipv4Addr) -> bool {
    addr.is_loopback()
        || addr.is_private()
        || addr.is_link_local()
        || addr.is_unspecified()
        || addr.is_broadcast()
}

fn is_internal_ipv6(addr: Ipv6Addr) -> bool {
    if let Some(mapped) = addr.to_ipv4_mapped() {
        return is_internal_ipv4(mapped);
    }
    let first = addr.segments()[0];
    addr.is_loopback()
        || addr.is_unspecified()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (first & 0xffc0) == 0xfe80
}

struct FetchedBody {
    body: String,
    content_type: Option<String>,
}

async fn fetch_text(url: &Url) -> std::result::Result<FetchedBody, ApiError> {
    let mut request = Request::new(url.as_str(), Method::Get)
        .map_err(|e| ApiError::upstream(format!("Failed to build request: {e}")))?;
    request
        .headers_mut()
        .and_then(|headers| headers.set("User-Agent", USER_AGENT))
        .map_err(|e| ApiError::upstream(format!("Failed to build request: {e}")))?;

    let mut response = Fetch::Request(request)
        .send()
        .await
        .map_err(|e| ApiError::upstream(format!("Failed to fetch {url}: {e}")))?;

    let status = response.status_code();
    if !(200..300).contains(&status) {
        return Err(ApiError::upstream(format!("Fetching {url} returned HTTP {status}")));
    }

    let content_type = response.headers().get("content-type").ok().flatten();
    let body = response
        .text()
        .await
        .map_err(|e| ApiError::upstream(format!("Failed to read body from {url}: {e}")))?;

    console_log!("[Worker] Fetched {} bytes from {}", body.len(), url);
    Ok(FetchedBody { body, content_type })
}

/// Fetch a spec or a documentation page and analyze what it points to
async fn analyze_remote(target: &str) -> std::result::Result<AnalysisReport, ApiError> {
    let url = parse_target_url(target)?;
    let fetched = fetch_text(&url).await?;
    let kind = source::classify_or_reject(fetched.content_type.as_deref(), &url)?;

    let document = match kind.spec_format() {
        Some(format) => validator::validate_str(&fetched.body, format)?,
        None => {
            debug_assert_eq!(kind, ContentKind::Html);
            let discovered = discover_spec_url(&fetched.body, &url).ok_or_else(|| {
                AnalysisError::SpecNotFound {
                    page: url.to_string(),
                }
            })?;
            console_log!("[Worker] Spec discovered via {:?}: {}", discovered.source, discovered.url);

            let format = source::linked_spec_format(&discovered.url)?;
            let spec_url = parse_target_url(discovered.url.as_str())?;
            let spec = fetch_text(&spec_url).await?;
            validator::validate_str(&spec.body, format)?
        }
    };

    Ok(analyze(&document)?)
}

async fn handle_upload(req: &mut Request) -> std::result::Result<AnalysisReport, ApiError> {
    let form = req
        .form_data()
        .await
        .map_err(|_| ApiError::new(400, "No file uploaded."))?;

    match form.get(UPLOAD_FIELD) {
        Some(FormEntry::File(file)) => {
            let name = file.name();
            let bytes = file
                .bytes()
                .await
                .map_err(|e| ApiError::new(400, format!("Failed to read upload: {e}")))?;
            console_log!("[Worker] Upload '{}' ({} bytes)", name, bytes.len());
            Ok(analyze_upload(&bytes, &name)?)
        }
        _ => Err(ApiError::new(400, "No file uploaded.")),
    }
}

async fn handle_upload_url(req: &mut Request) -> std::result::Result<AnalysisReport, ApiError> {
    let body: UrlRequest = req
        .json()
        .await
        .map_err(|_| ApiError::new(400, "Missing URL in request body"))?;

    let target = body
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::new(400, "Missing URL in request body"))?;

    console_log!("[Worker] Processing URL: {}", target);
    analyze_remote(&target).await
}

fn json_response(
    result: std::result::Result<AnalysisReport, ApiError>,
    headers: Headers,
) -> Result<Response> {
    headers.set("Content-Type", "application/json")?;
    match result {
        Ok(report) => Response::from_json(&report).map(|r| r.with_headers(headers)),
        Err(error) => {
            console_log!("[Worker] {} {}", error.status, error.message);
            Response::from_json(&serde_json::json!({ "error": error.message }))
                .map(|r| r.with_headers(headers).with_status(error.status))
        }
    }
}

#[event(fetch)]
async fn main(mut req: Request, _env: Env, _ctx: Context) -> Result<Response> {
    console_error_panic_hook::set_once();

    let url = req.url()?;
    console_log!("[Worker] {} {}", req.method(), url.path());

    // CORS headers
    let headers = Headers::new();
    headers.set("Access-Control-Allow-Origin", "*")?;
    headers.set("Access-Control-Allow-Methods", "GET, POST, OPTIONS")?;
    headers.set("Access-Control-Allow-Headers", "Content-Type")?;

    // Handle CORS preflight
    if req.method() == Method::Options {
        return Response::empty().map(|r| r.with_headers(headers));
    }

    match (req.method(), url.path()) {
        (Method::Post, "/api/upload") => {
            let result = handle_upload(&mut req).await;
            json_response(result, headers)
        }
        (Method::Post, "/api/upload-url") => {
            let result = handle_upload_url(&mut req).await;
            json_response(result, headers)
        }
        (Method::Get, "/health") => {
            headers.set("Content-Type", "application/json")?;
            let health = serde_json::json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION")
            });
            Response::ok(health.to_string()).map(|r| r.with_headers(headers))
        }
        (Method::Get, "/") => {
            headers.set("Content-Type", "text/html;charset=UTF-8")?;
            Response::ok(FRONTEND_HTML).map(|r| r.with_headers(headers))
        }
        _ => Response::error("Not Found", 404),
    }
}
