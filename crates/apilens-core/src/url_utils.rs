use url::Url;

use crate::error::AnalysisError;

/// Parse an absolute http(s) URL supplied by a user.
pub fn parse_http_url(input: &str) -> Result<Url, AnalysisError> {
    let parsed =
        Url::parse(input.trim()).map_err(|_| AnalysisError::InvalidUrl(input.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(AnalysisError::InvalidUrl(input.to_string())),
    }
}

/// Last path segment of a URL, ignoring query string and fragment.
///
/// Used as the file-name hint for format detection, so that
/// `https://ex.com/openapi.yaml?raw=1` still reads as YAML.
pub fn file_name(url: &Url) -> &str {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("")
}
