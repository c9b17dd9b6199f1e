//! Spec URL discovery for documentation pages
//!
//! Documentation portals rarely link their spec file directly. Redoc pages
//! declare it in markup (`<redoc spec-url="...">`); Swagger UI pages pass it
//! to `SwaggerUIBundle({ url: "..." })` inside an inline script. Scripts are
//! pattern-matched, never executed, so URLs computed at runtime are missed.

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

static REDOC_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("redoc[spec-url], redocly-redoc[spec-url]").expect("invalid redoc selector")
});

static SCRIPT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script").expect("invalid script selector"));

/// `url:` followed by a quoted literal ending in a spec file extension
static SCRIPT_SPEC_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"url:\s*['"`]([^'"`]*\.(?:ya?ml|json))['"`]"#).expect("invalid spec url regex")
});

/// Which heuristic located the spec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoverySource {
    /// `spec-url` attribute of a Redoc element
    Redoc,
    /// `url:` literal inside an inline Swagger UI configuration script
    SwaggerUi,
}

/// A spec reference found in a documentation page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredSpec {
    /// Absolute URL of the spec file
    pub url: Url,

    /// Heuristic that produced the URL
    pub source: DiscoverySource,
}

/// Locate the spec file referenced by a documentation page.
///
/// Redoc markup wins over Swagger UI scripts. Relative references are
/// resolved against `base`, the URL the page was retrieved from. Returns
/// `None` when neither heuristic matches.
pub fn discover_spec_url(html: &str, base: &Url) -> Option<DiscoveredSpec> {
    let document = Html::parse_document(html);

    if let Some(spec) = find_redoc_spec(&document, base) {
        return Some(spec);
    }

    let found = find_swagger_ui_spec(&document, base);
    if found.is_none() {
        debug!("no spec reference found in page {base}");
    }
    found
}

fn find_redoc_spec(document: &Html, base: &Url) -> Option<DiscoveredSpec> {
    let element = document.select(&REDOC_SELECTOR).next()?;
    let raw = element.value().attr("spec-url")?.trim();
    if raw.is_empty() {
        return None;
    }

    resolve(raw, base).map(|url| DiscoveredSpec {
        url,
        source: DiscoverySource::Redoc,
    })
}

fn find_swagger_ui_spec(document: &Html, base: &Url) -> Option<DiscoveredSpec> {
    document.select(&SCRIPT_SELECTOR).find_map(|script| {
        let text = script.text().collect::<String>();
        let raw = SCRIPT_SPEC_URL.captures(&text)?.get(1)?.as_str();
        resolve(raw, base).map(|url| DiscoveredSpec {
            url,
            source: DiscoverySource::SwaggerUi,
        })
    })
}

fn resolve(raw: &str, base: &Url) -> Option<Url> {
    match base.join(raw) {
        Ok(url) => {
            debug!("resolved spec reference '{raw}' to {url}");
            Some(url)
        }
        Err(e) => {
            warn!("ignoring unresolvable spec reference '{raw}': {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    #[test]
    fn redoc_spec_url_is_resolved_against_base() {
        let html = r#"<html><body><redoc spec-url="/api/openapi.yaml"></redoc></body></html>"#;
        let found = discover_spec_url(html, &base("https://ex.com/docs/index.html")).unwrap();

        assert_eq!(found.url.as_str(), "https://ex.com/api/openapi.yaml");
        assert_eq!(found.source, DiscoverySource::Redoc);
    }

    #[test]
    fn redocly_element_is_recognised() {
        let html = r#"<redocly-redoc spec-url="https://cdn.ex.com/spec.json"></redocly-redoc>"#;
        let found = discover_spec_url(html, &base("https://ex.com/docs/")).unwrap();

        assert_eq!(found.url.as_str(), "https://cdn.ex.com/spec.json");
    }

    #[test]
    fn redoc_takes_priority_over_scripts() {
        let html = r#"
            <html>
                <head>
                    <script>SwaggerUIBundle({ url: "b.json", dom_id: '#ui' });</script>
                </head>
                <body><redoc spec-url="a.yaml"></redoc></body>
            </html>
        "#;
        let found = discover_spec_url(html, &base("https://ex.com/docs/")).unwrap();

        assert_eq!(found.url.as_str(), "https://ex.com/docs/a.yaml");
        assert_eq!(found.source, DiscoverySource::Redoc);
    }

    #[test]
    fn swagger_ui_script_fallback() {
        let html = r#"
            <script>
                window.onload = function() {
                    window.ui = SwaggerUIBundle({ url: 'openapi.json', dom_id: '#swagger-ui' });
                };
            </script>
        "#;
        let found = discover_spec_url(html, &base("https://ex.com/docs/")).unwrap();

        assert_eq!(found.url.as_str(), "https://ex.com/docs/openapi.json");
        assert_eq!(found.source, DiscoverySource::SwaggerUi);
    }

    #[test]
    fn first_matching_script_wins() {
        let html = r#"
            <script>var analytics = { id: 42 };</script>
            <script>const cfg = { url: `/specs/v1.yml` };</script>
            <script>const other = { url: "/specs/v2.json" };</script>
        "#;
        let found = discover_spec_url(html, &base("https://ex.com/docs/")).unwrap();

        assert_eq!(found.url.as_str(), "https://ex.com/specs/v1.yml");
    }

    #[test]
    fn empty_redoc_attribute_falls_through_to_scripts() {
        let html = r#"
            <redoc spec-url="  "></redoc>
            <script>SwaggerUIBundle({ url: "spec.yaml" })</script>
        "#;
        let found = discover_spec_url(html, &base("https://ex.com/")).unwrap();

        assert_eq!(found.url.as_str(), "https://ex.com/spec.yaml");
        assert_eq!(found.source, DiscoverySource::SwaggerUi);
    }

    #[test]
    fn redoc_without_attribute_is_skipped() {
        let html = r#"<redoc></redoc><redoc spec-url="second.json"></redoc>"#;
        let found = discover_spec_url(html, &base("https://ex.com/")).unwrap();

        assert_eq!(found.url.as_str(), "https://ex.com/second.json");
    }

    #[test]
    fn non_spec_urls_in_scripts_are_ignored() {
        let html = r#"
            <script>fetch({ url: "/api/users" });</script>
            <script>const spec = { url: buildSpecUrl() };</script>
        "#;
        assert!(discover_spec_url(html, &base("https://ex.com/")).is_none());
    }

    #[test]
    fn page_without_references_is_not_found() {
        let html = "<html><body><h1>API docs</h1><p>Coming soon</p></body></html>";
        assert!(discover_spec_url(html, &base("https://ex.com/docs/")).is_none());
    }

    #[test]
    fn absolute_script_url_is_unchanged() {
        let html = r#"<script>ui({ url: "https://petstore3.swagger.io/api/v3/openapi.json" })</script>"#;
        let found = discover_spec_url(html, &base("https://ex.com/docs/")).unwrap();

        assert_eq!(
            found.url.as_str(),
            "https://petstore3.swagger.io/api/v3/openapi.json"
        );
    }
}
