//! Argument parsing and terminal rendering for the `apilens` binary
//!
//! Kept in a library target so the pieces can be tested without spawning
//! the CLI.

use std::fmt::Write as FmtWrite;
use std::time::Duration;

use anyhow::{Result, anyhow};
use apilens_core::AnalysisReport;

pub const APP_NAME: &str = "apilens";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const DIVIDER: &str = "─────────────────────────────────────────────────────────────";
const LABEL_WIDTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Summary,
    Json,
}

#[derive(Debug, PartialEq, Eq)]
pub struct CliOptions {
    /// File path or http(s) URL of a spec or documentation page
    pub source: String,
    pub mode: OutputMode,
    pub timeout: Option<Duration>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CliCommand {
    Run(CliOptions),
    Help,
    Version,
}

pub fn parse_arguments(args: &[String]) -> Result<CliCommand> {
    if args.is_empty() {
        return Ok(CliCommand::Help);
    }

    let mut source: Option<String> = None;
    let mut mode = OutputMode::Summary;
    let mut timeout: Option<Duration> = None;
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        if matches!(arg.as_str(), "-h" | "--help") {
            return Ok(CliCommand::Help);
        }

        if matches!(arg.as_str(), "-v" | "--version") {
            return Ok(CliCommand::Version);
        }

        if matches!(arg.as_str(), "-j" | "--json") {
            mode = OutputMode::Json;
            i += 1;
            continue;
        }

        if let Some(value) = arg.strip_prefix("--timeout=") {
            timeout = Some(parse_timeout(value)?);
            i += 1;
            continue;
        }

        if matches!(arg.as_str(), "-t" | "--timeout") {
            let value = args
                .get(i + 1)
                .ok_or_else(|| anyhow!("{arg} requires a value in seconds"))?;
            timeout = Some(parse_timeout(value)?);
            i += 2;
            continue;
        }

        if arg.starts_with('-') {
            return Err(anyhow!("unknown flag: {arg}"));
        }

        if source.is_none() {
            source = Some(arg.clone());
        } else {
            return Err(anyhow!("unexpected additional argument: {}", arg));
        }

        i += 1;
    }

    let source = source.ok_or_else(|| anyhow!("missing <FILE|URL> argument"))?;

    Ok(CliCommand::Run(CliOptions {
        source,
        mode,
        timeout,
    }))
}

fn parse_timeout(value: &str) -> Result<Duration> {
    let secs: u64 = value
        .parse()
        .map_err(|_| anyhow!("invalid timeout '{value}': expected whole seconds"))?;
    if secs == 0 {
        return Err(anyhow!("timeout must be at least one second"));
    }
    Ok(Duration::from_secs(secs))
}

pub fn help_text() -> String {
    let mut buf = String::new();
    let _ = writeln!(buf, "{APP_NAME} — readiness grades for OpenAPI documents");
    let _ = writeln!(buf, "Usage: {APP_NAME} [OPTIONS] <FILE|URL>\n");
    let _ = writeln!(buf, "Accepts a local .json/.yaml spec, a direct spec URL, or a");
    let _ = writeln!(buf, "Redoc / Swagger UI documentation page that embeds one.\n");
    let _ = writeln!(buf, "Options:");
    let _ = writeln!(buf, "  -j, --json              Print the report as JSON");
    let _ = writeln!(buf, "  -t, --timeout <SECS>    HTTP timeout for remote sources");
    let _ = writeln!(buf, "  -v, --version           Show version information");
    let _ = writeln!(buf, "  -h, --help              Show this help message\n");
    let _ = writeln!(buf, "Set APILENS_LOG=debug for diagnostic logging.");
    buf
}

pub fn version_text() -> String {
    format!("{APP_NAME} {VERSION}")
}

/// Render the report as the sectioned terminal summary
pub fn render_report(report: &AnalysisReport) -> String {
    let mut output = String::new();

    push_section_header(
        &mut output,
        "📘",
        &format!("{} (v{})", report.title, report.version),
    );
    push_key_value(
        &mut output,
        "Readiness",
        &format!("{}/100 (grade {})", report.readiness_score, report.grade),
    );
    push_key_value(&mut output, "Endpoints", &report.endpoint_count.to_string());
    push_key_value(&mut output, "Operations", &report.methods.len().to_string());
    let _ = writeln!(&mut output);

    let insights = &report.insights;
    push_section_header(&mut output, "📊", "Coverage");
    push_key_value(&mut output, "Auth", &insights.auth_types.join(", "));
    push_key_value(&mut output, "Examples", &insights.example_coverage);
    push_key_value(&mut output, "Schemas", &insights.schema_coverage);
    push_key_value(&mut output, "Descriptions", &insights.description_coverage);
    push_key_value(
        &mut output,
        "Status Codes",
        &format!(
            "{} ({})",
            insights.status_code_count,
            insights.common_status_codes.join(", ")
        ),
    );
    let _ = writeln!(&mut output);

    render_breakdown(&mut output, report);
    render_undocumented(&mut output, &insights.undocumented_endpoints);
    render_method_table(&mut output, report);

    output
}

fn render_breakdown(buf: &mut String, report: &AnalysisReport) {
    let breakdown = &report.score_breakdown;
    push_section_header(buf, "🧮", "Score Breakdown");
    for (label, points, cap) in [
        ("Auth", breakdown.auth, 20),
        ("Examples", breakdown.example, 15),
        ("Schemas", breakdown.schema, 15),
        ("Status Codes", breakdown.status, 20),
        ("Descriptions", breakdown.description, 30),
    ] {
        push_key_value(buf, label, &format!("{points:.1} / {cap}"));
    }
    let _ = writeln!(buf);
}

fn render_undocumented(buf: &mut String, endpoints: &[String]) {
    push_section_header(buf, "📝", "Undocumented Endpoints");
    if endpoints.is_empty() {
        let _ = writeln!(buf, "✓ Every operation has a description.");
    } else {
        for endpoint in endpoints {
            let _ = writeln!(buf, "• {endpoint}");
        }
    }
    let _ = writeln!(buf);
}

fn render_method_table(buf: &mut String, report: &AnalysisReport) {
    if report.methods.is_empty() {
        return;
    }

    push_section_header(buf, "🧩", "Operations");

    let headers = ["Method", "Route", "Example", "Responses"];
    let rows: Vec<Vec<String>> = report
        .methods
        .iter()
        .map(|m| {
            vec![
                m.method.to_uppercase(),
                m.route.clone(),
                if m.has_example { "✓" } else { "–" }.to_string(),
                if m.response_codes.is_empty() {
                    "–".to_string()
                } else {
                    m.response_codes.join(", ")
                },
            ]
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let format_row = |cells: &[String]| -> String {
        let mut parts = Vec::with_capacity(cells.len());
        for (idx, cell) in cells.iter().enumerate() {
            parts.push(format!(" {:<width$} ", cell, width = widths[idx]));
        }
        format!("|{}|", parts.join("|"))
    };

    let header_cells = headers.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    let _ = writeln!(buf, "{}", format_row(&header_cells));

    let mut separator_parts = Vec::new();
    for width in &widths {
        separator_parts.push(format!(" {:-<width$} ", "", width = *width));
    }
    let _ = writeln!(buf, "|{}|", separator_parts.join("|"));

    for row in rows {
        let _ = writeln!(buf, "{}", format_row(&row));
    }

    let _ = writeln!(buf);
}

fn push_section_header(buf: &mut String, icon: &str, title: &str) {
    let _ = writeln!(buf, "{DIVIDER}");
    let _ = writeln!(buf, "{icon} {title}");
    let _ = writeln!(buf, "{DIVIDER}");
}

fn push_key_value(buf: &mut String, label: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    let _ = writeln!(buf, "• {:<width$} : {}", label, value, width = LABEL_WIDTH);
}
