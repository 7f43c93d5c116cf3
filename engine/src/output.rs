//! Output formatting for reports and schemas.

use std::path::Path;

use typefiles_core::SchemaFragment;

use crate::report::ValidationReport;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Json,
    Yaml,
    Markdown,
    Table,
}

/// Formats a validation report in the requested output format.
pub fn format_report(report: &ValidationReport, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(report).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Markdown => Ok(report_to_markdown(report)),
        OutputFormat::Table => Ok(report_to_table(report)),
    }
}

/// Formats an effective schema. Markdown and table fall back to JSON.
pub fn format_schema(schema: &SchemaFragment, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Yaml => {
            serde_yaml::to_string(schema).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Json | OutputFormat::Markdown | OutputFormat::Table => {
            serde_json::to_string_pretty(schema)
                .map_err(|e| format!("JSON serialization failed: {e}"))
        }
    }
}

fn relative<'a>(path: &'a Path, root: &Path) -> std::borrow::Cow<'a, str> {
    match path.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".into(),
        Ok(rel) => rel.to_string_lossy(),
        Err(_) => path.to_string_lossy(),
    }
}

fn report_to_markdown(report: &ValidationReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("# Validation Report: {}\n\n", report.root.display()));
    out.push_str(&format!("- **Generated:** {}\n", report.generated_at));
    out.push_str(&format!(
        "- **Directories scanned:** {}\n",
        report.directories_scanned
    ));
    out.push_str(&format!("- **Errors:** {}\n", report.error_count()));
    out.push_str(&format!("- **Warnings:** {}\n", report.warning_count()));

    for dir in &report.directories {
        out.push_str(&format!("\n## `{}`\n\n", relative(&dir.location, &report.root)));
        out.push_str("| Severity | Message |\n");
        out.push_str("|----------|---------|\n");
        for finding in &dir.findings {
            out.push_str(&format!(
                "| {} | {} |\n",
                finding.severity,
                finding.message.replace('|', "\\|")
            ));
        }
    }

    out
}

fn report_to_table(report: &ValidationReport) -> String {
    let mut out = String::new();

    let width = report
        .findings()
        .map(|f| relative(&f.path, &report.root).len())
        .max()
        .unwrap_or(4);

    for finding in report.findings() {
        out.push_str(&format!(
            "{:<7} {:<width$}  {}\n",
            finding.severity.to_string(),
            relative(&finding.path, &report.root),
            finding.message,
            width = width
        ));
    }

    out.push_str(&format!(
        "{} directories scanned, {} errors, {} warnings\n",
        report.directories_scanned,
        report.error_count(),
        report.warning_count()
    ));
    out
}
