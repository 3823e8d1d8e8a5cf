//! Rendering of audit reports and format checks.

use std::collections::BTreeMap;

use anyhow::Result;
use apigateway_log_audit_core::{AuditReport, FormatVerifier, Severity};
use serde::Serialize;

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Text,
}

/// JSON goes to stdout as a whole. Text prints one log group per line on
/// stdout and the diagnostics on stderr.
pub fn print_report(report: &AuditReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => {
            for name in &report.log_group_names {
                println!("{name}");
            }
            for diagnostic in &report.diagnostics {
                let label = match diagnostic.severity {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                };
                eprintln!("{label}: {}", diagnostic.message);
            }
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct FormatCheckOutput<'a> {
    repaired: &'a str,
    fields: &'a BTreeMap<String, serde_json::Value>,
    missing: &'a [String],
}

/// Print the repaired and flattened format; returns whether it passed.
pub fn print_format_check(verifier: &FormatVerifier, format: &str) -> Result<bool> {
    let analysis = match verifier.analyze(format) {
        Ok(analysis) => analysis,
        Err(err) => {
            eprintln!("{err}");
            return Ok(false);
        }
    };

    let output = FormatCheckOutput {
        repaired: &analysis.repaired,
        fields: &analysis.fields,
        missing: &analysis.missing,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    if analysis.missing.is_empty() {
        Ok(true)
    } else {
        eprintln!(
            "Access Log Format is missing required values [{}]",
            analysis.missing.join(", ")
        );
        Ok(false)
    }
}
