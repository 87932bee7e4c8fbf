//! Output rendering for validation reports.
//!
//! Supports `human` (default) and `json` outputs. The JSON form is the
//! serialized report: issues plus a top-level summary.

use crate::models::{Issue, Severity, ValidationReport};
use owo_colors::OwoColorize;
use serde_json::Value as JsonVal;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

/// Print a report in the requested format.
pub fn print_report(res: &ValidationReport, output: &str) {
    match output {
        "json" => match serde_json::to_string_pretty(&compose_report_json(res)) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("{} failed to serialize report: {}", error_prefix(), e),
        },
        _ => {
            let color = use_colors(output);
            for is in &res.issues {
                println!("{}", render_issue(is, color));
            }
            if res.issues.is_empty() {
                let ok = "✔ All files are valid";
                if color {
                    println!("{}", ok.green().bold());
                } else {
                    println!("{}", ok);
                }
            } else if !res.has_errors() {
                let ok = "✔ No errors found (warnings only)";
                if color {
                    println!("{}", ok.green().bold());
                } else {
                    println!("{}", ok);
                }
            }
            let summary = render_summary(res);
            if color {
                println!("{}", summary.bold());
            } else {
                println!("{}", summary);
            }
        }
    }
}

/// One human-readable line per issue: icon, severity, location, rule, message.
pub fn render_issue(is: &Issue, color: bool) -> String {
    let location = match is.line {
        Some(l) => format!("{}:{}", is.file, l),
        None => is.file.clone(),
    };
    let (icon, sev) = match is.severity {
        Severity::Error => ("✖", "⟦error⟧"),
        Severity::Warning => ("▲", "⟦warn⟧"),
    };
    if !color {
        return format!("{} {} {} ❲{}❳ — {}", icon, sev, location, is.rule, is.message);
    }
    let (icon, sev) = match is.severity {
        Severity::Error => (icon.red().to_string(), sev.red().bold().to_string()),
        Severity::Warning => (icon.yellow().to_string(), sev.yellow().bold().to_string()),
    };
    format!(
        "{} {} {} ❲{}❳ — {}",
        icon,
        sev,
        location.bold(),
        is.rule,
        is.message
    )
}

/// Footer line with totals and per-kind document counts.
pub fn render_summary(res: &ValidationReport) -> String {
    let s = &res.summary;
    let mut line = format!(
        "— Summary — errors={} warnings={} files={}",
        s.errors, s.warnings, s.files
    );
    if !s.per_type.is_empty() {
        let kinds: Vec<String> = s
            .per_type
            .iter()
            .map(|(k, n)| format!("{}={}", k, n))
            .collect();
        line.push_str(&format!(" ({})", kinds.join(" ")));
    }
    line
}

/// Compose report JSON object (pure) for testing/snapshot purposes.
pub fn compose_report_json(res: &ValidationReport) -> JsonVal {
    serde_json::to_value(res).unwrap_or(JsonVal::Null)
}

pub fn error_prefix() -> String {
    if use_colors("human") {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

pub fn note_prefix() -> String {
    if use_colors("human") {
        "note:".blue().bold().to_string()
    } else {
        "note:".to_string()
    }
}
