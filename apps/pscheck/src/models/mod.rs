//! Shared data models: documents, reference edges, issues and the report.

pub mod document;
pub mod edge;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
/// Issue severity. Only errors fail a run.
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
/// Which pipeline stage produced an issue.
pub enum Category {
    /// File could not be turned into a document.
    Load,
    /// Single-document structure problem.
    Syntax,
    /// Dangling or malformed cross-document reference.
    Reference,
    /// Unrecognised but structurally valid value.
    Structural,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
/// A single validation issue with severity and location.
pub struct Issue {
    pub file: String,
    pub category: Category,
    pub severity: Severity,
    pub rule: String,
    /// `$`-rooted locator of the offending value, e.g. `$.fields[2].type`.
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Issue {
    pub fn error(
        file: impl Into<String>,
        category: Category,
        rule: &str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Issue {
            file: file.into(),
            category,
            severity: Severity::Error,
            rule: rule.to_string(),
            path: path.into(),
            message: message.into(),
            line: None,
        }
    }

    /// Warnings are always structural.
    pub fn warning(
        file: impl Into<String>,
        rule: &str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Issue {
            file: file.into(),
            category: Category::Structural,
            severity: Severity::Warning,
            rule: rule.to_string(),
            path: path.into(),
            message: message.into(),
            line: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Top-level key the locator starts with (`$.defaults.steps[0]` -> `defaults`).
    pub fn top_level_key(&self) -> Option<&str> {
        let rest = self.path.strip_prefix("$.")?;
        let end = rest.find(['.', '[']).unwrap_or(rest.len());
        Some(&rest[..end]).filter(|k| !k.is_empty())
    }
}

#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
/// Aggregated counts used by printers and exit-code decisions.
pub struct Summary {
    pub files: usize,
    pub errors: usize,
    pub warnings: usize,
    pub per_type: BTreeMap<String, usize>,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
/// Final result of one validation run.
pub struct ValidationReport {
    pub issues: Vec<Issue>,
    pub summary: Summary,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0
    }
}
