//! Result aggregation: ordering, de-duplication and summary counts.

use crate::models::document::Document;
use crate::models::{Issue, Summary, ValidationReport};
use std::collections::{BTreeMap, HashSet};

/// Merge issues into a report.
///
/// Issues are stable-sorted by file so the per-file order is the order the
/// pipeline produced them in. Repeated `(file, rule, message)` triples are
/// dropped, keeping the first.
pub fn aggregate<'a>(
    issues: Vec<Issue>,
    documents: impl IntoIterator<Item = &'a Document>,
) -> ValidationReport {
    let mut issues = issues;
    issues.sort_by(|a, b| a.file.cmp(&b.file));
    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    issues.retain(|i| seen.insert((i.file.clone(), i.rule.clone(), i.message.clone())));

    let mut per_type: BTreeMap<String, usize> = BTreeMap::new();
    let mut files = 0usize;
    for d in documents {
        files += 1;
        *per_type.entry(d.kind.to_string()).or_insert(0) += 1;
    }
    let errors = issues.iter().filter(|i| i.is_error()).count();
    let warnings = issues.len() - errors;
    ValidationReport {
        issues,
        summary: Summary {
            files,
            errors,
            warnings,
            per_type,
        },
    }
}
