//! Corpus index: `(kind, key) -> document` built in one sequential pass.
//!
//! Documents are visited in display-path order so the first owner of a key
//! is always the lexicographically earliest file. Later owners get a
//! `duplicate_name` error and stay out of the index. Keys claimed by files
//! that failed to load are reserved: they resolve, but carry no document.

use crate::loader::ReservedKey;
use crate::models::document::{Document, DocumentKind};
use crate::models::{Category, Issue};
use std::collections::{BTreeMap, BTreeSet};

/// Read-only name lookup shared by the resolver.
#[derive(Debug, Default)]
pub struct Registry<'a> {
    entries: BTreeMap<(DocumentKind, String), &'a Document>,
    reserved: BTreeSet<ReservedKey>,
}

impl<'a> Registry<'a> {
    pub fn get(&self, kind: DocumentKind, key: &str) -> Option<&'a Document> {
        self.entries.get(&(kind, key.to_string())).copied()
    }

    pub fn contains(&self, kind: DocumentKind, key: &str) -> bool {
        self.get(kind, key).is_some() || self.is_reserved(kind, key)
    }

    /// Key owned by a file that failed to load.
    pub fn is_reserved(&self, kind: DocumentKind, key: &str) -> bool {
        self.reserved.contains(&(kind, key.to_string()))
    }

    /// Declared field names of a schema object, if the object exists.
    pub fn schema_fields(&self, object: &str) -> Option<Vec<&'a str>> {
        self.get(DocumentKind::Schema, object)
            .map(|d| d.schema_field_names())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_of(&self, kind: DocumentKind) -> usize {
        self.entries.keys().filter(|(k, _)| *k == kind).count()
    }
}

/// Build the registry. Duplicate keys are reported against the later path.
pub fn build_index<'a>(
    documents: &'a [Document],
    reserved: &[ReservedKey],
) -> (Registry<'a>, Vec<Issue>) {
    let mut ordered: Vec<&Document> = documents.iter().collect();
    ordered.sort_by(|a, b| a.path.cmp(&b.path));

    let mut registry = Registry {
        entries: BTreeMap::new(),
        reserved: reserved.iter().cloned().collect(),
    };
    let mut issues = Vec::new();
    for doc in ordered {
        let Some(key) = doc.registry_key() else {
            continue;
        };
        match registry.entries.get(&(doc.kind, key.clone())) {
            Some(first) => {
                issues.push(Issue::error(
                    doc.path.as_str(),
                    Category::Reference,
                    "duplicate_name",
                    if doc.kind == DocumentKind::Schema { "$.object" } else { "$.name" },
                    format!(
                        "Duplicate {} '{}' (first defined in {})",
                        doc.kind, key, first.path
                    ),
                ));
            }
            None => {
                registry.entries.insert((doc.kind, key), doc);
            }
        }
    }
    tracing::debug!(
        entries = registry.len(),
        schemas = registry.count_of(DocumentKind::Schema),
        actions = registry.count_of(DocumentKind::Action),
        reserved = registry.reserved.len(),
        duplicates = issues.len(),
        "corpus index built"
    );
    (registry, issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_document;

    fn docs(srcs: &[(&str, &str)]) -> Vec<Document> {
        srcs.iter()
            .map(|(p, s)| parse_document(p, s).unwrap())
            .collect()
    }

    #[test]
    fn test_duplicate_attributed_to_later_path() {
        // Input order deliberately reversed.
        let ds = docs(&[
            ("schemas/z_contact.ps", "type: schema\nobject: contact\nfields: [{name: b}]\n"),
            ("schemas/a_contact.ps", "type: schema\nobject: contact\nfields: [{name: a}]\n"),
        ]);
        let (reg, issues) = build_index(&ds, &[]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].file, "schemas/z_contact.ps");
        assert_eq!(issues[0].rule, "duplicate_name");
        assert_eq!(
            reg.get(DocumentKind::Schema, "contact").unwrap().path,
            "schemas/a_contact.ps"
        );
        assert_eq!(reg.schema_fields("contact"), Some(vec!["a"]));
    }

    #[test]
    fn test_keys_are_scoped_per_kind() {
        let ds = docs(&[
            ("a.ps", "type: action\nname: contact\n"),
            ("b.ps", "type: layout\nname: contact\n"),
            ("c.ps", "type: schema\nobject: contact\n"),
            ("d.ps", "type: form\nname: new\ntarget_object: contact\n"),
            ("e.ps", "type: form\nname: new\ntarget_object: account\n"),
        ]);
        let (reg, issues) = build_index(&ds, &[]);
        assert!(issues.is_empty());
        assert_eq!(reg.len(), 5);
        assert!(reg.contains(DocumentKind::Form, "contact.new"));
        assert_eq!(reg.count_of(DocumentKind::Form), 2);
    }

    #[test]
    fn test_reserved_keys_resolve_without_document() {
        let ds = docs(&[("a.ps", "type: action\nname: a\n")]);
        let reserved = vec![(DocumentKind::Action, "broken".to_string())];
        let (reg, issues) = build_index(&ds, &reserved);
        assert!(issues.is_empty());
        assert!(reg.contains(DocumentKind::Action, "broken"));
        assert!(reg.get(DocumentKind::Action, "broken").is_none());
        assert!(!reg.contains(DocumentKind::Schema, "broken"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_documents_without_key_are_skipped() {
        let ds = docs(&[("a.ps", "type: action\ndescription: no name\n")]);
        let (reg, issues) = build_index(&ds, &[]);
        assert!(reg.is_empty());
        assert!(issues.is_empty());
    }
}
