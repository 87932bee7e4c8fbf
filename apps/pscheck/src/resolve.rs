//! Reference resolution against the frozen corpus index.
//!
//! Lookups are read-only, so edges are resolved in parallel; output order
//! follows the input edge order.

use crate::index::Registry;
use crate::models::document::DocumentKind;
use crate::models::edge::{RefKind, ReferenceEdge};
use crate::models::{Category, Issue};
use rayon::prelude::*;

/// Resolve every edge, returning one issue per unresolved edge.
pub fn resolve(edges: &[ReferenceEdge], registry: &Registry<'_>) -> Vec<Issue> {
    edges
        .par_iter()
        .filter_map(|e| resolve_edge(e, registry))
        .collect()
}

fn not_found(edge: &ReferenceEdge, kind: RefKind, name: &str) -> Issue {
    Issue::error(
        edge.source.as_str(),
        Category::Reference,
        kind.rule(),
        edge.field.as_str(),
        format!("{} not found: {}", kind.label(), name),
    )
}

/// Resolve a single edge. Field references resolve their owner first so a
/// missing object and a missing field stay distinguishable.
pub fn resolve_edge(edge: &ReferenceEdge, registry: &Registry<'_>) -> Option<Issue> {
    match edge.kind {
        RefKind::SchemaFieldRef => {
            let owner = edge.owner.as_deref()?;
            match registry.schema_fields(owner) {
                // Implied owner already produced its own warning.
                None if edge.advisory => None,
                // Owner failed to load; its fields are unknowable.
                None if registry.is_reserved(DocumentKind::Schema, owner) => None,
                None => Some(not_found(edge, RefKind::SchemaObjectRef, owner)),
                Some(fields) if fields.contains(&edge.target.as_str()) => None,
                Some(_) => Some(not_found(
                    edge,
                    RefKind::SchemaFieldRef,
                    &format!("{}.{}", owner, edge.target),
                )),
            }
        }
        kind => {
            if registry.contains(edge.target_type(), &edge.target) {
                return None;
            }
            if edge.advisory && edge.target_type() == DocumentKind::Schema {
                return Some(Issue::warning(
                    edge.source.as_str(),
                    "missing_schema_reference",
                    edge.field.as_str(),
                    format!("schema not found for layout: {}", edge.target),
                ));
            }
            Some(not_found(edge, kind, &edge.target))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_edges;
    use crate::index::build_index;
    use crate::loader::parse_document;
    use crate::models::document::Document;
    use crate::models::Severity;

    fn corpus() -> Vec<Document> {
        [
            (
                "schemas/contact.ps",
                "type: schema\nobject: contact\ndescription: d\nfields:\n  - name: email\n    type: email\n  - name: name\n    type: string\n",
            ),
            (
                "actions/send.ps",
                "type: action\nname: send.email\ndescription: d\nimplementation: llm\n",
            ),
        ]
        .iter()
        .map(|(p, s)| parse_document(p, s).unwrap())
        .collect()
    }

    fn resolve_src(src: &str) -> Vec<Issue> {
        let docs = corpus();
        let reserved = vec![
            (DocumentKind::Action, "broken.action".to_string()),
            (DocumentKind::Schema, "broken_object".to_string()),
        ];
        let (reg, _) = build_index(&docs, &reserved);
        let doc = parse_document("t.ps", src).unwrap();
        resolve(&extract_edges(&doc), &reg)
    }

    #[test]
    fn test_resolved_edges_produce_nothing() {
        let issues = resolve_src(
            "type: automation\nname: a\ntrigger:\n  type: database_event\n  tables: [contact]\naction:\n  ref: send.email\n",
        );
        assert!(issues.is_empty(), "{:?}", issues);
    }

    #[test]
    fn test_dangling_action_reference() {
        let issues = resolve_src("type: automation\nname: a\naction:\n  ref: nonexistent.action\n");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule, "missing_action_reference");
        assert_eq!(issues[0].message, "action not found: nonexistent.action");
        assert_eq!(issues[0].path, "$.action.ref");
    }

    #[test]
    fn test_missing_object_vs_missing_field() {
        let issues = resolve_src(
            "type: form\nname: f\ntitle: t\ntarget_object: contact\nfields:\n  - name: a\n    maps_to: phone\n  - name: b\n    maps_to: account.id\n",
        );
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].rule, "missing_field_reference");
        assert_eq!(issues[0].message, "field not found: contact.phone");
        assert_eq!(issues[1].rule, "missing_schema_reference");
        assert_eq!(issues[1].message, "schema object not found: account");
    }

    #[test]
    fn test_layout_without_schema_is_one_warning() {
        let issues = resolve_src(
            "type: layout\nname: lead\ncomponents:\n  - fields: [email, company]\n",
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert_eq!(issues[0].message, "schema not found for layout: lead");
    }

    #[test]
    fn test_layout_unknown_field_on_existing_schema() {
        let issues = resolve_src(
            "type: layout\nname: contact\ncomponents:\n  - fields: [email, nickname]\n",
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "field not found: contact.nickname");
        assert!(issues[0].is_error());
    }

    #[test]
    fn test_integration_and_join_labels() {
        let issues = resolve_src(
            "type: action\nname: i\nimplementation: integration_call\ndefaults:\n  integration: stripe\n",
        );
        assert_eq!(issues[0].message, "integration not found: stripe");
        let issues = resolve_src("type: schema\nobject: deal\njoins:\n  - object: pipeline\n");
        assert_eq!(issues[0].rule, "missing_join_reference");
        assert_eq!(issues[0].message, "join object not found: pipeline");
    }

    #[test]
    fn test_references_to_unloadable_documents_are_silent() {
        let issues = resolve_src(
            "type: form\nname: f\ntarget_object: broken_object\nfields:\n  - name: a\n    maps_to: anything\n",
        );
        assert!(issues.is_empty(), "{:?}", issues);
        let issues = resolve_src("type: automation\nname: a\naction:\n  ref: broken.action\n");
        assert!(issues.is_empty(), "{:?}", issues);
    }
}
