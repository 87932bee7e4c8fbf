//! Reference extraction.
//!
//! Each kind has a fixed set of reference-bearing locations; this module
//! turns them into `ReferenceEdge`s without consulting any other document.
//! It also checks orchestration step chains, which are intra-document:
//! a `{{step.output}}` placeholder may only name a step that runs earlier.

use crate::models::document::{entry_name, Document, DocumentKind};
use crate::models::edge::{RefKind, ReferenceEdge};
use crate::models::{Category, Issue};
use crate::rules::{RECORD_IMPLEMENTATIONS, RESERVED_SCOPES};
use crate::template::{placeholders, walk_strings};
use serde_json::Value as Json;
use std::collections::HashMap;

/// All reference edges leaving `doc`, in document order.
pub fn extract_edges(doc: &Document) -> Vec<ReferenceEdge> {
    let mut out = Vec::new();
    match doc.kind {
        DocumentKind::Action => action_edges(doc, &mut out),
        DocumentKind::Schema => schema_edges(doc, &mut out),
        DocumentKind::Layout => layout_edges(doc, &mut out),
        DocumentKind::Automation => automation_edges(doc, &mut out),
        DocumentKind::Integration => {}
        DocumentKind::Form => form_edges(doc, &mut out),
        DocumentKind::Report => object_with_fields(doc, "columns", &mut out),
        DocumentKind::Embedding => object_with_fields(doc, "fields", &mut out),
        DocumentKind::Endpoint => endpoint_edges(doc, &mut out),
    }
    out
}

fn str_at<'a>(v: &'a Json, key: &str) -> Option<&'a str> {
    v.get(key).and_then(Json::as_str)
}

fn list_at<'a>(v: Option<&'a Json>) -> &'a [Json] {
    v.and_then(Json::as_array).map(Vec::as_slice).unwrap_or(&[])
}

/// `object.field` names its own object; a bare name belongs to `default_owner`.
fn field_ref(
    doc: &Document,
    path: String,
    name: &str,
    default_owner: Option<&str>,
    implied: bool,
) -> Option<ReferenceEdge> {
    match name.split_once('.') {
        Some((obj, field)) => Some(ReferenceEdge::field_of(&doc.path, path, obj, field)),
        None => {
            let edge = ReferenceEdge::field_of(&doc.path, path, default_owner?, name);
            Some(if implied { edge.advisory() } else { edge })
        }
    }
}

fn action_edges(doc: &Document, out: &mut Vec<ReferenceEdge>) {
    let Some(defaults) = doc.get("defaults").filter(|d| d.is_object()) else {
        return;
    };
    if let Some(integration) = str_at(defaults, "integration") {
        out.push(ReferenceEdge::new(
            &doc.path,
            "$.defaults.integration",
            RefKind::IntegrationRef,
            integration,
        ));
    }
    let implementation = doc.get_str("implementation").unwrap_or("");
    if RECORD_IMPLEMENTATIONS.contains(&implementation) {
        if let Some(object) = str_at(defaults, "object") {
            out.push(ReferenceEdge::new(
                &doc.path,
                "$.defaults.object",
                RefKind::SchemaObjectRef,
                object,
            ));
        }
    }
    if implementation == "orchestration" {
        for (i, step) in list_at(defaults.get("steps")).iter().enumerate() {
            if let Some(r) = str_at(step, "ref") {
                out.push(
                    ReferenceEdge::new(
                        &doc.path,
                        format!("$.defaults.steps[{}].ref", i),
                        RefKind::ActionRef,
                        r,
                    )
                    .at_step(i),
                );
            }
        }
    }
}

fn schema_edges(doc: &Document, out: &mut Vec<ReferenceEdge>) {
    for (i, field) in list_at(doc.get("fields")).iter().enumerate() {
        let Some(fk) = field.get("foreign_key") else {
            continue;
        };
        let Some(table) = str_at(fk, "table") else {
            continue;
        };
        let path = format!("$.fields[{}].foreign_key", i);
        out.push(ReferenceEdge::new(
            &doc.path,
            format!("{}.table", path),
            RefKind::SchemaObjectRef,
            table,
        ));
        if let Some(target_field) = str_at(fk, "field") {
            out.push(ReferenceEdge::field_of(
                &doc.path,
                format!("{}.field", path),
                table,
                target_field,
            ));
        }
    }
    for (i, join) in list_at(doc.get("joins")).iter().enumerate() {
        if let Some(object) = str_at(join, "object") {
            out.push(ReferenceEdge::new(
                &doc.path,
                format!("$.joins[{}].object", i),
                RefKind::JoinObjectRef,
                object,
            ));
        }
    }
}

fn layout_edges(doc: &Document, out: &mut Vec<ReferenceEdge>) {
    // An explicit `object` must exist; one implied by the layout name may not.
    let (owner, implied) = match doc.get_str("object") {
        Some(o) => (Some(o), false),
        None => (doc.name.as_deref(), true),
    };
    if let Some(o) = owner {
        let edge = ReferenceEdge::new(&doc.path, "$.name", RefKind::SchemaObjectRef, o);
        out.push(if implied {
            edge.advisory()
        } else {
            ReferenceEdge {
                field: "$.object".to_string(),
                ..edge
            }
        });
    }
    for (i, comp) in list_at(doc.get("components")).iter().enumerate() {
        for (j, entry) in list_at(comp.get("fields")).iter().enumerate() {
            let Some(name) = entry_name(entry) else {
                continue;
            };
            let path = format!("$.components[{}].fields[{}]", i, j);
            out.extend(field_ref(doc, path, name, owner, implied));
        }
    }
}

fn automation_edges(doc: &Document, out: &mut Vec<ReferenceEdge>) {
    if let Some(trigger) = doc.get("trigger") {
        if str_at(trigger, "type") == Some("database_event") {
            for (i, t) in list_at(trigger.get("tables")).iter().enumerate() {
                if let Some(table) = t.as_str() {
                    out.push(ReferenceEdge::new(
                        &doc.path,
                        format!("$.trigger.tables[{}]", i),
                        RefKind::SchemaObjectRef,
                        table,
                    ));
                }
            }
        }
    }
    if let Some(r) = doc.get("action").and_then(|a| str_at(a, "ref")) {
        out.push(ReferenceEdge::new(
            &doc.path,
            "$.action.ref",
            RefKind::ActionRef,
            r,
        ));
    }
}

fn form_edges(doc: &Document, out: &mut Vec<ReferenceEdge>) {
    let target = doc.get_str("target_object");
    if let Some(t) = target {
        out.push(ReferenceEdge::new(
            &doc.path,
            "$.target_object",
            RefKind::SchemaObjectRef,
            t,
        ));
    }
    for (i, field) in list_at(doc.get("fields")).iter().enumerate() {
        if let Some(maps_to) = str_at(field, "maps_to") {
            let path = format!("$.fields[{}].maps_to", i);
            out.extend(field_ref(doc, path, maps_to, target, false));
        }
    }
}

/// Reports and embeddings: `object` plus a list of that object's fields.
fn object_with_fields(doc: &Document, key: &str, out: &mut Vec<ReferenceEdge>) {
    let object = doc.get_str("object");
    if let Some(o) = object {
        out.push(ReferenceEdge::new(
            &doc.path,
            "$.object",
            RefKind::SchemaObjectRef,
            o,
        ));
    }
    for (i, entry) in list_at(doc.get(key)).iter().enumerate() {
        if let Some(name) = entry_name(entry) {
            let path = format!("$.{}[{}]", key, i);
            out.extend(field_ref(doc, path, name, object, false));
        }
    }
}

fn endpoint_edges(doc: &Document, out: &mut Vec<ReferenceEdge>) {
    if let Some(o) = doc.get_str("object") {
        out.push(ReferenceEdge::new(
            &doc.path,
            "$.object",
            RefKind::SchemaObjectRef,
            o,
        ));
    }
    if let Some(r) = doc.get("action").and_then(|a| str_at(a, "ref")) {
        out.push(ReferenceEdge::new(
            &doc.path,
            "$.action.ref",
            RefKind::ActionRef,
            r,
        ));
    }
}

/// Check placeholders inside orchestration steps against step order.
///
/// Multi-segment placeholders whose root is a step name must name a strictly
/// earlier step. A multi-segment root that is neither a step, a declared
/// `input_schema` key nor a reserved scope (`input`, `env`, ...) is an
/// unknown step.
pub fn check_step_chain(doc: &Document) -> Vec<Issue> {
    let mut issues = Vec::new();
    if doc.kind != DocumentKind::Action || doc.get_str("implementation") != Some("orchestration") {
        return issues;
    }
    let steps = list_at(doc.lookup("defaults.steps"));
    let positions: HashMap<&str, usize> = steps
        .iter()
        .enumerate()
        .filter_map(|(i, s)| str_at(s, "name").map(|n| (n, i)))
        .rev()
        .collect();
    let inputs: Vec<&str> = doc
        .get("input_schema")
        .and_then(Json::as_object)
        .map(|m| m.keys().map(String::as_str).collect())
        .unwrap_or_default();

    for (i, step) in steps.iter().enumerate() {
        let Some(obj) = step.as_object() else {
            continue;
        };
        let here = str_at(step, "name").unwrap_or("");
        for (key, value) in obj.iter().filter(|(k, _)| *k != "ref" && *k != "name") {
            let base = format!("$.defaults.steps[{}].{}", i, key);
            walk_strings(value, &base, &mut |path, s| {
                // Malformed placeholders are reported by the syntax pass.
                let Ok(found) = placeholders(s) else {
                    return;
                };
                for ph in found.iter().filter(|p| p.segments.len() >= 2) {
                    let root = ph.root();
                    let message = match positions.get(root) {
                        Some(&pos) if pos < i => continue,
                        Some(_) => format!(
                            "Step '{}' references step '{}' which has not run yet",
                            here, root
                        ),
                        None if RESERVED_SCOPES.contains(&root) || inputs.contains(&root) => {
                            continue
                        }
                        None => format!("Step '{}' references unknown step: {}", here, root),
                    };
                    issues.push(Issue::error(
                        doc.path.as_str(),
                        Category::Reference,
                        "invalid_step_reference",
                        path,
                        message,
                    ));
                }
            });
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_document;

    fn edges(src: &str) -> Vec<ReferenceEdge> {
        extract_edges(&parse_document("t.ps", src).unwrap())
    }

    fn chain(src: &str) -> Vec<Issue> {
        check_step_chain(&parse_document("t.ps", src).unwrap())
    }

    #[test]
    fn test_automation_action_ref_and_tables() {
        let es = edges(
            "type: automation\nname: a\ntrigger:\n  type: database_event\n  tables: [contact]\naction:\n  ref: send.email\n",
        );
        assert_eq!(es.len(), 2);
        assert_eq!(es[0].kind, RefKind::SchemaObjectRef);
        assert_eq!(es[0].target, "contact");
        assert_eq!(es[1].kind, RefKind::ActionRef);
        assert_eq!(es[1].target, "send.email");
        assert_eq!(es[1].field, "$.action.ref");
    }

    #[test]
    fn test_orchestration_edges_keep_step_order() {
        let es = edges(
            r#"
type: action
name: o
implementation: orchestration
defaults:
  integration: crm
  steps:
    - name: first
      ref: lookup.contact
    - name: second
      ref: send.email
"#,
        );
        let steps: Vec<(Option<usize>, &str)> = es
            .iter()
            .filter(|e| e.kind == RefKind::ActionRef)
            .map(|e| (e.step, e.target.as_str()))
            .collect();
        assert_eq!(
            steps,
            vec![(Some(0), "lookup.contact"), (Some(1), "send.email")]
        );
        assert!(es.iter().any(|e| e.kind == RefKind::IntegrationRef && e.target == "crm"));
    }

    #[test]
    fn test_layout_fields_implied_and_dotted() {
        let es = edges(
            "type: layout\nname: contact\ncomponents:\n  - fields:\n      - email\n      - name: phone\n      - account.name\n",
        );
        assert_eq!(es.len(), 4);
        assert!(es[0].advisory);
        assert_eq!(es[0].kind, RefKind::SchemaObjectRef);
        assert_eq!(es[1].owner.as_deref(), Some("contact"));
        assert_eq!(es[1].target, "email");
        assert!(es[1].advisory);
        assert_eq!(es[3].owner.as_deref(), Some("account"));
        assert_eq!(es[3].target, "name");
        assert!(!es[3].advisory);
    }

    #[test]
    fn test_layout_explicit_object_is_not_advisory() {
        let es = edges(
            "type: layout\nname: contact_main\nobject: contact\ncomponents:\n  - fields: [email]\n",
        );
        assert!(es.iter().all(|e| !e.advisory));
        assert_eq!(es[0].field, "$.object");
        assert_eq!(es[1].owner.as_deref(), Some("contact"));
    }

    #[test]
    fn test_schema_and_form_edges() {
        let es = edges(
            "type: schema\nobject: contact\nfields:\n  - name: account_id\n    type: string\n    foreign_key:\n      table: account\n      field: id\njoins:\n  - object: owner\n",
        );
        let kinds: Vec<RefKind> = es.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RefKind::SchemaObjectRef,
                RefKind::SchemaFieldRef,
                RefKind::JoinObjectRef
            ]
        );

        let es = edges(
            "type: form\nname: f\ntarget_object: contact\nfields:\n  - name: e\n    maps_to: email\n  - name: a\n    maps_to: account.name\n",
        );
        assert_eq!(es.len(), 3);
        assert_eq!(es[1].owner.as_deref(), Some("contact"));
        assert_eq!(es[2].owner.as_deref(), Some("account"));
    }

    #[test]
    fn test_step_chain_backward_reference_ok() {
        let issues = chain(
            r#"
type: action
name: o
implementation: orchestration
defaults:
  steps:
    - name: a
      ref: x.a
      with:
        q: "{{input.query}}"
    - name: b
      ref: x.b
      with:
        x: "{{a.output}}"
"#,
        );
        assert!(issues.is_empty(), "{:?}", issues);
    }

    #[test]
    fn test_step_chain_forward_and_unknown_reference() {
        let issues = chain(
            r#"
type: action
name: o
implementation: orchestration
defaults:
  steps:
    - name: a
      ref: x.a
      with:
        x: "{{b.output}}"
    - name: b
      ref: x.b
      with:
        y: "{{ghost.value}}"
        z: "{{b.self}}"
"#,
        );
        assert_eq!(issues.len(), 3);
        assert_eq!(issues[0].path, "$.defaults.steps[0].with.x");
        assert!(issues[0].message.contains("has not run yet"));
        assert!(issues[1].message.contains("unknown step: ghost"));
        assert!(issues[2].message.contains("'b'"));
        assert!(issues.iter().all(|i| i.category == Category::Reference));
    }

    #[test]
    fn test_step_chain_accepts_declared_inputs() {
        let issues = chain(
            r#"
type: action
name: o
implementation: orchestration
input_schema:
  contact: {}
defaults:
  steps:
    - name: a
      ref: send.email
      with:
        to: "{{contact.email}}"
        note: "{{account.id}}"
"#,
        );
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("unknown step: account"));
    }
}
