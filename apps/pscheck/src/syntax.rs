//! Single-document structural validation.
//!
//! Applies the `rules` table to one document at a time: required keys, value
//! shapes, closed enumerations, then the kind-specific nested rules. Never
//! looks at another document, so callers may run it in parallel.
//!
//! Failed required/enum/shape checks are errors. Unknown members of an open
//! vocabulary (field types, component types, database events) are warnings.

use crate::models::document::{entry_name, Document, DocumentKind};
use crate::models::{Category, Issue};
use crate::rules::{self, rule_for, FieldRule, Shape, Vocabulary};
use crate::template::{placeholders, walk_strings};
use serde_json::{Map, Value as Json};
use std::collections::HashSet;

struct Checker<'a> {
    doc: &'a Document,
    issues: Vec<Issue>,
}

impl<'a> Checker<'a> {
    fn error(&mut self, rule: &str, path: impl Into<String>, message: impl Into<String>) {
        self.issues.push(Issue::error(
            self.doc.path.as_str(),
            Category::Syntax,
            rule,
            path,
            message,
        ));
    }

    fn warn(&mut self, rule: &str, path: impl Into<String>, message: impl Into<String>) {
        self.issues
            .push(Issue::warning(self.doc.path.as_str(), rule, path, message));
    }

    fn list(&self, key: &str) -> Option<&'a Vec<Json>> {
        self.doc.get(key).and_then(Json::as_array)
    }
}

/// Validate one document against its kind's rules.
pub fn validate_syntax(doc: &Document, vocab: &Vocabulary) -> Vec<Issue> {
    let mut cx = Checker {
        doc,
        issues: Vec::new(),
    };
    let rule = rule_for(doc.kind);
    check_required(&mut cx, rule.required);
    check_shapes(&mut cx, rule.fields);
    match doc.kind {
        DocumentKind::Action => check_action(&mut cx),
        DocumentKind::Schema => check_schema(&mut cx, vocab),
        DocumentKind::Layout => check_layout(&mut cx, vocab),
        DocumentKind::Automation => check_automation(&mut cx),
        DocumentKind::Integration => {}
        DocumentKind::Form => check_form(&mut cx),
        DocumentKind::Report => check_named_entries(&mut cx, "columns", "invalid_column"),
        DocumentKind::Embedding => check_named_entries(&mut cx, "fields", "invalid_field_entry"),
        DocumentKind::Endpoint => check_endpoint(&mut cx),
    }
    check_placeholders(&mut cx);
    cx.issues
}

fn is_missing(v: Option<&Json>) -> bool {
    matches!(v, None | Some(Json::Null))
}

fn check_required(cx: &mut Checker, required: &[&str]) {
    for key in required {
        if is_missing(cx.doc.get(key)) {
            cx.error(
                "missing_required_field",
                "$",
                format!("Missing required field: {}", key),
            );
        }
    }
}

fn check_shapes(cx: &mut Checker, fields: &[FieldRule]) {
    for fr in fields {
        let Some(v) = cx.doc.get(fr.key).filter(|v| !v.is_null()) else {
            continue;
        };
        let path = format!("$.{}", fr.key);
        match fr.shape {
            Shape::Text if !v.is_string() => {
                cx.error("invalid_value", path, format!("{} must be a string", fr.key))
            }
            Shape::Bool if !v.is_boolean() => {
                cx.error("invalid_value", path, format!("{} must be a boolean", fr.key))
            }
            Shape::List if !v.is_array() => cx.error(
                &format!("invalid_{}", fr.key),
                path,
                format!("{} must be a list", fr.key),
            ),
            Shape::Object if !v.is_object() => cx.error(
                &format!("invalid_{}", fr.key),
                path,
                format!("{} must be an object", fr.key),
            ),
            Shape::OneOf(allowed) => {
                let ok = v.as_str().map(|s| allowed.contains(&s)).unwrap_or(false);
                if !ok {
                    let shown = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
                    cx.error(
                        &format!("invalid_{}", fr.key),
                        path,
                        format!(
                            "Invalid {}: {}. Must be one of: {}",
                            fr.key,
                            shown,
                            allowed.join(", ")
                        ),
                    );
                }
            }
            _ => {}
        }
    }
}

fn check_action(cx: &mut Checker) {
    let defaults: Option<&Map<String, Json>> = cx.doc.get("defaults").and_then(Json::as_object);
    match cx.doc.get_str("implementation") {
        Some("orchestration") => check_steps(cx, defaults.and_then(|d| d.get("steps"))),
        Some("integration_call") => {
            let has = defaults
                .and_then(|d| d.get("integration"))
                .and_then(Json::as_str)
                .is_some();
            if !has {
                cx.error(
                    "missing_integration",
                    "$.defaults.integration",
                    "integration_call requires 'defaults.integration'",
                );
            }
        }
        _ => {}
    }
}

fn check_steps(cx: &mut Checker, steps: Option<&Json>) {
    let steps = match steps.and_then(Json::as_array) {
        Some(s) if !s.is_empty() => s,
        _ => {
            cx.error(
                "missing_steps",
                "$.defaults.steps",
                "orchestration requires a non-empty 'defaults.steps' list",
            );
            return;
        }
    };
    let mut names: HashSet<&str> = HashSet::new();
    for (i, step) in steps.iter().enumerate() {
        let path = format!("$.defaults.steps[{}]", i);
        let Some(obj) = step.as_object() else {
            cx.error("invalid_step", path, format!("Step {} must be an object", i));
            continue;
        };
        if obj.get("ref").and_then(Json::as_str).is_none() {
            cx.error(
                "missing_step_ref",
                format!("{}.ref", path),
                format!("Step {} missing 'ref'", i),
            );
        }
        match obj.get("name") {
            None => {}
            Some(Json::String(n)) => {
                if !names.insert(n.as_str()) {
                    cx.error(
                        "duplicate_step",
                        format!("{}.name", path),
                        format!("Duplicate step name: {}", n),
                    );
                }
            }
            Some(_) => cx.error(
                "invalid_step_name",
                format!("{}.name", path),
                format!("Step {} name must be a string", i),
            ),
        }
    }
}

fn check_schema(cx: &mut Checker, vocab: &Vocabulary) {
    if let Some(fields) = cx.list("fields") {
        let mut seen: HashSet<&str> = HashSet::new();
        for (i, field) in fields.iter().enumerate() {
            let path = format!("$.fields[{}]", i);
            let Some(obj) = field.as_object() else {
                cx.error("invalid_field", path, format!("Field {} must be an object", i));
                continue;
            };
            let Some(name) = obj.get("name").and_then(Json::as_str) else {
                cx.error(
                    "missing_field_name",
                    path,
                    format!("Field {} missing 'name'", i),
                );
                continue;
            };
            if !seen.insert(name) {
                cx.error(
                    "duplicate_field",
                    format!("{}.name", path),
                    format!("Duplicate field name: {}", name),
                );
            }
            check_schema_field(cx, vocab, obj, name, &path);
        }
    }
    if let Some(joins) = cx.list("joins") {
        for (i, join) in joins.iter().enumerate() {
            let ok = join.get("object").and_then(Json::as_str).is_some();
            if !ok {
                cx.error(
                    "invalid_join",
                    format!("$.joins[{}]", i),
                    format!("Join {} must be an object with 'object'", i),
                );
            }
        }
    }
}

fn check_schema_field(
    cx: &mut Checker,
    vocab: &Vocabulary,
    obj: &Map<String, Json>,
    name: &str,
    path: &str,
) {
    match obj.get("type") {
        None | Some(Json::Null) => cx.error(
            "missing_field_type",
            path,
            format!("Field {} missing 'type'", name),
        ),
        Some(Json::String(t)) => {
            if !vocab.knows_field_type(t) {
                cx.warn(
                    "unknown_field_type",
                    format!("{}.type", path),
                    format!("Unknown field type: {}", t),
                );
            }
            if t.starts_with("picklist") {
                let has_values = obj
                    .get("values")
                    .and_then(Json::as_array)
                    .map(|v| !v.is_empty())
                    .unwrap_or(false);
                if !has_values {
                    cx.error(
                        "missing_picklist_values",
                        path,
                        format!("Picklist field {} missing 'values'", name),
                    );
                }
            }
        }
        Some(_) => cx.error(
            "invalid_field_type",
            format!("{}.type", path),
            format!("Field {} 'type' must be a string", name),
        ),
    }
    for flag in ["primary_key", "required"] {
        if let Some(v) = obj.get(flag) {
            if !v.is_boolean() {
                cx.error(
                    "invalid_field_flag",
                    format!("{}.{}", path, flag),
                    format!("Field {} '{}' must be a boolean", name, flag),
                );
            }
        }
    }
    if let Some(fk) = obj.get("foreign_key") {
        if fk.get("table").and_then(Json::as_str).is_none() {
            cx.error(
                "invalid_foreign_key",
                format!("{}.foreign_key", path),
                format!("Field {} foreign_key must be an object with 'table'", name),
            );
        }
    }
}

fn check_layout(cx: &mut Checker, vocab: &Vocabulary) {
    let Some(components) = cx.list("components") else {
        return;
    };
    for (i, comp) in components.iter().enumerate() {
        let path = format!("$.components[{}]", i);
        let Some(obj) = comp.as_object() else {
            cx.error(
                "invalid_component",
                path,
                format!("Component {} must be an object", i),
            );
            continue;
        };
        match obj.get("type") {
            None => {}
            Some(Json::String(t)) => {
                if !vocab.knows_component_type(t) {
                    cx.warn(
                        "unknown_component_type",
                        format!("{}.type", path),
                        format!("Unknown component type: {}", t),
                    );
                }
            }
            Some(_) => cx.error(
                "invalid_component_type",
                format!("{}.type", path),
                format!("Component {} type must be a string", i),
            ),
        }
        let Some(fields) = obj.get("fields") else {
            continue;
        };
        let Some(fields) = fields.as_array() else {
            cx.error(
                "invalid_component_fields",
                format!("{}.fields", path),
                format!("Component {} fields must be a list", i),
            );
            continue;
        };
        for (j, entry) in fields.iter().enumerate() {
            if entry_name(entry).is_none() {
                cx.error(
                    "invalid_field_entry",
                    format!("{}.fields[{}]", path, j),
                    format!(
                        "Component {} field {} must be a field name or an object with 'name'",
                        i, j
                    ),
                );
            }
        }
    }
}

fn check_automation(cx: &mut Checker) {
    if let Some(trigger) = cx.doc.get("trigger").and_then(Json::as_object) {
        match trigger.get("type").and_then(Json::as_str) {
            None => cx.error(
                "missing_trigger_type",
                "$.trigger.type",
                "Trigger must have 'type' field",
            ),
            Some(t) if !rules::TRIGGER_TYPES.contains(&t) => cx.error(
                "invalid_trigger_type",
                "$.trigger.type",
                format!("Invalid trigger type: {}", t),
            ),
            Some("database_event") => {
                let tables_ok = trigger
                    .get("tables")
                    .and_then(Json::as_array)
                    .map(|t| !t.is_empty() && t.iter().all(Json::is_string))
                    .unwrap_or(false);
                if !tables_ok {
                    cx.error(
                        "missing_trigger_tables",
                        "$.trigger.tables",
                        "database_event trigger requires a non-empty 'tables' list",
                    );
                }
                if let Some(on) = trigger.get("on").and_then(Json::as_str) {
                    if !rules::DATABASE_EVENTS.contains(&on) {
                        cx.warn(
                            "unknown_trigger_event",
                            "$.trigger.on",
                            format!("Unknown database event: {}", on),
                        );
                    }
                }
            }
            Some(_) => {}
        }
    }
    if let Some(action) = cx.doc.get("action").and_then(Json::as_object) {
        if action.get("ref").and_then(Json::as_str).is_none() {
            cx.error(
                "missing_action_ref",
                "$.action.ref",
                "Action must have 'ref' field",
            );
        }
    }
}

fn check_form(cx: &mut Checker) {
    let Some(fields) = cx.list("fields") else {
        return;
    };
    for (i, field) in fields.iter().enumerate() {
        let path = format!("$.fields[{}]", i);
        if entry_name(field).is_none() {
            cx.error(
                "invalid_form_field",
                path,
                format!("Form field {} must be a field name or an object with 'name'", i),
            );
            continue;
        }
        if let Some(m) = field.get("maps_to") {
            if !m.is_string() {
                cx.error(
                    "invalid_form_field",
                    format!("{}.maps_to", path),
                    format!("Form field {} maps_to must be a string", i),
                );
            }
        }
    }
}

fn check_named_entries(cx: &mut Checker, key: &str, rule: &str) {
    let Some(entries) = cx.list(key) else {
        return;
    };
    for (i, entry) in entries.iter().enumerate() {
        if entry_name(entry).is_none() {
            cx.error(
                rule,
                format!("$.{}[{}]", key, i),
                format!("{} entry {} must be a field name or an object with 'name'", key, i),
            );
        }
    }
}

fn check_endpoint(cx: &mut Checker) {
    if let Some(p) = cx.doc.get_str("path") {
        if !p.starts_with('/') {
            cx.error(
                "invalid_endpoint_path",
                "$.path",
                format!("Endpoint path must start with '/': {}", p),
            );
        }
    }
    if let Some(action) = cx.doc.get("action").and_then(Json::as_object) {
        if action.get("ref").and_then(Json::as_str).is_none() {
            cx.error(
                "missing_action_ref",
                "$.action.ref",
                "Action must have 'ref' field",
            );
        }
    }
}

fn check_placeholders(cx: &mut Checker) {
    let mut bad: Vec<(String, String)> = Vec::new();
    for (k, v) in cx.doc.fields.iter() {
        walk_strings(v, &format!("$.{}", k), &mut |path, s| {
            if let Err(m) = placeholders(s) {
                bad.push((path.to_string(), m.0));
            }
        });
    }
    for (path, raw) in bad {
        cx.error(
            "malformed_placeholder",
            path.clone(),
            format!("Malformed placeholder {} at {}", raw, path),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_document;

    fn check(src: &str) -> Vec<Issue> {
        let doc = parse_document("t.ps", src).unwrap();
        validate_syntax(&doc, &Vocabulary::default())
    }

    fn rules_of(issues: &[Issue]) -> Vec<&str> {
        issues.iter().map(|i| i.rule.as_str()).collect()
    }

    #[test]
    fn test_valid_llm_action_is_clean() {
        let issues = check(
            r#"
type: action
name: test.action
description: "A valid test action"
implementation: llm
enabled: true
effect: read
tags: [test, ai]
input_schema:
  message: {}
output_schema:
  response: {}
defaults:
  system_prompt: "You are a helpful assistant."
  user_prompt: "{{message}}"
"#,
        );
        assert!(issues.is_empty(), "{:?}", issues);
    }

    #[test]
    fn test_action_missing_fields_and_bad_enums() {
        let issues = check("type: action\nname: x\nenabled: yes-ish\neffect: delete\n");
        let rules = rules_of(&issues);
        assert_eq!(
            rules.iter().filter(|r| **r == "missing_required_field").count(),
            2
        );
        assert!(rules.contains(&"invalid_effect"));
        assert!(rules.contains(&"invalid_value"));
        assert!(issues.iter().all(|i| i.is_error()));
    }

    #[test]
    fn test_unknown_field_type_is_single_warning() {
        let issues = check(
            "type: schema\nobject: c\ndescription: d\nfields:\n  - name: id\n    type: custom_unknown_type\n",
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule, "unknown_field_type");
        assert!(!issues[0].is_error());
        assert_eq!(issues[0].category, Category::Structural);
    }

    #[test]
    fn test_schema_missing_object_is_single_error() {
        let issues = check(
            "type: schema\ndescription: d\nfields:\n  - name: id\n    type: string\n",
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "Missing required field: object");
    }

    #[test]
    fn test_schema_nested_field_rules() {
        let issues = check(
            r#"
type: schema
object: c
description: d
fields:
  - name: id
    type: string
    primary_key: "yes"
  - type: string
  - name: id
    type: email
  - name: status
    type: picklist.excl
  - name: owner
    type: string
    foreign_key: users
  - plain
joins:
  - object: account
  - on: x
"#,
        );
        let rules = rules_of(&issues);
        for r in [
            "invalid_field_flag",
            "missing_field_name",
            "duplicate_field",
            "missing_picklist_values",
            "invalid_foreign_key",
            "invalid_field",
            "invalid_join",
        ] {
            assert!(rules.contains(&r), "missing {} in {:?}", r, rules);
        }
        assert_eq!(rules.iter().filter(|r| **r == "invalid_join").count(), 1);
    }

    #[test]
    fn test_layout_component_rules() {
        let issues = check(
            r#"
type: layout
name: contact
components:
  - type: field_section
    fields:
      - name
      - name: email
      - 42
  - type: carousel
  - just-a-string
"#,
        );
        let rules = rules_of(&issues);
        assert!(rules.contains(&"invalid_field_entry"));
        assert!(rules.contains(&"unknown_component_type"));
        assert!(rules.contains(&"invalid_component"));
        let warn = issues
            .iter()
            .find(|i| i.rule == "unknown_component_type")
            .unwrap();
        assert!(!warn.is_error());
    }

    #[test]
    fn test_automation_trigger_rules() {
        let base = "type: automation\nname: a\ndescription: d\naction:\n  ref: x.y\n";
        let issues = check(&format!("{}trigger:\n  type: database_event\n", base));
        assert_eq!(rules_of(&issues), vec!["missing_trigger_tables"]);

        let issues = check(&format!("{}trigger:\n  type: cron\n", base));
        assert_eq!(rules_of(&issues), vec!["invalid_trigger_type"]);

        let issues = check(&format!(
            "{}trigger:\n  type: database_event\n  on: record_touched\n  tables: [c]\n",
            base
        ));
        assert_eq!(rules_of(&issues), vec!["unknown_trigger_event"]);

        let issues = check(
            "type: automation\nname: a\ndescription: d\ntrigger:\n  type: manual\naction:\n  with: {}\n",
        );
        assert_eq!(rules_of(&issues), vec!["missing_action_ref"]);
    }

    #[test]
    fn test_orchestration_requires_steps_with_refs() {
        let base = "type: action\nname: o\ndescription: d\nimplementation: orchestration\n";
        let issues = check(base);
        assert_eq!(rules_of(&issues), vec!["missing_steps"]);

        let issues = check(&format!("{}defaults:\n  steps: []\n", base));
        assert_eq!(rules_of(&issues), vec!["missing_steps"]);

        let issues = check(&format!(
            "{}defaults:\n  steps:\n    - name: a\n      ref: x.a\n    - name: a\n    - 3\n",
            base
        ));
        let rules = rules_of(&issues);
        assert!(rules.contains(&"missing_step_ref"));
        assert!(rules.contains(&"duplicate_step"));
        assert!(rules.contains(&"invalid_step"));
    }

    #[test]
    fn test_integration_call_needs_integration() {
        let issues = check(
            "type: action\nname: i\ndescription: d\nimplementation: integration_call\n",
        );
        assert_eq!(rules_of(&issues), vec!["missing_integration"]);
    }

    #[test]
    fn test_malformed_placeholder_reported_with_path() {
        let issues = check(
            "type: action\nname: x\ndescription: d\nimplementation: llm\ndefaults:\n  user_prompt: \"{{ a + b }}\"\n  ok: \"{{env.KEY}}\"\n",
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule, "malformed_placeholder");
        assert_eq!(issues[0].path, "$.defaults.user_prompt");
    }

    #[test]
    fn test_endpoint_and_form_rules() {
        let issues = check(
            "type: endpoint\nname: e\ndescription: d\npath: contacts\nmethod: FETCH\n",
        );
        let rules = rules_of(&issues);
        assert!(rules.contains(&"invalid_endpoint_path"));
        assert!(rules.contains(&"invalid_method"));

        let issues = check(
            "type: form\nname: f\ntitle: t\ntarget_object: c\nfields:\n  - name: a\n    maps_to: 3\n  - {}\n",
        );
        assert_eq!(
            rules_of(&issues),
            vec!["invalid_form_field", "invalid_form_field"]
        );
    }
}
