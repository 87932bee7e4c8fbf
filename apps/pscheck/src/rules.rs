//! Static per-kind rule table.
//!
//! `TypeRule` lists required top-level keys and the expected shape of known
//! top-level values. Nested rules that need code (schema fields, trigger
//! shapes, step chains) live in `syntax`; this module only declares data and
//! the open vocabularies that may be extended from configuration.

use crate::models::document::DocumentKind;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Expected shape of a top-level value.
pub enum Shape {
    Text,
    Bool,
    List,
    Object,
    /// Closed enumeration; anything else is an error.
    OneOf(&'static [&'static str]),
}

#[derive(Debug)]
pub struct FieldRule {
    pub key: &'static str,
    pub shape: Shape,
}

#[derive(Debug)]
pub struct TypeRule {
    pub kind: DocumentKind,
    pub required: &'static [&'static str],
    pub fields: &'static [FieldRule],
}

pub const IMPLEMENTATIONS: &[&str] = &[
    "llm",
    "create_record",
    "update_record",
    "delete_record",
    "integration_call",
    "orchestration",
    "search",
    "python",
    "api_call",
];

/// Implementations that operate on a schema object named by `defaults.object`.
pub const RECORD_IMPLEMENTATIONS: &[&str] =
    &["create_record", "update_record", "delete_record", "search"];

pub const EFFECTS: &[&str] = &["read", "write"];

pub const TRIGGER_TYPES: &[&str] = &["database_event", "schedule", "webhook", "manual"];

pub const DATABASE_EVENTS: &[&str] = &["record_created", "record_updated", "record_deleted"];

pub const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE"];

pub const FIELD_TYPES: &[&str] = &[
    "string",
    "text",
    "textarea",
    "email",
    "phone",
    "url",
    "integer",
    "decimal",
    "boolean",
    "date",
    "datetime",
    "picklist.excl",
    "picklist.multi",
];

pub const COMPONENT_TYPES: &[&str] = &["field_section", "related_list", "custom_component"];

/// Placeholder roots that are never orchestration step names.
pub const RESERVED_SCOPES: &[&str] = &[
    "input", "inputs", "env", "context", "record", "trigger", "user", "secrets", "config",
];

const fn f(key: &'static str, shape: Shape) -> FieldRule {
    FieldRule { key, shape }
}

static ACTION: TypeRule = TypeRule {
    kind: DocumentKind::Action,
    required: &["type", "name", "description", "implementation"],
    fields: &[
        f("name", Shape::Text),
        f("description", Shape::Text),
        f("implementation", Shape::OneOf(IMPLEMENTATIONS)),
        f("effect", Shape::OneOf(EFFECTS)),
        f("enabled", Shape::Bool),
        f("tags", Shape::List),
        f("input_schema", Shape::Object),
        f("output_schema", Shape::Object),
        f("defaults", Shape::Object),
    ],
};

static SCHEMA: TypeRule = TypeRule {
    kind: DocumentKind::Schema,
    required: &["type", "object", "description", "fields"],
    fields: &[
        f("object", Shape::Text),
        f("view_name", Shape::Text),
        f("description", Shape::Text),
        f("fields", Shape::List),
        f("joins", Shape::List),
    ],
};

static LAYOUT: TypeRule = TypeRule {
    kind: DocumentKind::Layout,
    required: &["type", "name", "components"],
    fields: &[
        f("name", Shape::Text),
        f("object", Shape::Text),
        f("description", Shape::Text),
        f("components", Shape::List),
    ],
};

static AUTOMATION: TypeRule = TypeRule {
    kind: DocumentKind::Automation,
    required: &["type", "name", "description", "trigger", "action"],
    fields: &[
        f("name", Shape::Text),
        f("description", Shape::Text),
        f("enabled", Shape::Bool),
        f("trigger", Shape::Object),
        f("action", Shape::Object),
    ],
};

static INTEGRATION: TypeRule = TypeRule {
    kind: DocumentKind::Integration,
    required: &["type", "name", "service", "description"],
    fields: &[
        f("name", Shape::Text),
        f("service", Shape::Text),
        f("description", Shape::Text),
        f("auth", Shape::Object),
        f("config", Shape::Object),
    ],
};

static FORM: TypeRule = TypeRule {
    kind: DocumentKind::Form,
    required: &["type", "name", "title", "target_object", "fields"],
    fields: &[
        f("name", Shape::Text),
        f("title", Shape::Text),
        f("description", Shape::Text),
        f("target_object", Shape::Text),
        f("fields", Shape::List),
    ],
};

static REPORT: TypeRule = TypeRule {
    kind: DocumentKind::Report,
    required: &["type", "name", "description", "object"],
    fields: &[
        f("name", Shape::Text),
        f("description", Shape::Text),
        f("object", Shape::Text),
        f("columns", Shape::List),
        f("filters", Shape::Object),
    ],
};

static EMBEDDING: TypeRule = TypeRule {
    kind: DocumentKind::Embedding,
    required: &["type", "name", "description", "object", "fields"],
    fields: &[
        f("name", Shape::Text),
        f("description", Shape::Text),
        f("object", Shape::Text),
        f("fields", Shape::List),
    ],
};

static ENDPOINT: TypeRule = TypeRule {
    kind: DocumentKind::Endpoint,
    required: &["type", "name", "description", "path", "method"],
    fields: &[
        f("name", Shape::Text),
        f("description", Shape::Text),
        f("path", Shape::Text),
        f("method", Shape::OneOf(HTTP_METHODS)),
        f("object", Shape::Text),
        f("action", Shape::Object),
    ],
};

/// Rule descriptor for a kind. Exhaustive over the closed kind set.
pub fn rule_for(kind: DocumentKind) -> &'static TypeRule {
    match kind {
        DocumentKind::Action => &ACTION,
        DocumentKind::Schema => &SCHEMA,
        DocumentKind::Layout => &LAYOUT,
        DocumentKind::Automation => &AUTOMATION,
        DocumentKind::Integration => &INTEGRATION,
        DocumentKind::Form => &FORM,
        DocumentKind::Report => &REPORT,
        DocumentKind::Embedding => &EMBEDDING,
        DocumentKind::Endpoint => &ENDPOINT,
    }
}

#[derive(Debug, Clone)]
/// Open vocabularies. Unknown members produce warnings, not errors.
pub struct Vocabulary {
    pub field_types: BTreeSet<String>,
    pub component_types: BTreeSet<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Vocabulary {
            field_types: FIELD_TYPES.iter().map(|s| s.to_string()).collect(),
            component_types: COMPONENT_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Vocabulary {
    /// Defaults plus project-specific extras from configuration.
    pub fn extended(extra_field_types: &[String], extra_component_types: &[String]) -> Self {
        let mut v = Vocabulary::default();
        v.field_types.extend(extra_field_types.iter().cloned());
        v.component_types.extend(extra_component_types.iter().cloned());
        v
    }

    pub fn knows_field_type(&self, t: &str) -> bool {
        self.field_types.contains(t)
    }

    pub fn knows_component_type(&self, t: &str) -> bool {
        self.component_types.contains(t)
    }
}
