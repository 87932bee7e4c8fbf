//! Parsed artifact documents and the closed set of document kinds.

use serde::Serialize;
use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
/// Every artifact kind the validator understands.
pub enum DocumentKind {
    Action,
    Schema,
    Layout,
    Automation,
    Integration,
    Form,
    Report,
    Embedding,
    Endpoint,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 9] = [
        DocumentKind::Action,
        DocumentKind::Schema,
        DocumentKind::Layout,
        DocumentKind::Automation,
        DocumentKind::Integration,
        DocumentKind::Form,
        DocumentKind::Report,
        DocumentKind::Embedding,
        DocumentKind::Endpoint,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Action => "action",
            DocumentKind::Schema => "schema",
            DocumentKind::Layout => "layout",
            DocumentKind::Automation => "automation",
            DocumentKind::Integration => "integration",
            DocumentKind::Form => "form",
            DocumentKind::Report => "report",
            DocumentKind::Embedding => "embedding",
            DocumentKind::Endpoint => "endpoint",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or(())
    }
}

#[derive(Clone, Debug)]
/// One successfully loaded artifact. Immutable once the loader returns it.
pub struct Document {
    /// Display path relative to the playbook dir, `/`-separated.
    pub path: String,
    pub kind: DocumentKind,
    /// `name` for most kinds, `object` for schemas.
    pub name: Option<String>,
    pub fields: Map<String, Json>,
    /// Top-level key -> 1-based line in the source text.
    pub line_hints: BTreeMap<String, usize>,
}

impl Document {
    pub fn new(path: impl Into<String>, kind: DocumentKind, fields: Map<String, Json>) -> Self {
        let ident = if kind == DocumentKind::Schema { "object" } else { "name" };
        let name = fields.get(ident).and_then(Json::as_str).map(str::to_string);
        Document {
            path: path.into(),
            kind,
            name,
            fields,
            line_hints: BTreeMap::new(),
        }
    }

    pub fn with_line_hints(mut self, hints: BTreeMap<String, usize>) -> Self {
        self.line_hints = hints;
        self
    }

    pub fn get(&self, key: &str) -> Option<&Json> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Json::as_str)
    }

    /// Follow a dotted path through nested mappings (`defaults.steps`).
    pub fn lookup(&self, dotted: &str) -> Option<&Json> {
        let mut parts = dotted.split('.');
        let mut cur = self.fields.get(parts.next()?)?;
        for p in parts {
            cur = cur.as_object()?.get(p)?;
        }
        Some(cur)
    }

    /// Key under which the corpus index files this document.
    ///
    /// Forms are keyed by `target_object.name` so two objects can each own a
    /// form with the same name.
    pub fn registry_key(&self) -> Option<String> {
        match self.kind {
            DocumentKind::Form => {
                let target = self.get_str("target_object")?;
                let name = self.name.as_deref()?;
                Some(format!("{}.{}", target, name))
            }
            _ => self.name.clone(),
        }
    }

    /// Field names declared by a schema document, in declaration order.
    pub fn schema_field_names(&self) -> Vec<&str> {
        if self.kind != DocumentKind::Schema {
            return Vec::new();
        }
        self.get("fields")
            .and_then(Json::as_array)
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(|f| f.get("name").and_then(Json::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Name of a list entry written either as a bare string or as `{ name: ... }`.
pub fn entry_name(entry: &Json) -> Option<&str> {
    match entry {
        Json::String(s) => Some(s.as_str()),
        Json::Object(obj) => obj.get("name").and_then(Json::as_str),
        _ => None,
    }
}
