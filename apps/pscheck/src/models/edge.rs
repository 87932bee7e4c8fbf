//! Reference edges derived from documents. Recomputed every run.

use crate::models::document::DocumentKind;
use serde::Serialize;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    ActionRef,
    SchemaObjectRef,
    SchemaFieldRef,
    IntegrationRef,
    JoinObjectRef,
}

impl RefKind {
    /// Registry kind the target lives under.
    pub fn target_type(&self) -> DocumentKind {
        match self {
            RefKind::ActionRef => DocumentKind::Action,
            RefKind::IntegrationRef => DocumentKind::Integration,
            RefKind::SchemaObjectRef | RefKind::SchemaFieldRef | RefKind::JoinObjectRef => {
                DocumentKind::Schema
            }
        }
    }

    /// Human label used in "<label> not found" messages.
    pub fn label(&self) -> &'static str {
        match self {
            RefKind::ActionRef => "action",
            RefKind::SchemaObjectRef => "schema object",
            RefKind::SchemaFieldRef => "field",
            RefKind::IntegrationRef => "integration",
            RefKind::JoinObjectRef => "join object",
        }
    }

    /// Rule id reported when the target is missing.
    pub fn rule(&self) -> &'static str {
        match self {
            RefKind::ActionRef => "missing_action_reference",
            RefKind::SchemaObjectRef => "missing_schema_reference",
            RefKind::SchemaFieldRef => "missing_field_reference",
            RefKind::IntegrationRef => "missing_integration_reference",
            RefKind::JoinObjectRef => "missing_join_reference",
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
/// A directed pointer from one document field to another document (or a
/// field inside it).
pub struct ReferenceEdge {
    pub source: String,
    pub field: String,
    pub kind: RefKind,
    pub target: String,
    /// Owning schema object for `SchemaFieldRef`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Position in an orchestration step chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<usize>,
    /// Target was only implied (a layout named after its object); a miss
    /// is a warning instead of an error.
    pub advisory: bool,
}

impl ReferenceEdge {
    pub fn new(source: &str, field: impl Into<String>, kind: RefKind, target: &str) -> Self {
        ReferenceEdge {
            source: source.to_string(),
            field: field.into(),
            kind,
            target: target.to_string(),
            owner: None,
            step: None,
            advisory: false,
        }
    }

    pub fn field_of(source: &str, field: impl Into<String>, owner: &str, name: &str) -> Self {
        ReferenceEdge {
            owner: Some(owner.to_string()),
            ..ReferenceEdge::new(source, field, RefKind::SchemaFieldRef, name)
        }
    }

    pub fn at_step(mut self, idx: usize) -> Self {
        self.step = Some(idx);
        self
    }

    pub fn advisory(mut self) -> Self {
        self.advisory = true;
        self
    }

    pub fn target_type(&self) -> DocumentKind {
        self.kind.target_type()
    }
}
