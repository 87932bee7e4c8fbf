//! pscheck core library.
//!
//! Static validation for PlayScript: a declarative, cross-referencing
//! configuration language describing business artifacts. Each `.ps` file is
//! one document; documents reference each other (automations name actions,
//! layouts name schema fields, orchestrations chain actions as steps).
//!
//! ```text
//! loader ─┬─> syntax ─────────────────────────────┐
//!         └─> index ──> extract ──> resolve ──────┴─> report
//! ```
//!
//! High-level modules:
//! - `loader`: Discovery and parsing into `Document`s.
//! - `rules`: Static per-kind rule table and open vocabularies.
//! - `syntax`: Single-document structural checks.
//! - `index`: Corpus index (`Registry`) with duplicate detection.
//! - `extract`: Reference edges and orchestration step-chain checks.
//! - `resolve`: Edge resolution against the frozen registry.
//! - `report`: Ordering, de-duplication and summary counts.
//! - `validate`: Runs the phases per mode.
//! - `config`, `cli`, `output`: Configuration, argument parsing, printers.
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod index;
pub mod loader;
pub mod models;
pub mod output;
pub mod report;
pub mod resolve;
pub mod rules;
pub mod syntax;
pub mod template;
pub mod validate;

pub use models::{Issue, Severity, ValidationReport};
pub use validate::{run, validate_sources, Mode, Pipeline, ValidateOptions};
