//! Validation runner: load, check, index, extract, resolve, aggregate.
//!
//! Two phases. Phase one loads every document (and, unless running
//! cross-file only, checks each one in isolation). Phase two builds the
//! corpus index from the complete document set and only then resolves
//! references, so forward references between files always resolve.

use crate::extract::{check_step_chain, extract_edges};
use crate::index::build_index;
use crate::loader::{self, display_path, Loaded, ReservedKey};
use crate::models::document::Document;
use crate::models::edge::ReferenceEdge;
use crate::models::{Category, Issue, ValidationReport};
use crate::report::aggregate;
use crate::resolve::resolve;
use crate::rules::Vocabulary;
use crate::syntax::validate_syntax;
use rayon::prelude::*;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Full,
    /// Stop after single-document checks.
    SyntaxOnly,
    /// Assume documents are well-formed; index and resolve only.
    CrossFileOnly,
}

impl Mode {
    fn runs_syntax(self) -> bool {
        self != Mode::CrossFileOnly
    }

    fn runs_cross_file(self) -> bool {
        self != Mode::SyntaxOnly
    }
}

#[derive(Debug, Clone, Default)]
/// Checks to run over an already-loaded corpus.
pub struct Pipeline {
    pub mode: Mode,
    pub vocabulary: Vocabulary,
    /// Only report issues and counts for display paths under this prefix.
    pub scope: Option<String>,
}

#[derive(Debug, Clone)]
/// Everything `run` needs to validate a directory tree.
pub struct ValidateOptions {
    pub playbook_dir: PathBuf,
    /// File or directory (relative to `playbook_dir` or absolute) to report on.
    pub target: Option<PathBuf>,
    pub extension: String,
    pub exclude: Vec<String>,
    pub pipeline: Pipeline,
}

/// Validate the playbook directory and return the aggregated report.
///
/// The whole directory is always loaded and indexed; `target` only narrows
/// what gets reported.
pub fn run(opts: &ValidateOptions) -> ValidationReport {
    let root = &opts.playbook_dir;
    let mut pipeline = opts.pipeline.clone();

    if let Some(target) = opts.target.as_ref() {
        let abs = if target.is_absolute() {
            target.clone()
        } else {
            root.join(target)
        };
        let shown = display_path(root, &abs);
        let wrong_extension = abs.is_file()
            && abs.extension().and_then(|e| e.to_str()) != Some(opts.extension.as_str());
        if !abs.exists() || wrong_extension {
            let missing = Issue::error(
                shown.as_str(),
                Category::Load,
                "target_not_found",
                "$",
                format!("Target not found: {}", target.to_string_lossy()),
            );
            return aggregate(vec![missing], std::iter::empty());
        }
        pipeline.scope = Some(shown);
    }

    let started = Instant::now();
    let paths = loader::discover(root, &opts.extension, &opts.exclude);
    tracing::info!(files = paths.len(), root = %root.display(), "discovered documents");
    let loaded = loader::load_all(root, &paths);
    tracing::debug!(
        loaded = loaded.documents.len(),
        failed = loaded.issues.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "load phase done"
    );
    validate_loaded(loaded, &pipeline)
}

/// Validate in-memory sources given as `(display path, text)` pairs.
pub fn validate_sources(sources: &[(String, String)], pipeline: &Pipeline) -> ValidationReport {
    validate_loaded(loader::load_sources(sources), pipeline)
}

fn validate_loaded(loaded: Loaded, pipeline: &Pipeline) -> ValidationReport {
    validate_documents(loaded.documents, loaded.issues, &loaded.reserved, pipeline)
}

/// Run the configured phases over loaded documents.
///
/// `reserved` holds keys of files that failed to load; references to them
/// resolve silently since the load issue already covers the file.
pub fn validate_documents(
    documents: Vec<Document>,
    load_issues: Vec<Issue>,
    reserved: &[ReservedKey],
    pipeline: &Pipeline,
) -> ValidationReport {
    let mut documents = documents;
    documents.sort_by(|a, b| a.path.cmp(&b.path));
    let mut issues = load_issues;

    if pipeline.mode.runs_syntax() {
        let found: Vec<Vec<Issue>> = documents
            .par_iter()
            .map(|d| validate_syntax(d, &pipeline.vocabulary))
            .collect();
        issues.extend(found.into_iter().flatten());
        tracing::debug!(issues = issues.len(), "syntax phase done");
    }

    if pipeline.mode.runs_cross_file() {
        issues.extend(cross_file(&documents, reserved));
    }

    for issue in issues.iter_mut() {
        attach_line(issue, &documents);
    }

    let in_scope = |file: &str| match pipeline.scope.as_deref() {
        None | Some("") => true,
        Some(prefix) => file == prefix || file.starts_with(&format!("{}/", prefix)),
    };
    issues.retain(|i| in_scope(&i.file));
    let report = aggregate(issues, documents.iter().filter(|d| in_scope(&d.path)));
    tracing::info!(
        files = report.summary.files,
        errors = report.summary.errors,
        warnings = report.summary.warnings,
        "validation finished"
    );
    report
}

/// Phase two. The registry is complete before any edge is resolved.
fn cross_file(documents: &[Document], reserved: &[ReservedKey]) -> Vec<Issue> {
    let (registry, mut issues) = build_index(documents, reserved);

    let per_doc: Vec<(Vec<Issue>, Vec<ReferenceEdge>)> = documents
        .par_iter()
        .map(|d| (check_step_chain(d), extract_edges(d)))
        .collect();
    let mut edges: Vec<ReferenceEdge> = Vec::new();
    for (chain_issues, doc_edges) in per_doc {
        issues.extend(chain_issues);
        edges.extend(doc_edges);
    }
    tracing::debug!(edges = edges.len(), registry = registry.len(), "resolving references");
    issues.extend(resolve(&edges, &registry));
    issues
}

fn attach_line(issue: &mut Issue, documents: &[Document]) {
    if issue.line.is_some() {
        return;
    }
    let Some(key) = issue.top_level_key() else {
        return;
    };
    let Ok(pos) = documents.binary_search_by(|d| d.path.as_str().cmp(issue.file.as_str())) else {
        return;
    };
    issue.line = documents[pos].line_hints.get(key).copied();
}
