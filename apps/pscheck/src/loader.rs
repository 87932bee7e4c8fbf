//! Document discovery and loading.
//!
//! Files are discovered with `glob`, read and parsed in parallel with
//! `rayon`, and returned in display-path order. A file that fails to load
//! becomes a single load issue and never reaches the index. Its identity is
//! still recovered from the raw text when possible, so references to it are
//! not reported as dangling.

use crate::error::LoadError;
use crate::models::document::{Document, DocumentKind};
use crate::models::Issue;
use glob::{glob, Pattern};
use rayon::prelude::*;
use regex::Regex;
use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// `(kind, registry key)` recovered from a file that failed to load.
pub type ReservedKey = (DocumentKind, String);

/// Output of the load phase.
#[derive(Default)]
pub struct Loaded {
    pub documents: Vec<Document>,
    pub issues: Vec<Issue>,
    /// Keys claimed by broken files, sorted.
    pub reserved: Vec<ReservedKey>,
}

struct Attempt {
    path: String,
    result: Result<Document, LoadError>,
    reserved: Option<ReservedKey>,
}

impl Attempt {
    fn parse(path: String, text: &str) -> Self {
        let result = parse_document(&path, text);
        let reserved = match result {
            Ok(_) => None,
            Err(_) => guess_identity(&path, text),
        };
        Attempt {
            path,
            result,
            reserved,
        }
    }
}

/// Path shown in issues: relative to `root`, always `/`-separated.
pub fn display_path(root: &Path, path: &Path) -> String {
    let rel = pathdiff::diff_paths(path, root).unwrap_or_else(|| path.to_path_buf());
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Find `**/*.<extension>` under `root`, dropping anything matching an
/// exclude glob (matched against the display path). Sorted by display path.
pub fn discover(root: &Path, extension: &str, exclude: &[String]) -> Vec<PathBuf> {
    let excludes: Vec<Pattern> = exclude
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pat) => Some(pat),
            Err(e) => {
                tracing::warn!(pattern = %p, error = %e, "ignoring invalid exclude pattern");
                None
            }
        })
        .collect();
    let pattern = root.join("**").join(format!("*.{}", extension));
    let mut found: Vec<(String, PathBuf)> = match glob(&pattern.to_string_lossy()) {
        Ok(paths) => paths
            .flatten()
            .filter(|p| p.is_file())
            .map(|p| (display_path(root, &p), p))
            .filter(|(shown, _)| !excludes.iter().any(|pat| pat.matches(shown)))
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "bad discovery pattern");
            Vec::new()
        }
    };
    found.sort_by(|a, b| a.0.cmp(&b.0));
    found.dedup_by(|a, b| a.0 == b.0);
    found.into_iter().map(|(_, p)| p).collect()
}

/// Parse one document from raw text.
pub fn parse_document(path: &str, text: &str) -> Result<Document, LoadError> {
    let value: Json = serde_yaml::from_str(text)?;
    let Json::Object(fields) = value else {
        return Err(LoadError::NotAMapping);
    };
    let kind = match fields.get("type") {
        None | Some(Json::Null) => return Err(LoadError::MissingType),
        Some(Json::String(s)) => s
            .parse::<DocumentKind>()
            .map_err(|_| LoadError::UnknownType(s.clone()))?,
        Some(other) => return Err(LoadError::UnknownType(other.to_string())),
    };
    Ok(Document::new(path, kind, fields).with_line_hints(line_hints(text)))
}

/// Load every path in parallel. Output order follows `paths`.
pub fn load_all(root: &Path, paths: &[PathBuf]) -> Loaded {
    let attempts: Vec<Attempt> = paths
        .par_iter()
        .map(|p| {
            let path = display_path(root, p);
            match fs::read_to_string(p) {
                Ok(text) => Attempt::parse(path, &text),
                Err(e) => Attempt {
                    path,
                    result: Err(e.into()),
                    reserved: None,
                },
            }
        })
        .collect();
    collect(attempts)
}

/// Load in-memory sources, `(display path, text)`, in parallel.
pub fn load_sources(sources: &[(String, String)]) -> Loaded {
    let attempts: Vec<Attempt> = sources
        .par_iter()
        .map(|(path, text)| Attempt::parse(path.clone(), text))
        .collect();
    collect(attempts)
}

fn collect(attempts: Vec<Attempt>) -> Loaded {
    let mut out = Loaded::default();
    for at in attempts {
        match at.result {
            Ok(doc) => out.documents.push(doc),
            Err(e) => {
                tracing::debug!(file = %at.path, error = %e, reserved = ?at.reserved, "load failed");
                out.issues.push(e.into_issue(&at.path));
                out.reserved.extend(at.reserved);
            }
        }
    }
    out.documents.sort_by(|a, b| a.path.cmp(&b.path));
    out.reserved.sort();
    out.reserved.dedup();
    out
}

/// Best-effort identity of unparsable text: unindented scalar `type`,
/// `name`, `object` and `target_object` lines, keyed like a loaded document.
fn guess_identity(path: &str, text: &str) -> Option<ReservedKey> {
    let mut fields = serde_json::Map::new();
    for line in text.lines() {
        let Some(caps) = top_key_re().captures(line) else {
            continue;
        };
        let key = &caps[1];
        if !matches!(key, "type" | "name" | "object" | "target_object") || fields.contains_key(key) {
            continue;
        }
        let value = line[caps[0].len()..]
            .split(" #")
            .next()
            .unwrap_or("")
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'');
        // Flow collections and block scalars are not identities.
        if !value.is_empty() && !value.starts_with(['[', '{', '|', '>']) {
            fields.insert(key.to_string(), Json::String(value.to_string()));
        }
    }
    let kind = fields.get("type")?.as_str()?.parse::<DocumentKind>().ok()?;
    let key = Document::new(path, kind, fields).registry_key()?;
    Some((kind, key))
}

fn top_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^["']?([A-Za-z_][A-Za-z0-9_.\-]*)["']?\s*:"#).unwrap())
}

/// First line of each unindented `key:` in the source text.
fn line_hints(text: &str) -> BTreeMap<String, usize> {
    let mut hints = BTreeMap::new();
    for (i, line) in text.lines().enumerate() {
        if let Some(caps) = top_key_re().captures(line) {
            hints.entry(caps[1].to_string()).or_insert(i + 1);
        }
    }
    hints
}
