//! Placeholder scanning for `{{identifier(.identifier)*}}` templates.
//!
//! Only the restricted grammar is accepted: a dot-separated chain of
//! identifiers with optional surrounding whitespace. Anything else between
//! the braces, or an unterminated `{{`, is malformed. Placeholders are never
//! evaluated; `{{env.X}}` is just another chain.

use regex::Regex;
use serde_json::Value as Json;
use std::sync::OnceLock;

fn chain_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)\s*$").unwrap()
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub segments: Vec<String>,
}

impl Placeholder {
    pub fn root(&self) -> &str {
        &self.segments[0]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Raw text of the first malformed placeholder found.
pub struct Malformed(pub String);

/// Extract every placeholder from `s`, failing on the first malformed one.
pub fn placeholders(s: &str) -> Result<Vec<Placeholder>, Malformed> {
    let mut out = Vec::new();
    let mut rest = s;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            return Err(Malformed(rest[start..].to_string()));
        };
        let inner = &after[..end];
        let caps = chain_re()
            .captures(inner)
            .ok_or_else(|| Malformed(format!("{{{{{}}}}}", inner)))?;
        out.push(Placeholder {
            segments: caps[1].split('.').map(str::to_string).collect(),
        });
        rest = &after[end + 2..];
    }
    Ok(out)
}

/// Visit every string inside `value`, passing a `$`-style locator.
pub fn walk_strings<'a>(value: &'a Json, path: &str, f: &mut dyn FnMut(&str, &'a str)) {
    match value {
        Json::String(s) => f(path, s),
        Json::Array(items) => {
            for (i, it) in items.iter().enumerate() {
                walk_strings(it, &format!("{}[{}]", path, i), f);
            }
        }
        Json::Object(map) => {
            for (k, v) in map {
                walk_strings(v, &format!("{}.{}", path, k), f);
            }
        }
        _ => {}
    }
}
