//! Configuration discovery and effective settings resolution.
//!
//! pscheck reads `pscheck.toml|yaml|yml` from the repository root (or closest
//! ancestor) and merges it with CLI flags to produce an `Effective` config.
//! Defaults:
//! - `root`: the repository root itself
//! - `output`: `human`
//! - `extension`: `ps`
//! - `exclude`: none
//! - `types.field|component`: no extra vocabulary
//!
//! Overrides precedence: CLI > config file > defaults.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize, Clone)]
/// Extra vocabulary accepted without warnings, under `[types]`.
pub struct TypesCfg {
    #[serde(default)]
    pub field: Vec<String>,
    #[serde(default)]
    pub component: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `pscheck.toml|yaml`.
pub struct PscheckConfig {
    /// Playbook directory, relative to the repository root.
    pub root: Option<String>,
    pub output: Option<String>,
    pub extension: Option<String>,
    #[serde(default)]
    pub exclude: Option<Vec<String>>, // glob patterns on display paths
    #[serde(default)]
    pub types: Option<TypesCfg>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub playbook_dir: PathBuf,
    pub output: String,
    pub extension: String,
    pub exclude: Vec<String>,
    pub extra_field_types: Vec<String>,
    pub extra_component_types: Vec<String>,
    pub config_found: bool,
}

const CONFIG_NAMES: [&str; 3] = ["pscheck.toml", "pscheck.yaml", "pscheck.yml"];

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `pscheck.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_NAMES.iter().any(|n| cur.join(n).exists()) {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `PscheckConfig` from `pscheck.toml` or `pscheck.yaml|yml` if present.
///
/// A config that exists but does not parse is logged and treated as absent.
pub fn load_config(root: &Path) -> Option<PscheckConfig> {
    let toml_path = root.join("pscheck.toml");
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path).ok()?;
        return match toml::from_str::<PscheckConfig>(&s) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                tracing::warn!(path = %toml_path.display(), error = %e, "ignoring invalid config");
                None
            }
        };
    }
    for yml in ["pscheck.yaml", "pscheck.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).ok()?;
            return match serde_yaml::from_str::<PscheckConfig>(&s) {
                Ok(cfg) => Some(cfg),
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "ignoring invalid config");
                    None
                }
            };
        }
    }
    None
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(
    cli_repo_root: Option<&str>,
    cli_playbook_dir: Option<&str>,
    cli_output: Option<&str>,
) -> Effective {
    let start = PathBuf::from(cli_repo_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let loaded = load_config(&repo_root);
    let config_found = loaded.is_some();
    let cfg = loaded.unwrap_or_default();

    // A CLI playbook dir is taken as given; a configured one is relative to the repo root.
    let playbook_dir = match cli_playbook_dir {
        Some(dir) => PathBuf::from(dir),
        None => cfg
            .root
            .as_ref()
            .map(|r| repo_root.join(r))
            .unwrap_or_else(|| repo_root.clone()),
    };

    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    let extension = cfg
        .extension
        .map(|e| e.trim_start_matches('.').to_string())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| "ps".to_string());

    let types = cfg.types.unwrap_or_default();

    Effective {
        repo_root,
        playbook_dir,
        output,
        extension,
        exclude: cfg.exclude.unwrap_or_default(),
        extra_field_types: types.field,
        extra_component_types: types.component,
        config_found,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("pscheck.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
root = "playbook"
output = "json"
exclude = ["drafts/**"]
[types]
field = ["geo_point"]
    "#
        )
        .unwrap();

        // Resolve using explicit repo_root to avoid global CWD races
        let eff = resolve_effective(root.to_str(), None, None);
        assert!(eff.config_found);
        assert_eq!(eff.playbook_dir, root.join("playbook"));
        assert_eq!(eff.output, "json");
        assert_eq!(eff.exclude, vec!["drafts/**".to_string()]);
        assert_eq!(eff.extra_field_types, vec!["geo_point".to_string()]);
        assert_eq!(eff.extension, "ps");
    }

    #[test]
    fn test_load_yaml_and_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("pscheck.yaml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
extension: .play
types:
  component: [kanban]
            "#
        )
        .unwrap();

        let eff = resolve_effective(root.to_str(), None, None);
        assert_eq!(eff.extension, "play");
        assert_eq!(eff.output, "human");
        assert_eq!(eff.playbook_dir, root.to_path_buf());
        assert_eq!(eff.extra_component_types, vec!["kanban".to_string()]);
        assert!(eff.extra_field_types.is_empty());
    }

    #[test]
    fn test_cli_precedence_over_config() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("pscheck.toml"), "output = \"json\"\nroot = \"pb\"\n").unwrap();

        let eff = resolve_effective(root.to_str(), Some("/elsewhere"), Some("human"));
        assert_eq!(eff.output, "human");
        assert_eq!(eff.playbook_dir, PathBuf::from("/elsewhere"));
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("pscheck.toml"), "output = [").unwrap();
        let eff = resolve_effective(root.to_str(), None, None);
        assert!(!eff.config_found);
        assert_eq!(eff.output, "human");
    }

    #[test]
    fn test_detect_repo_root_walks_up_to_git() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("a/b")).unwrap();
        assert_eq!(detect_repo_root(&root.join("a/b")), root.to_path_buf());
    }
}
