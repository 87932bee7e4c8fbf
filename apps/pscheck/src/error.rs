//! Loader failures. Each maps onto exactly one load-category issue.

use crate::models::{Category, Issue};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Error reading file: {0}")]
    Read(#[from] std::io::Error),
    #[error("YAML syntax error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("File must contain a YAML object")]
    NotAMapping,
    #[error("Missing required 'type' field")]
    MissingType,
    #[error("Unknown type: {0}")]
    UnknownType(String),
}

impl LoadError {
    pub fn rule(&self) -> &'static str {
        match self {
            LoadError::Read(_) => "file_error",
            LoadError::Yaml(_) => "yaml_syntax",
            LoadError::NotAMapping => "invalid_format",
            LoadError::MissingType => "missing_type",
            LoadError::UnknownType(_) => "unknown_type",
        }
    }

    pub fn into_issue(self, file: &str) -> Issue {
        let path = match &self {
            LoadError::MissingType | LoadError::UnknownType(_) => "$.type",
            _ => "$",
        };
        Issue::error(file, Category::Load, self.rule(), path, self.to_string())
    }
}
