use std::path::Path;

use serde::{Deserialize, Serialize};

/// Source language of a file, detected from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Apex,
    JavaScript,
    TypeScript,
    Python,
    Shell,
    Java,
    Html,
    Xml,
    Json,
    Yaml,
    Unknown,
}

impl Language {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "cls" | "trigger" => Self::Apex,
            "js" | "jsx" | "mjs" | "cjs" => Self::JavaScript,
            "ts" | "tsx" => Self::TypeScript,
            "py" => Self::Python,
            "sh" | "bash" | "zsh" => Self::Shell,
            "java" => Self::Java,
            "html" | "htm" => Self::Html,
            "xml" => Self::Xml,
            "json" => Self::Json,
            "yml" | "yaml" => Self::Yaml,
            _ => Self::Unknown,
        }
    }

    pub fn from_path(path: &str) -> Self {
        Path::new(path)
            .extension()
            .map(|e| Self::from_extension(&e.to_string_lossy()))
            .unwrap_or(Self::Unknown)
    }

    /// Name used in rule `languages` lists.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Apex => "apex",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Python => "python",
            Self::Shell => "shell",
            Self::Java => "java",
            Self::Html => "html",
            Self::Xml => "xml",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
