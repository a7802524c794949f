#![warn(missing_docs)]
//! `renpy-lang` - data-driven language configuration for Ren'Py tooling.
//!
//! This crate stays lightweight and does **not** depend on the parser. It describes which
//! files belong to the language, how comments and indentation look, and where custom
//! query files live. Configs can be built in code or loaded from YAML:
//!
//! ```
//! use renpy_lang::LanguageConfig;
//!
//! let config = LanguageConfig::from_yaml_str("file_types: [rpy]\nindent_unit: \"\\t\"\n").unwrap();
//! assert_eq!(config.name, "renpy");
//! assert!(config.matches_path("game/script.rpy"));
//! assert!(!config.matches_path("game/screens.rpym"));
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced while loading a [`LanguageConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    /// YAML parsing failed.
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    /// Filesystem I/O failed.
    Io(#[from] std::io::Error),

    #[error("invalid indent unit {0:?}: expected spaces or a single tab")]
    /// `indent_unit` was empty or mixed tabs and spaces.
    InvalidIndentUnit(String),
}

/// Comment tokens for a given language.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentConfig {
    /// Line comment token (e.g. `#`).
    pub line: Option<String>,
    /// Block comment start token.
    pub block_start: Option<String>,
    /// Block comment end token.
    pub block_end: Option<String>,
}

impl CommentConfig {
    /// Create a config that supports only line comments.
    pub fn line(token: impl Into<String>) -> Self {
        Self {
            line: Some(token.into()),
            block_start: None,
            block_end: None,
        }
    }
}

fn default_name() -> String {
    "renpy".to_string()
}

fn default_scope() -> String {
    "source.renpy".to_string()
}

fn default_file_types() -> Vec<String> {
    vec!["rpy".to_string(), "rpym".to_string()]
}

fn default_comment() -> CommentConfig {
    CommentConfig::line("#")
}

fn default_indent_unit() -> String {
    "    ".to_string()
}

/// Language-level configuration: identity, file association, comments, indentation and
/// optional query overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Language name.
    #[serde(default = "default_name")]
    pub name: String,
    /// TextMate-style root scope.
    #[serde(default = "default_scope")]
    pub scope: String,
    /// File extensions (without the dot) handled by this language.
    #[serde(default = "default_file_types")]
    pub file_types: Vec<String>,
    /// Comment tokens.
    #[serde(default = "default_comment")]
    pub comment: CommentConfig,
    /// One level of indentation.
    #[serde(default = "default_indent_unit")]
    pub indent_unit: String,
    /// Path to a highlights query that replaces the bundled one.
    #[serde(default)]
    pub highlights: Option<PathBuf>,
    /// Path to a folds query that replaces the bundled one.
    #[serde(default)]
    pub folds: Option<PathBuf>,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            scope: default_scope(),
            file_types: default_file_types(),
            comment: default_comment(),
            indent_unit: default_indent_unit(),
            highlights: None,
            folds: None,
        }
    }
}

impl LanguageConfig {
    /// Parse a config from YAML. Missing keys take the Ren'Py defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not an empty mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file. Relative query paths are resolved against the file's directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml_str(&yaml)?;
        if let Some(base) = path.parent() {
            config.highlights = config.highlights.map(|p| resolve(base, p));
            config.folds = config.folds.map(|p| resolve(base, p));
        }
        Ok(config)
    }

    /// Returns `true` if `path`'s extension is one of [`Self::file_types`].
    pub fn matches_path(&self, path: impl AsRef<Path>) -> bool {
        let Some(ext) = path.as_ref().extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.file_types.iter().any(|ft| ft.eq_ignore_ascii_case(ext))
    }

    /// Read the highlights override, if one is configured.
    pub fn read_highlights(&self) -> Result<Option<String>, ConfigError> {
        read_optional(self.highlights.as_deref())
    }

    /// Read the folds override, if one is configured.
    pub fn read_folds(&self) -> Result<Option<String>, ConfigError> {
        read_optional(self.folds.as_deref())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let unit = self.indent_unit.as_str();
        let ok = unit == "\t" || (!unit.is_empty() && unit.bytes().all(|b| b == b' '));
        if ok {
            Ok(())
        } else {
            Err(ConfigError::InvalidIndentUnit(self.indent_unit.clone()))
        }
    }
}

fn resolve(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

fn read_optional(path: Option<&Path>) -> Result<Option<String>, ConfigError> {
    path.map(std::fs::read_to_string).transpose().map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LanguageConfig::default();
        assert_eq!(config.scope, "source.renpy");
        assert_eq!(config.file_types, ["rpy", "rpym"]);
        assert_eq!(config.comment.line.as_deref(), Some("#"));
        assert_eq!(config.comment.block_start, None);
        assert_eq!(config.indent_unit, "    ");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(LanguageConfig::from_yaml_str("").unwrap(), LanguageConfig::default());
        assert_eq!(
            LanguageConfig::from_yaml_str("name: renpy\n").unwrap(),
            LanguageConfig::default()
        );
    }

    #[test]
    fn test_yaml_overrides() {
        let yaml = "\
name: renpy-screens
file_types: [rpy]
comment:
  line: \"##\"
indent_unit: \"  \"
highlights: queries/custom.scm
";
        let config = LanguageConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.name, "renpy-screens");
        assert_eq!(config.scope, "source.renpy");
        assert_eq!(config.comment, CommentConfig::line("##"));
        assert_eq!(config.indent_unit, "  ");
        assert_eq!(config.highlights, Some(PathBuf::from("queries/custom.scm")));
        assert_eq!(config.folds, None);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            LanguageConfig::from_yaml_str("indent_unit: \" \\t\"\n"),
            Err(ConfigError::InvalidIndentUnit(_))
        ));
        assert!(matches!(
            LanguageConfig::from_yaml_str("file_types: 3\n"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_matches_path() {
        let config = LanguageConfig::default();
        assert!(config.matches_path("game/script.rpy"));
        assert!(config.matches_path("lib/effects.RPYM"));
        assert!(!config.matches_path("game/script.rpyc"));
        assert!(!config.matches_path("Makefile"));
    }

    #[test]
    fn test_from_path_resolves_queries() {
        let dir = std::env::temp_dir().join(format!("renpy-lang-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("folds.scm"), "(header) @fold\n").unwrap();
        std::fs::write(dir.join("renpy.yaml"), "folds: folds.scm\n").unwrap();

        let config = LanguageConfig::from_path(dir.join("renpy.yaml")).unwrap();
        assert_eq!(config.folds, Some(dir.join("folds.scm")));
        assert_eq!(config.read_folds().unwrap().as_deref(), Some("(header) @fold\n"));
        assert_eq!(config.read_highlights().unwrap(), None);

        assert!(matches!(
            LanguageConfig::from_path(dir.join("missing.yaml")),
            Err(ConfigError::Io(_))
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
