//! Compile options, loadable from YAML:
//!
//! ```yaml
//! validation-level: strict
//! minify: true
//! lang: en
//! fonts:
//!   Roboto: https://fonts.googleapis.com/css?family=Roboto
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{MjmlError, MjmlResult};

/// How the compiler treats a tree that fails validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationLevel {
    /// Refuse to compile.
    Strict,
    /// Compile anyway and log each issue.
    #[default]
    Soft,
    /// Do not validate.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CompileOptions {
    pub validation_level: ValidationLevel,
    /// Collapse whitespace between tags in the output
    pub minify: bool,
    /// `lang` of the generated `<html>` when the `mjml` root sets none
    pub lang: String,
    /// Font name → stylesheet URL, imported when a rendered `font-family` uses the font
    pub fonts: BTreeMap<String, String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            validation_level: ValidationLevel::default(),
            minify: false,
            lang: "und".to_string(),
            fonts: default_fonts(),
        }
    }
}

fn default_fonts() -> BTreeMap<String, String> {
    [
        ("Open Sans", "https://fonts.googleapis.com/css?family=Open+Sans:300,400,500,700"),
        ("Droid Sans", "https://fonts.googleapis.com/css?family=Droid+Sans:300,400,500,700"),
        ("Lato", "https://fonts.googleapis.com/css?family=Lato:300,400,500,700"),
        ("Roboto", "https://fonts.googleapis.com/css?family=Roboto:300,400,500,700"),
        ("Ubuntu", "https://fonts.googleapis.com/css?family=Ubuntu:300,400,500,700"),
    ]
    .into_iter()
    .map(|(name, url)| (name.to_string(), url.to_string()))
    .collect()
}

impl CompileOptions {
    pub fn from_yaml(yaml: &str) -> MjmlResult<Self> {
        let options: CompileOptions = serde_yaml::from_str(yaml)?;
        if options.lang.trim().is_empty() {
            return Err(MjmlError::ConfigError("lang must not be empty".to_string()));
        }
        Ok(options)
    }

    pub fn from_file(path: &Path) -> MjmlResult<Self> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| MjmlError::ConfigError(format!("read {}: {}", path.display(), e)))?;
        Self::from_yaml(&yaml)
    }
}
