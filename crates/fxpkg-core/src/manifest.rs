use serde::{Deserialize, Serialize};
use std::path::Path;

use fxpkg_util::errors::{FxError, FxResult};

use crate::args::BuildSystem;

/// The parsed, not yet validated, representation of a recipe TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeFile {
    pub package: PackageSection,

    #[serde(default, rename = "version")]
    pub versions: Vec<VersionEntry>,

    #[serde(default, rename = "variant")]
    pub variants: Vec<VariantEntry>,

    #[serde(default)]
    pub depends: Vec<DependsEntry>,

    #[serde(default, rename = "conflict")]
    pub conflicts: Vec<ConflictEntry>,

    #[serde(default, rename = "patch")]
    pub patches: Vec<PatchEntry>,

    #[serde(default, rename = "arg")]
    pub args: Vec<ArgEntry>,
}

/// Package identity and metadata from the `[package]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSection {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    /// Archive URL template; `{version}` is replaced by the selected version.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub git: Option<String>,
    #[serde(default)]
    pub maintainers: Vec<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(rename = "build-system")]
    pub build_system: BuildSystem,
    /// Sub-directory of the source tree the build tool runs in.
    #[serde(default, rename = "build-directory")]
    pub build_directory: Option<String>,
}

/// One `[[version]]` entry: either an archive checksum or a branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default, rename = "no-cache")]
    pub no_cache: bool,
    #[serde(default)]
    pub deprecated: bool,
    /// Overrides the package URL template for this version.
    #[serde(default)]
    pub url: Option<String>,
}

/// A variant default: a boolean, one value, or a set of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariantDefault {
    Bool(bool),
    One(String),
    Many(Vec<String>),
}

/// One `[[variant]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub default: VariantDefault,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub multi: bool,
    #[serde(default)]
    pub when: Option<String>,
}

/// A usage type list written either as `"build"` or `["build", "run"]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UsageList {
    One(String),
    Many(Vec<String>),
}

impl UsageList {
    pub fn items(&self) -> Vec<&str> {
        match self {
            Self::One(s) => vec![s.as_str()],
            Self::Many(v) => v.iter().map(String::as_str).collect(),
        }
    }
}

/// One `[[depends]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependsEntry {
    pub spec: String,
    #[serde(default)]
    pub when: Option<String>,
    #[serde(default, rename = "type")]
    pub usage: Option<UsageList>,
}

/// One `[[conflict]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictEntry {
    pub spec: String,
    #[serde(default)]
    pub when: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
}

/// One `[[patch]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchEntry {
    pub file: String,
    #[serde(default)]
    pub when: Option<String>,
}

/// A constant argument value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstValue {
    Bool(bool),
    Str(String),
}

/// One `[[arg]]` entry. Exactly one of the source fields must be set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgEntry {
    pub key: String,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub value: Option<ConstValue>,
    #[serde(default)]
    pub when: Option<String>,
    #[serde(default)]
    pub libs: Option<String>,
    #[serde(default)]
    pub jobs: Option<String>,
}

impl RecipeFile {
    /// Load and parse a recipe file from the given path.
    pub fn from_path(path: &Path) -> FxResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| FxError::Recipe {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::parse_toml(&content).map_err(|e| match e {
            FxError::Recipe { message } => FxError::Recipe {
                message: format!("{}: {message}", path.display()),
            },
            other => other,
        })
    }

    /// Parse a recipe from a TOML string.
    pub fn parse_toml(content: &str) -> FxResult<Self> {
        toml::from_str(content).map_err(|e| FxError::Recipe {
            message: format!("Failed to parse recipe: {e}"),
        })
    }
}
