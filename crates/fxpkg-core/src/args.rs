//! Build-argument rules and their rendering for the external build tool.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::condition::Condition;

/// The build tool a recipe drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildSystem {
    Cmake,
    Python,
}

impl fmt::Display for BuildSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cmake => "cmake",
            Self::Python => "python",
        })
    }
}

/// Where a build argument's value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgSource {
    /// The resolved value of a variant: identity for enums, a flag for booleans.
    Variant(String),
    /// A fixed value.
    Constant(ArgValue),
    /// `True` when the condition holds for the configuration.
    Condition(Condition),
    /// The located library files of a dependency, joined with the path separator.
    Libraries(String),
    /// A template with `{jobs}` replaced by the host's build parallelism.
    Jobs(String),
}

/// One declared build-argument rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArgRule {
    pub key: String,
    pub source: ArgSource,
}

/// A build-argument value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    Bool(bool),
    Str(String),
    List(Vec<String>),
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => f.write_str(&items.join(";")),
        }
    }
}

/// A build argument emitted for one configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildArg {
    pub key: String,
    pub value: ArgValue,
}

impl BuildArg {
    pub fn new(key: &str, value: ArgValue) -> Self {
        Self {
            key: key.to_string(),
            value,
        }
    }
}

/// Canonical `KEY=value` form, with booleans as `True`/`False`.
impl fmt::Display for BuildArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

impl BuildSystem {
    /// Render one argument the way the build tool expects it on its command line.
    pub fn render(&self, arg: &BuildArg) -> String {
        match self {
            Self::Cmake => match &arg.value {
                ArgValue::Bool(b) => {
                    format!("-D{}:BOOL={}", arg.key, if *b { "ON" } else { "OFF" })
                }
                ArgValue::Str(s) => format!("-D{}:STRING={s}", arg.key),
                ArgValue::List(items) => format!("-D{}:STRING={}", arg.key, items.join(";")),
            },
            Self::Python => {
                let value = match &arg.value {
                    ArgValue::Bool(b) => b.to_string(),
                    ArgValue::Str(s) => s.clone(),
                    ArgValue::List(items) => items.join(","),
                };
                format!("--config-settings={}={value}", arg.key)
            }
        }
    }

    pub fn render_all(&self, args: &[BuildArg]) -> Vec<String> {
        args.iter().map(|a| self.render(a)).collect()
    }
}
