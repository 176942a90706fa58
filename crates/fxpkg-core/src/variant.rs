use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::condition::Condition;

/// A configuration axis declared by a recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantDecl {
    pub name: String,
    pub description: String,
    pub kind: VariantKind,
    /// The variant only exists for configurations matching this condition.
    pub when: Condition,
}

/// The value domain of a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantKind {
    Bool {
        default: bool,
    },
    Single {
        values: Vec<String>,
        default: String,
    },
    Multi {
        values: Vec<String>,
        default: BTreeSet<String>,
    },
}

/// The resolved value of one variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum VariantValue {
    Bool(bool),
    Single(String),
    Multi(BTreeSet<String>),
}

/// A value supplied by a request before it is checked against the declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestedValue {
    Flag(bool),
    Values(Vec<String>),
}

impl VariantValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Whether `value` is the selected value (single) or one of them (multi).
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Self::Bool(b) => parse_bool(value) == Some(*b),
            Self::Single(v) => v == value,
            Self::Multi(set) => set.contains(value),
        }
    }

    /// The spec fragment selecting this value, e.g. `+petsc` or `build_type=Release`.
    pub fn fragment(&self, name: &str) -> String {
        match self {
            Self::Bool(true) => format!("+{name}"),
            Self::Bool(false) => format!("~{name}"),
            other => format!("{name}={other}"),
        }
    }
}

impl fmt::Display for VariantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Single(v) => f.write_str(v),
            Self::Multi(set) => {
                let values: Vec<&str> = set.iter().map(String::as_str).collect();
                f.write_str(&values.join(","))
            }
        }
    }
}

/// Parse the textual booleans a recipe or request may use.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" => Some(true),
        "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

impl VariantDecl {
    pub fn default_value(&self) -> VariantValue {
        match &self.kind {
            VariantKind::Bool { default } => VariantValue::Bool(*default),
            VariantKind::Single { default, .. } => VariantValue::Single(default.clone()),
            VariantKind::Multi { default, .. } => VariantValue::Multi(default.clone()),
        }
    }

    /// Human-readable list of the values this variant accepts.
    pub fn allowed(&self) -> String {
        match &self.kind {
            VariantKind::Bool { .. } => "True, False".to_string(),
            VariantKind::Single { values, .. } => values.join(", "),
            VariantKind::Multi { values, .. } => format!("any of {}", values.join(", ")),
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(self.kind, VariantKind::Multi { .. })
    }

    /// Check a requested value against the declared value set.
    ///
    /// On failure returns the offending value as written.
    pub fn accept(&self, requested: &RequestedValue) -> Result<VariantValue, String> {
        match (&self.kind, requested) {
            (VariantKind::Bool { .. }, RequestedValue::Flag(b)) => Ok(VariantValue::Bool(*b)),
            (VariantKind::Bool { .. }, RequestedValue::Values(values)) => match values.as_slice() {
                [single] => parse_bool(single)
                    .map(VariantValue::Bool)
                    .ok_or_else(|| single.clone()),
                _ => Err(values.join(",")),
            },
            (VariantKind::Single { .. }, RequestedValue::Flag(b)) => Err(b.to_string()),
            (VariantKind::Single { values, .. }, RequestedValue::Values(requested)) => {
                match requested.as_slice() {
                    [single] if values.contains(single) => Ok(VariantValue::Single(single.clone())),
                    _ => Err(requested.join(",")),
                }
            }
            (VariantKind::Multi { .. }, RequestedValue::Flag(b)) => Err(b.to_string()),
            (VariantKind::Multi { values, .. }, RequestedValue::Values(requested)) => {
                if let Some(bad) = requested.iter().find(|r| !values.contains(r)) {
                    return Err(bad.clone());
                }
                Ok(VariantValue::Multi(requested.iter().cloned().collect()))
            }
        }
    }
}
