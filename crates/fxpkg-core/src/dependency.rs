use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use fxpkg_util::errors::{FxError, FxResult};

use crate::condition::Condition;
use crate::spec::{ParsedSpec, VariantClause};
use crate::variant::VariantValue;
use crate::version::VersionConstraint;

/// When a dependency is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageType {
    Build,
    Link,
    Run,
    Test,
}

impl fmt::Display for UsageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Build => "build",
            Self::Link => "link",
            Self::Run => "run",
            Self::Test => "test",
        })
    }
}

/// The usage set of an edge that does not declare one.
pub fn default_usage() -> BTreeSet<UsageType> {
    BTreeSet::from([UsageType::Build, UsageType::Link])
}

/// A requirement a dependency spec places on one of the dependency's variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum VariantRequirement {
    /// `+name` / `~name`.
    Flag(bool),
    /// `name=a,b` (all of `include`) and `name=~c` (none of `exclude`).
    Values {
        include: BTreeSet<String>,
        exclude: BTreeSet<String>,
    },
}

impl VariantRequirement {
    /// Whether an installed value meets this requirement.
    pub fn satisfied_by(&self, value: &VariantValue) -> bool {
        match self {
            Self::Flag(enabled) => value.as_bool() == Some(*enabled),
            Self::Values { include, exclude } => {
                include.iter().all(|v| value.contains(v)) && !exclude.iter().any(|v| value.contains(v))
            }
        }
    }

    /// Conjoin two requirements on the same variant.
    ///
    /// Returns a description of the clash when no value can meet both.
    pub fn conjoin(&self, other: &VariantRequirement) -> Result<VariantRequirement, String> {
        match (self, other) {
            (Self::Flag(a), Self::Flag(b)) if a == b => Ok(Self::Flag(*a)),
            (Self::Flag(_), Self::Flag(_)) => Err("required both enabled and disabled".to_string()),
            (
                Self::Values { include, exclude },
                Self::Values {
                    include: other_include,
                    exclude: other_exclude,
                },
            ) => {
                if let (Some(a), Some(b)) = (single(include), single(other_include)) {
                    if a != b {
                        return Err(format!("required to be both '{a}' and '{b}'"));
                    }
                }
                let include: BTreeSet<String> = include.union(other_include).cloned().collect();
                let exclude: BTreeSet<String> = exclude.union(other_exclude).cloned().collect();
                if let Some(clash) = include.intersection(&exclude).next() {
                    return Err(format!("value '{clash}' both required and excluded"));
                }
                Ok(Self::Values { include, exclude })
            }
            _ => Err("required both as a flag and as a value".to_string()),
        }
    }

    fn fragment(&self, name: &str) -> String {
        match self {
            Self::Flag(true) => format!("+{name}"),
            Self::Flag(false) => format!("~{name}"),
            Self::Values { include, exclude } => {
                let mut parts = Vec::new();
                if !include.is_empty() {
                    let values: Vec<&str> = include.iter().map(String::as_str).collect();
                    parts.push(format!("{name}={}", values.join(",")));
                }
                if !exclude.is_empty() {
                    let values: Vec<&str> = exclude.iter().map(String::as_str).collect();
                    parts.push(format!("{name}=~{}", values.join(",")));
                }
                parts.join(" ")
            }
        }
    }
}

/// The sole value of a one-value include set.
///
/// Two different single values (`api=v110`, `api=v112`) cannot both hold;
/// several values of a multi-choice variant are required in one clause.
fn single(include: &BTreeSet<String>) -> Option<&String> {
    if include.len() == 1 {
        include.first()
    } else {
        None
    }
}

/// A constraint on another package: `boost@1.70:+timer`, `scotch+mpi`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    pub name: String,
    pub versions: VersionConstraint,
    pub variants: BTreeMap<String, VariantRequirement>,
}

impl DependencySpec {
    /// A spec that only names the dependency.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            versions: VersionConstraint::any(),
            variants: BTreeMap::new(),
        }
    }

    pub fn parse(text: &str) -> FxResult<Self> {
        let parsed = ParsedSpec::parse(text)?;
        let recipe_err = |message: String| FxError::Recipe { message };

        let name = parsed
            .name
            .ok_or_else(|| recipe_err(format!("dependency spec '{text}' has no package name")))?;
        if parsed.compiler.is_some() {
            return Err(recipe_err(format!(
                "dependency spec '{text}' cannot carry a compiler clause"
            )));
        }

        let mut variants: BTreeMap<String, VariantRequirement> = BTreeMap::new();
        for clause in parsed.variants {
            let (variant, requirement) = match clause {
                VariantClause::Flag { name, enabled } => (name, VariantRequirement::Flag(enabled)),
                VariantClause::Values {
                    name,
                    values,
                    negated,
                } => {
                    let set: BTreeSet<String> = values.into_iter().collect();
                    let (include, exclude) = if negated {
                        (BTreeSet::new(), set)
                    } else {
                        (set, BTreeSet::new())
                    };
                    (name, VariantRequirement::Values { include, exclude })
                }
            };
            let merged = match variants.get(&variant) {
                Some(existing) => existing
                    .conjoin(&requirement)
                    .map_err(|clash| recipe_err(format!("'{text}': variant '{variant}' {clash}")))?,
                None => requirement,
            };
            variants.insert(variant, merged);
        }

        Ok(Self {
            name,
            versions: parsed.versions.unwrap_or_else(VersionConstraint::any),
            variants,
        })
    }
}

impl fmt::Display for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.versions.is_any() {
            write!(f, "@{}", self.versions)?;
        }
        // flags attach to the name; a value clause runs to the next space
        let (flags, values): (Vec<_>, Vec<_>) = self
            .variants
            .iter()
            .partition(|(_, r)| matches!(r, VariantRequirement::Flag(_)));
        for (name, requirement) in flags {
            write!(f, "{}", requirement.fragment(name))?;
        }
        for (name, requirement) in values {
            write!(f, " {}", requirement.fragment(name))?;
        }
        Ok(())
    }
}

impl Serialize for DependencySpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A conditional dependency edge declared by a recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDecl {
    pub spec: DependencySpec,
    pub usage: BTreeSet<UsageType>,
    pub when: Condition,
}
