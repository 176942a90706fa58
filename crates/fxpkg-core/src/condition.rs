//! Activation conditions: the parsed form of `when=` clauses.
//!
//! A condition is a conjunction of clauses over the host package's version,
//! its variant values, and the compiler. Conditions are parsed once when a
//! recipe is compiled and evaluated many times against a [`ConditionContext`].

use std::fmt;

use fxpkg_util::errors::{FxError, FxResult};

use crate::host::Compiler;
use crate::spec::{CompilerClause, ParsedSpec, VariantClause};
use crate::variant::VariantValue;
use crate::version::{Version, VersionConstraint};

/// The facts a condition is evaluated against.
pub trait ConditionContext {
    fn version(&self) -> &Version;
    /// The value of `name`, or `None` when the variant does not exist.
    fn variant(&self, name: &str) -> Option<&VariantValue>;
    fn compiler(&self) -> Option<&Compiler>;
}

/// One clause of a condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    Version(VersionConstraint),
    Variant(VariantClause),
    Compiler(CompilerClause),
}

impl Clause {
    fn holds(&self, ctx: &dyn ConditionContext) -> bool {
        match self {
            Self::Version(constraint) => constraint.contains(ctx.version()),
            Self::Variant(VariantClause::Flag { name, enabled }) => {
                ctx.variant(name).and_then(VariantValue::as_bool) == Some(*enabled)
            }
            Self::Variant(VariantClause::Values {
                name,
                values,
                negated,
            }) => match ctx.variant(name) {
                Some(value) if *negated => values.iter().all(|v| !value.contains(v)),
                Some(value) => values.iter().all(|v| value.contains(v)),
                None => false,
            },
            Self::Compiler(clause) => ctx.compiler().is_some_and(|c| {
                c.family == clause.family
                    && (clause.versions.is_any()
                        || c.version.as_ref().is_some_and(|v| clause.versions.contains(v)))
            }),
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Version(constraint) => write!(f, "@{constraint}"),
            Self::Variant(clause) => write!(f, "{clause}"),
            Self::Compiler(clause) => write!(f, "{clause}"),
        }
    }
}

/// A conjunction of clauses. The empty condition always holds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Condition {
    clauses: Vec<Clause>,
}

impl Condition {
    pub fn always() -> Self {
        Self::default()
    }

    /// Parse a `when=` string such as `@0.9: +adios2` or `%gcc@:9.10`.
    pub fn parse(text: &str) -> FxResult<Self> {
        let parsed = ParsedSpec::parse(text)?;
        if let Some(name) = parsed.name {
            return Err(FxError::Recipe {
                message: format!("condition '{text}' cannot name a package ('{name}')"),
            });
        }
        Ok(Self::from_parsed(parsed))
    }

    /// Parse an optional `when=` string; `None` is the always-true condition.
    pub fn parse_opt(text: Option<&str>) -> FxResult<Self> {
        text.map_or_else(|| Ok(Self::always()), Self::parse)
    }

    fn from_parsed(parsed: ParsedSpec) -> Self {
        let mut clauses = Vec::new();
        if let Some(versions) = parsed.versions {
            clauses.push(Clause::Version(versions));
        }
        clauses.extend(parsed.variants.into_iter().map(Clause::Variant));
        if let Some(compiler) = parsed.compiler {
            clauses.push(Clause::Compiler(compiler));
        }
        Self { clauses }
    }

    /// Conjoin two conditions.
    pub fn and(mut self, other: Condition) -> Self {
        self.clauses.extend(other.clauses);
        self
    }

    pub fn is_always(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Names of all variants the condition refers to.
    pub fn variant_names(&self) -> impl Iterator<Item = &str> {
        self.clauses.iter().filter_map(|c| match c {
            Clause::Variant(v) => Some(v.name()),
            _ => None,
        })
    }

    pub fn evaluate(&self, ctx: &dyn ConditionContext) -> bool {
        self.clauses.iter().all(|c| c.holds(ctx))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.clauses.iter().map(|c| c.to_string()).collect();
        f.write_str(&parts.join(" "))
    }
}
