//! What a caller asks the resolver for.

use std::fmt;

use fxpkg_util::errors::{FxError, FxResult};

use crate::host::Compiler;
use crate::spec::{ParsedSpec, VariantClause};
use crate::variant::RequestedValue;
use crate::version::{Version, VersionConstraint, VersionRange};

/// A package request: `fenics-dolfinx@0.9.0 +petsc partitioners=parmetis %gcc@13.2`.
///
/// The version may be an exact version, a range (the best declared version
/// inside it is chosen), or absent (the preferred version is chosen).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub name: String,
    pub versions: Option<VersionConstraint>,
    pub variants: Vec<(String, RequestedValue)>,
    /// Overrides the host compiler for this request.
    pub compiler: Option<Compiler>,
}

impl Request {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            versions: None,
            variants: Vec::new(),
            compiler: None,
        }
    }

    pub fn version(mut self, version: Version) -> Self {
        self.versions = Some(VersionConstraint::from_range(VersionRange::exact(version)));
        self
    }

    pub fn versions(mut self, versions: VersionConstraint) -> Self {
        self.versions = Some(versions);
        self
    }

    pub fn flag(mut self, name: &str, enabled: bool) -> Self {
        self.variants
            .push((name.to_string(), RequestedValue::Flag(enabled)));
        self
    }

    pub fn value(mut self, name: &str, values: &[&str]) -> Self {
        self.variants.push((
            name.to_string(),
            RequestedValue::Values(values.iter().map(|v| v.to_string()).collect()),
        ));
        self
    }

    pub fn compiler(mut self, compiler: Compiler) -> Self {
        self.compiler = Some(compiler);
        self
    }

    /// The exact version requested, if the request pins one.
    pub fn exact_version(&self) -> Option<&Version> {
        match self.versions.as_ref()?.ranges() {
            [only] => only.as_exact(),
            _ => None,
        }
    }

    pub fn parse(text: &str) -> FxResult<Self> {
        let parsed = ParsedSpec::parse(text)?;
        let err = |message: String| FxError::Generic {
            message: format!("invalid request '{text}': {message}"),
        };
        let name = parsed
            .name
            .ok_or_else(|| err("missing package name".to_string()))?;

        let mut variants: Vec<(String, RequestedValue)> = Vec::new();
        for clause in parsed.variants {
            if variants.iter().any(|(n, _)| n == clause.name()) {
                return Err(err(format!("variant '{}' given twice", clause.name())));
            }
            let entry = match clause {
                VariantClause::Flag { name, enabled } => (name, RequestedValue::Flag(enabled)),
                VariantClause::Values { name, negated: true, .. } => {
                    return Err(err(format!("variant '{name}' cannot exclude values here")));
                }
                VariantClause::Values { name, values, .. } => {
                    (name, RequestedValue::Values(values))
                }
            };
            variants.push(entry);
        }

        let compiler = match parsed.compiler {
            None => None,
            Some(clause) if clause.versions.is_any() => Some(Compiler {
                family: clause.family,
                version: None,
            }),
            Some(clause) => match clause.versions.ranges() {
                [only] if only.as_exact().is_some() => Some(Compiler {
                    family: clause.family,
                    version: only.as_exact().cloned(),
                }),
                _ => {
                    return Err(err(format!(
                        "compiler '%{}' must name one exact version",
                        clause.family
                    )));
                }
            },
        };

        Ok(Self {
            name,
            versions: parsed.versions,
            variants,
            compiler,
        })
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(ref versions) = self.versions {
            write!(f, "@{versions}")?;
        }
        for (name, value) in &self.variants {
            match value {
                RequestedValue::Flag(true) => write!(f, " +{name}")?,
                RequestedValue::Flag(false) => write!(f, " ~{name}")?,
                RequestedValue::Values(values) => write!(f, " {name}={}", values.join(","))?,
            }
        }
        if let Some(ref compiler) = self.compiler {
            write!(f, " %{compiler}")?;
        }
        Ok(())
    }
}
