//! Merging the active edges that target one dependency into a single constraint.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use fxpkg_core::dependency::{DependencyDecl, UsageType, VariantRequirement};
use fxpkg_core::host::DependencyFacts;
use fxpkg_core::version::VersionConstraint;
use fxpkg_util::errors::{FxError, FxResult};

/// The conjunction of every active edge to one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyConstraint {
    pub name: String,
    #[serde(serialize_with = "serialize_display")]
    pub versions: VersionConstraint,
    pub variants: BTreeMap<String, VariantRequirement>,
    /// Union of the usage types of the contributing edges.
    pub usage: BTreeSet<UsageType>,
    /// The contributing edge specs, in declaration order.
    pub edges: Vec<String>,
}

fn serialize_display<S: serde::Serializer>(
    value: &VersionConstraint,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

impl DependencyConstraint {
    fn from_edge(edge: &DependencyDecl) -> Self {
        Self {
            name: edge.spec.name.clone(),
            versions: edge.spec.versions.clone(),
            variants: edge.spec.variants.clone(),
            usage: edge.usage.clone(),
            edges: vec![edge.spec.to_string()],
        }
    }

    /// Conjoin another edge to the same dependency.
    fn conjoin(&mut self, edge: &DependencyDecl) -> FxResult<()> {
        let versions = self.versions.intersect(&edge.spec.versions);
        if versions.is_empty() {
            return Err(self.unsatisfiable(format!(
                "no version satisfies both '{}' and '{}'",
                self.versions, edge.spec.versions
            )));
        }
        self.versions = versions;

        for (variant, requirement) in &edge.spec.variants {
            let merged = match self.variants.get(variant) {
                Some(existing) => existing.conjoin(requirement).map_err(|clash| {
                    self.unsatisfiable(format!("variant '{variant}' {clash}"))
                })?,
                None => requirement.clone(),
            };
            self.variants.insert(variant.clone(), merged);
        }

        self.usage.extend(edge.usage.iter().copied());
        self.edges.push(edge.spec.to_string());
        Ok(())
    }

    /// Check what the host reports as installed against this constraint.
    ///
    /// Facts the host does not report are not checked.
    pub fn check_installed(&self, installed: &DependencyFacts) -> FxResult<()> {
        if let Some(ref version) = installed.version {
            if !self.versions.contains(version) {
                return Err(self.unsatisfiable(format!(
                    "installed version {version} is outside '{}'",
                    self.versions
                )));
            }
        }
        for (variant, requirement) in &self.variants {
            if let Some(value) = installed.variants.get(variant) {
                if !requirement.satisfied_by(value) {
                    return Err(self.unsatisfiable(format!(
                        "installed {} does not meet '{}'",
                        value.fragment(variant),
                        self.spec()
                    )));
                }
            }
        }
        Ok(())
    }

    /// The merged constraint written as a dependency spec.
    pub fn spec(&self) -> String {
        let spec = fxpkg_core::dependency::DependencySpec {
            name: self.name.clone(),
            versions: self.versions.clone(),
            variants: self.variants.clone(),
        };
        spec.to_string()
    }

    fn unsatisfiable(&self, message: String) -> FxError {
        FxError::UnsatisfiableConstraint {
            dependency: self.name.clone(),
            message,
        }
    }
}

impl fmt::Display for DependencyConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let usage: Vec<String> = self.usage.iter().map(|u| u.to_string()).collect();
        write!(f, "{} [{}]", self.spec(), usage.join(","))
    }
}

/// Merge active edges by dependency name, keeping first-activation order.
pub fn merge_edges<'a>(
    edges: impl IntoIterator<Item = &'a DependencyDecl>,
) -> FxResult<Vec<DependencyConstraint>> {
    let mut merged: Vec<DependencyConstraint> = Vec::new();
    for edge in edges {
        match merged.iter_mut().find(|c| c.name == edge.spec.name) {
            Some(existing) => existing.conjoin(edge)?,
            None => merged.push(DependencyConstraint::from_edge(edge)),
        }
    }
    Ok(merged)
}
