//! The variant resolver: version selection, variant defaulting, conflict
//! checking, edge activation, constraint merging and build arguments.
//!
//! Resolution is a pure function of the recipe, the request and the host
//! facts. Nothing is cached and nothing is mutated, so the same inputs always
//! produce the same output.

use serde::Serialize;
use std::collections::BTreeMap;

use fxpkg_core::args::{ArgSource, ArgValue, BuildArg, BuildSystem};
use fxpkg_core::condition::ConditionContext;
use fxpkg_core::host::{Compiler, HostFacts};
use fxpkg_core::recipe::{Recipe, VersionDecl};
use fxpkg_core::request::Request;
use fxpkg_core::variant::{RequestedValue, VariantValue};
use fxpkg_core::version::Version;
use fxpkg_util::errors::{FxError, FxResult};

use crate::conflict::ConflictReport;
use crate::constraint::{merge_edges, DependencyConstraint};
use crate::fetch::FetchDescriptor;

/// A recipe with its version chosen and every existing variant valued.
#[derive(Debug, Clone)]
pub struct Configuration<'r> {
    pub recipe: &'r Recipe,
    pub version: &'r VersionDecl,
    /// Variants that exist for this version; inactive ones are absent.
    pub variants: BTreeMap<String, VariantValue>,
    pub compiler: Option<Compiler>,
}

impl ConditionContext for Configuration<'_> {
    fn version(&self) -> &Version {
        &self.version.version
    }

    fn variant(&self, name: &str) -> Option<&VariantValue> {
        self.variants.get(name)
    }

    fn compiler(&self) -> Option<&Compiler> {
        self.compiler.as_ref()
    }
}

impl Configuration<'_> {
    /// The configuration written as a spec, e.g. `fenics-basix@0.9.0 build_type=Release`.
    pub fn spec(&self) -> String {
        let mut parts = vec![format!("{}@{}", self.recipe.name, self.version.version)];
        parts.extend(self.variants.iter().map(|(name, value)| value.fragment(name)));
        if let Some(ref compiler) = self.compiler {
            parts.push(format!("%{compiler}"));
        }
        parts.join(" ")
    }
}

/// A configuration together with its merged dependency constraints.
#[derive(Debug, Clone)]
pub struct Configured<'r> {
    pub config: Configuration<'r>,
    pub dependencies: Vec<DependencyConstraint>,
}

/// The complete, serializable result of resolving one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub package: String,
    pub version: Version,
    pub deprecated: bool,
    pub variants: BTreeMap<String, VariantValue>,
    pub compiler: Option<Compiler>,
    pub dependencies: Vec<DependencyConstraint>,
    pub build_system: BuildSystem,
    pub args: Vec<BuildArg>,
    pub fetch: FetchDescriptor,
}

impl Resolution {
    /// The build arguments as the recipe's build tool expects them.
    pub fn rendered_args(&self) -> Vec<String> {
        self.build_system.render_all(&self.args)
    }
}

/// Resolve a request against a recipe: configure it, then derive build
/// arguments and the fetch descriptor.
pub fn resolve(recipe: &Recipe, request: &Request, host: &HostFacts) -> FxResult<Resolution> {
    let Configured {
        config,
        dependencies,
    } = configure(recipe, request, host)?;
    let args = build_args(&config, &dependencies, host)?;
    let fetch = FetchDescriptor::for_configuration(&config);

    tracing::info!(
        "resolved {}: {} dependencies, {} build arguments",
        config.spec(),
        dependencies.len(),
        args.len()
    );

    Ok(Resolution {
        package: recipe.name.clone(),
        version: config.version.version.clone(),
        deprecated: config.version.deprecated,
        variants: config.variants,
        compiler: config.compiler,
        dependencies,
        build_system: recipe.build_system,
        args,
        fetch,
    })
}

/// Choose the version, value every variant, check conflicts, and merge the
/// active dependency edges.
///
/// Fails on the first error: no partial configuration is ever returned.
pub fn configure<'r>(
    recipe: &'r Recipe,
    request: &Request,
    host: &HostFacts,
) -> FxResult<Configured<'r>> {
    if request.name != recipe.name {
        return Err(FxError::Generic {
            message: format!(
                "request for '{}' cannot be resolved with the {} recipe",
                request.name, recipe.name
            ),
        });
    }

    let version = select_version(recipe, request)?;
    if version.deprecated {
        tracing::warn!("{}@{} is deprecated", recipe.name, version.version);
    }

    let mut config = Configuration {
        recipe,
        version,
        variants: BTreeMap::new(),
        compiler: request.compiler.clone().or_else(|| host.compiler.clone()),
    };
    assign_variants(&mut config, &request.variants)?;

    ConflictReport::check(&recipe.conflicts, &config).into_result(&recipe.name)?;

    let active = recipe.dependencies.iter().filter(|edge| {
        let on = edge.when.evaluate(&config);
        if on {
            tracing::debug!("{}: edge {} active", recipe.name, edge.spec);
        }
        on
    });
    let dependencies = merge_edges(active)?;

    for constraint in &dependencies {
        if let Some(installed) = host.dependency(&constraint.name) {
            constraint.check_installed(installed)?;
        }
    }

    Ok(Configured {
        config,
        dependencies,
    })
}

fn select_version<'r>(recipe: &'r Recipe, request: &Request) -> FxResult<&'r VersionDecl> {
    let unknown = |version: String| FxError::UnknownVersion {
        package: recipe.name.clone(),
        version,
        declared: recipe.declared_versions(),
    };
    match (&request.versions, request.exact_version()) {
        (_, Some(exact)) => recipe
            .find_version(exact)
            .ok_or_else(|| unknown(exact.to_string())),
        (Some(range), None) => recipe
            .best_version(range)
            .ok_or_else(|| unknown(range.to_string())),
        (None, None) => recipe
            .preferred_version()
            .ok_or_else(|| unknown(":".to_string())),
    }
}

/// Value every variant in declaration order.
///
/// A variant whose condition is false does not exist: it gets no value and
/// requesting it is an error. Later conditions may refer to earlier variants.
fn assign_variants(
    config: &mut Configuration<'_>,
    requested: &[(String, RequestedValue)],
) -> FxResult<()> {
    let recipe = config.recipe;
    let invalid = |variant: &str, value: String, allowed: String| FxError::InvalidVariantValue {
        package: recipe.name.clone(),
        variant: variant.to_string(),
        value,
        allowed,
    };

    for (name, value) in requested {
        if recipe.variant(name).is_none() {
            let declared: Vec<&str> = recipe.variants.iter().map(|v| v.name.as_str()).collect();
            return Err(invalid(
                name,
                describe(value),
                format!("declared variants are {}", declared.join(", ")),
            ));
        }
    }

    for decl in &recipe.variants {
        let wanted = requested.iter().find(|(n, _)| n == &decl.name).map(|(_, v)| v);
        if !decl.when.evaluate(&*config) {
            if let Some(value) = wanted {
                return Err(invalid(
                    &decl.name,
                    describe(value),
                    format!(
                        "variant only exists when '{}', not for {}@{}",
                        decl.when, recipe.name, config.version.version
                    ),
                ));
            }
            continue;
        }
        let value = match wanted {
            Some(value) => decl
                .accept(value)
                .map_err(|bad| invalid(&decl.name, bad, decl.allowed()))?,
            None => decl.default_value(),
        };
        config.variants.insert(decl.name.clone(), value);
    }
    Ok(())
}

fn describe(value: &RequestedValue) -> String {
    match value {
        RequestedValue::Flag(true) => "True".to_string(),
        RequestedValue::Flag(false) => "False".to_string(),
        RequestedValue::Values(values) => values.join(","),
    }
}

/// Evaluate every build-argument rule, in declaration order.
///
/// Rules reading a variant that does not exist for this configuration, or
/// the libraries of a dependency that is not active, are skipped.
pub fn build_args(
    config: &Configuration<'_>,
    dependencies: &[DependencyConstraint],
    host: &HostFacts,
) -> FxResult<Vec<BuildArg>> {
    let mut args = Vec::new();
    for rule in &config.recipe.args {
        let value = match &rule.source {
            ArgSource::Variant(name) => match config.variants.get(name) {
                Some(VariantValue::Bool(b)) => ArgValue::Bool(*b),
                Some(VariantValue::Single(v)) => ArgValue::Str(v.clone()),
                Some(VariantValue::Multi(set)) => ArgValue::List(set.iter().cloned().collect()),
                None => {
                    tracing::debug!("{}: variant {name} inactive, skipping", rule.key);
                    continue;
                }
            },
            ArgSource::Constant(value) => value.clone(),
            ArgSource::Condition(condition) => ArgValue::Bool(condition.evaluate(config)),
            ArgSource::Libraries(dep) => {
                if !dependencies.iter().any(|d| &d.name == dep) {
                    tracing::debug!("{}: dependency {dep} inactive, skipping", rule.key);
                    continue;
                }
                match host.dependency(dep) {
                    Some(facts) if !facts.libs.is_empty() => ArgValue::Str(facts.joined_libs()),
                    _ => {
                        return Err(FxError::MissingLibraries {
                            dependency: dep.clone(),
                        });
                    }
                }
            }
            ArgSource::Jobs(template) => {
                ArgValue::Str(template.replace("{jobs}", &host.jobs.to_string()))
            }
        };
        let arg = BuildArg::new(&rule.key, value);
        tracing::debug!("{}: {arg}", config.recipe.name);
        args.push(arg);
    }
    Ok(args)
}
