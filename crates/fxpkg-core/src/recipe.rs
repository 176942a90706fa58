//! The compiled, immutable form of a recipe.
//!
//! A [`RecipeFile`] is checked and turned into a [`Recipe`] once at load time:
//! every condition and dependency spec is parsed, every variant reference is
//! checked, and the result is never mutated afterwards.

use std::collections::{BTreeSet, HashSet};

use fxpkg_util::errors::{FxError, FxResult};

use crate::args::{ArgSource, ArgValue, BuildArgRule, BuildSystem};
use crate::condition::Condition;
use crate::dependency::{default_usage, DependencyDecl, DependencySpec, UsageType};
use crate::manifest::{ArgEntry, ConstValue, RecipeFile, VariantDefault, VariantEntry};
use crate::variant::{VariantDecl, VariantKind};
use crate::version::{Version, VersionConstraint};

/// Where the sources of one version come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSource {
    /// A content-addressed archive.
    Archive { url: String, sha256: String },
    /// A live branch of the git repository; never cached.
    Branch {
        git: String,
        branch: String,
        no_cache: bool,
    },
}

/// One declared version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDecl {
    pub version: Version,
    pub source: VersionSource,
    pub deprecated: bool,
}

/// A condition that invalidates a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictRule {
    pub condition: Condition,
    pub message: String,
}

/// A patch applied to the sources when its condition holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchDecl {
    pub file: String,
    pub when: Condition,
}

/// An immutable declaration bundle for one package.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub name: String,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub git: Option<String>,
    pub maintainers: Vec<String>,
    pub license: Option<String>,
    pub build_system: BuildSystem,
    pub build_directory: Option<String>,
    pub versions: Vec<VersionDecl>,
    pub variants: Vec<VariantDecl>,
    pub dependencies: Vec<DependencyDecl>,
    pub conflicts: Vec<ConflictRule>,
    pub patches: Vec<PatchDecl>,
    pub args: Vec<BuildArgRule>,
}

impl Recipe {
    /// Parse and compile a recipe from TOML.
    pub fn parse_toml(content: &str) -> FxResult<Self> {
        Self::compile(RecipeFile::parse_toml(content)?)
    }

    /// Check a raw recipe file and build the immutable recipe.
    pub fn compile(file: RecipeFile) -> FxResult<Self> {
        let pkg = file.package;
        let name = pkg.name.trim().to_string();
        if name.is_empty() {
            return Err(FxError::Recipe {
                message: "recipe has an empty package name".to_string(),
            });
        }
        let err = |message: String| FxError::Recipe {
            message: format!("{name}: {message}"),
        };

        let mut versions = Vec::new();
        let mut seen = HashSet::new();
        for entry in &file.versions {
            let version = Version::parse(&entry.id).map_err(|e| err(e.to_string()))?;
            if !seen.insert(version.clone()) {
                return Err(err(format!("version '{version}' declared twice")));
            }
            let source = match (&entry.sha256, &entry.branch) {
                (Some(sha256), None) => {
                    if sha256.len() != 64 || !sha256.bytes().all(|b| b.is_ascii_hexdigit()) {
                        return Err(err(format!(
                            "version '{version}' has a malformed sha256 checksum"
                        )));
                    }
                    let template = entry
                        .url
                        .as_ref()
                        .or(pkg.url.as_ref())
                        .ok_or_else(|| err(format!("version '{version}' has no download URL")))?;
                    VersionSource::Archive {
                        url: template.replace("{version}", version.as_str()),
                        sha256: sha256.to_ascii_lowercase(),
                    }
                }
                (None, Some(branch)) => VersionSource::Branch {
                    git: pkg
                        .git
                        .clone()
                        .ok_or_else(|| err(format!("branch version '{version}' needs a git URL")))?,
                    branch: branch.clone(),
                    no_cache: entry.no_cache,
                },
                _ => {
                    return Err(err(format!(
                        "version '{version}' must declare exactly one of sha256 or branch"
                    )));
                }
            };
            versions.push(VersionDecl {
                version,
                source,
                deprecated: entry.deprecated,
            });
        }
        if versions.is_empty() {
            return Err(err("no versions declared".to_string()));
        }

        let mut variants: Vec<VariantDecl> = Vec::new();
        for entry in &file.variants {
            if variants.iter().any(|v| v.name == entry.name) {
                return Err(err(format!("variant '{}' declared twice", entry.name)));
            }
            variants.push(compile_variant(entry).map_err(&err)?);
        }
        let declared: HashSet<&str> = variants.iter().map(|v| v.name.as_str()).collect();
        let check_refs = |cond: &Condition, context: &str| -> FxResult<()> {
            match cond.variant_names().find(|n| !declared.contains(n)) {
                Some(unknown) => Err(err(format!(
                    "{context} refers to undeclared variant '{unknown}'"
                ))),
                None => Ok(()),
            }
        };
        for variant in &variants {
            check_refs(&variant.when, &format!("variant '{}'", variant.name))?;
        }

        let mut dependencies = Vec::new();
        for entry in &file.depends {
            let spec = DependencySpec::parse(&entry.spec).map_err(|e| err(e.to_string()))?;
            let when = Condition::parse_opt(entry.when.as_deref()).map_err(|e| err(e.to_string()))?;
            check_refs(&when, &format!("dependency '{}'", entry.spec))?;
            let usage = match &entry.usage {
                Some(list) => list
                    .items()
                    .into_iter()
                    .map(parse_usage)
                    .collect::<Result<BTreeSet<_>, _>>()
                    .map_err(&err)?,
                None => default_usage(),
            };
            dependencies.push(DependencyDecl { spec, usage, when });
        }

        let mut conflicts = Vec::new();
        for entry in &file.conflicts {
            let spec = Condition::parse(&entry.spec).map_err(|e| err(e.to_string()))?;
            let when = Condition::parse_opt(entry.when.as_deref()).map_err(|e| err(e.to_string()))?;
            let condition = spec.and(when);
            check_refs(&condition, &format!("conflict '{}'", entry.spec))?;
            let message = entry.msg.clone().unwrap_or_else(|| match &entry.when {
                Some(when) => format!("'{}' is not allowed when '{when}'", entry.spec),
                None => format!("'{}' is not allowed", entry.spec),
            });
            conflicts.push(ConflictRule { condition, message });
        }

        let mut patches = Vec::new();
        for entry in &file.patches {
            let when = Condition::parse_opt(entry.when.as_deref()).map_err(|e| err(e.to_string()))?;
            check_refs(&when, &format!("patch '{}'", entry.file))?;
            patches.push(PatchDecl {
                file: entry.file.clone(),
                when,
            });
        }

        let mut args = Vec::new();
        for entry in &file.args {
            let source = compile_arg(entry).map_err(&err)?;
            match &source {
                ArgSource::Variant(variant) if !declared.contains(variant.as_str()) => {
                    return Err(err(format!(
                        "argument '{}' uses undeclared variant '{variant}'",
                        entry.key
                    )));
                }
                ArgSource::Condition(cond) => {
                    check_refs(cond, &format!("argument '{}'", entry.key))?;
                }
                ArgSource::Libraries(dep) if !dependencies.iter().any(|d| &d.spec.name == dep) => {
                    return Err(err(format!(
                        "argument '{}' takes libraries from '{dep}', which is not a dependency",
                        entry.key
                    )));
                }
                _ => {}
            }
            args.push(BuildArgRule {
                key: entry.key.clone(),
                source,
            });
        }

        tracing::debug!(
            "compiled recipe {name}: {} versions, {} variants, {} dependency edges",
            versions.len(),
            variants.len(),
            dependencies.len()
        );

        Ok(Self {
            name: name.clone(),
            description: pkg.description,
            homepage: pkg.homepage,
            git: pkg.git,
            maintainers: pkg.maintainers,
            license: pkg.license,
            build_system: pkg.build_system,
            build_directory: pkg.build_directory,
            versions,
            variants,
            dependencies,
            conflicts,
            patches,
            args,
        })
    }

    /// The declaration for exactly `version`, if any.
    pub fn find_version(&self, version: &Version) -> Option<&VersionDecl> {
        self.versions.iter().find(|v| &v.version == version)
    }

    /// The version chosen when a request names none: the highest
    /// non-deprecated release, never a branch unless nothing else exists.
    pub fn preferred_version(&self) -> Option<&VersionDecl> {
        self.best_version(&VersionConstraint::any())
    }

    /// The most preferred declared version inside `constraint`.
    ///
    /// Releases beat branches and non-deprecated beats deprecated; within a
    /// tier the highest version wins. A branch is chosen only when the
    /// constraint admits no release.
    pub fn best_version(&self, constraint: &VersionConstraint) -> Option<&VersionDecl> {
        self.versions
            .iter()
            .filter(|v| constraint.contains(&v.version))
            .max_by(|a, b| {
                let rank = |d: &VersionDecl| (!d.version.is_branch(), !d.deprecated);
                rank(a).cmp(&rank(b)).then_with(|| a.version.cmp(&b.version))
            })
    }

    pub fn variant(&self, name: &str) -> Option<&VariantDecl> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// Comma-separated list of declared versions, for diagnostics.
    pub fn declared_versions(&self) -> String {
        let ids: Vec<&str> = self.versions.iter().map(|v| v.version.as_str()).collect();
        ids.join(", ")
    }
}

fn parse_usage(item: &str) -> Result<UsageType, String> {
    match item {
        "build" => Ok(UsageType::Build),
        "link" => Ok(UsageType::Link),
        "run" => Ok(UsageType::Run),
        "test" => Ok(UsageType::Test),
        other => Err(format!("unknown dependency type '{other}'")),
    }
}

fn compile_variant(entry: &VariantEntry) -> Result<VariantDecl, String> {
    let name = &entry.name;
    let when = Condition::parse_opt(entry.when.as_deref()).map_err(|e| e.to_string())?;
    let unknown = |value: &str| format!("variant '{name}' default '{value}' is not one of its values");

    let kind = match (&entry.default, entry.multi) {
        (VariantDefault::Bool(default), false) => {
            if !entry.values.is_empty() {
                return Err(format!("boolean variant '{name}' cannot list values"));
            }
            VariantKind::Bool { default: *default }
        }
        (VariantDefault::Bool(_), true) => {
            return Err(format!("multi-valued variant '{name}' needs a value default"));
        }
        (VariantDefault::One(default), false) => {
            if !entry.values.contains(default) {
                return Err(unknown(default));
            }
            VariantKind::Single {
                values: entry.values.clone(),
                default: default.clone(),
            }
        }
        (VariantDefault::Many(_), false) => {
            return Err(format!("single-valued variant '{name}' has a list default"));
        }
        (VariantDefault::One(one), true) => multi_kind(entry, std::slice::from_ref(one), &unknown)?,
        (VariantDefault::Many(many), true) => multi_kind(entry, many, &unknown)?,
    };

    Ok(VariantDecl {
        name: name.clone(),
        description: entry.description.clone(),
        kind,
        when,
    })
}

fn multi_kind(
    entry: &VariantEntry,
    defaults: &[String],
    unknown: &dyn Fn(&str) -> String,
) -> Result<VariantKind, String> {
    if let Some(bad) = defaults.iter().find(|d| !entry.values.contains(d)) {
        return Err(unknown(bad));
    }
    Ok(VariantKind::Multi {
        values: entry.values.clone(),
        default: defaults.iter().cloned().collect(),
    })
}

fn compile_arg(entry: &ArgEntry) -> Result<ArgSource, String> {
    let mut sources = Vec::new();
    if let Some(variant) = &entry.variant {
        sources.push(ArgSource::Variant(variant.clone()));
    }
    if let Some(value) = &entry.value {
        sources.push(ArgSource::Constant(match value {
            ConstValue::Bool(b) => ArgValue::Bool(*b),
            ConstValue::Str(s) => ArgValue::Str(s.clone()),
        }));
    }
    if let Some(when) = &entry.when {
        sources.push(ArgSource::Condition(
            Condition::parse(when).map_err(|e| e.to_string())?,
        ));
    }
    if let Some(dep) = &entry.libs {
        sources.push(ArgSource::Libraries(dep.clone()));
    }
    if let Some(template) = &entry.jobs {
        if !template.contains("{jobs}") {
            return Err(format!("argument '{}' jobs template lacks {{jobs}}", entry.key));
        }
        sources.push(ArgSource::Jobs(template.clone()));
    }
    match sources.len() {
        1 => Ok(sources.remove(0)),
        0 => Err(format!("argument '{}' has no value source", entry.key)),
        _ => Err(format!("argument '{}' has more than one value source", entry.key)),
    }
}
