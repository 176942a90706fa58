//! Facts about the build host supplied by the orchestrating system.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Serialize, Serializer};

use fxpkg_util::errors::{FxError, FxResult};

use crate::spec::{ParsedSpec, VariantClause};
use crate::variant::{parse_bool, VariantValue};
use crate::version::Version;

/// Separator used when joining library paths into one build argument.
#[cfg(windows)]
pub const PATH_SEPARATOR: char = ';';
#[cfg(not(windows))]
pub const PATH_SEPARATOR: char = ':';

/// A compiler identity, e.g. `gcc@13.2.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiler {
    pub family: String,
    pub version: Option<Version>,
}

impl Compiler {
    /// Parse `family[@version]`.
    pub fn parse(text: &str) -> FxResult<Self> {
        let text = text.trim().trim_start_matches('%');
        let (family, version) = match text.split_once('@') {
            Some((family, version)) => (family, Some(Version::parse(version)?)),
            None => (text, None),
        };
        let valid = |b: u8| b.is_ascii_alphanumeric() || b == b'-' || b == b'_';
        if family.is_empty() || !family.bytes().all(valid) {
            return Err(FxError::Config {
                message: format!("invalid compiler '{text}', expected e.g. gcc@13.2.0"),
            });
        }
        Ok(Self {
            family: family.to_string(),
            version,
        })
    }
}

impl fmt::Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.family)?;
        if let Some(ref version) = self.version {
            write!(f, "@{version}")?;
        }
        Ok(())
    }
}

impl Serialize for Compiler {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// What the host knows about one installed dependency.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyFacts {
    pub version: Option<Version>,
    pub variants: BTreeMap<String, VariantValue>,
    pub libs: Vec<PathBuf>,
}

impl DependencyFacts {
    /// Parse installed variants written as a spec fragment, e.g. `+mpi ~timer`.
    pub fn parse_variants(text: &str) -> FxResult<BTreeMap<String, VariantValue>> {
        let parsed = ParsedSpec::parse(text)?;
        if parsed.name.is_some() || parsed.versions.is_some() || parsed.compiler.is_some() {
            return Err(FxError::Config {
                message: format!("installed variants '{text}' may only contain variant clauses"),
            });
        }
        let mut variants = BTreeMap::new();
        for clause in parsed.variants {
            let (name, value) = match clause {
                VariantClause::Flag { name, enabled } => (name, VariantValue::Bool(enabled)),
                VariantClause::Values { negated: true, name, .. } => {
                    return Err(FxError::Config {
                        message: format!("installed variant '{name}' cannot be negated"),
                    });
                }
                VariantClause::Values { name, values, .. } => {
                    let value = match values.as_slice() {
                        [single] => match parse_bool(single) {
                            Some(b) => VariantValue::Bool(b),
                            None => VariantValue::Single(single.clone()),
                        },
                        _ => VariantValue::Multi(values.into_iter().collect()),
                    };
                    (name, value)
                }
            };
            variants.insert(name, value);
        }
        Ok(variants)
    }

    /// The located library files joined with the platform path separator.
    pub fn joined_libs(&self) -> String {
        let parts: Vec<String> = self.libs.iter().map(|p| p.display().to_string()).collect();
        parts.join(&PATH_SEPARATOR.to_string())
    }
}

/// Everything the resolver may consult beyond the recipe and the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFacts {
    pub compiler: Option<Compiler>,
    /// Parallel build jobs, substituted into `{jobs}` argument templates.
    pub jobs: u32,
    pub deps: BTreeMap<String, DependencyFacts>,
}

impl Default for HostFacts {
    fn default() -> Self {
        Self {
            compiler: None,
            jobs: default_jobs(),
            deps: BTreeMap::new(),
        }
    }
}

impl HostFacts {
    pub fn with_compiler(mut self, compiler: Compiler) -> Self {
        self.compiler = Some(compiler);
        self
    }

    pub fn with_dependency(mut self, name: &str, facts: DependencyFacts) -> Self {
        self.deps.insert(name.to_string(), facts);
        self
    }

    pub fn dependency(&self, name: &str) -> Option<&DependencyFacts> {
        self.deps.get(name)
    }
}

pub fn default_jobs() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiler_parse() {
        let c = Compiler::parse("gcc@13.2.0").unwrap();
        assert_eq!(c.family, "gcc");
        assert_eq!(c.version, Some(Version::parse("13.2.0").unwrap()));
        assert_eq!(c.to_string(), "gcc@13.2.0");

        let c = Compiler::parse("%clang").unwrap();
        assert_eq!(c.family, "clang");
        assert!(c.version.is_none());

        assert!(Compiler::parse("@12").is_err());
        assert!(Compiler::parse("g c c").is_err());
    }

    #[test]
    fn installed_variants() {
        let variants = DependencyFacts::parse_variants("+mpi ~timer api=v2 langs=c,cxx").unwrap();
        assert_eq!(variants["mpi"], VariantValue::Bool(true));
        assert_eq!(variants["timer"], VariantValue::Bool(false));
        assert_eq!(variants["api"], VariantValue::Single("v2".into()));
        assert!(variants["langs"].contains("cxx"));
        assert!(DependencyFacts::parse_variants("boost+mpi").is_err());
        assert!(DependencyFacts::parse_variants("x=~y").is_err());
    }

    #[test]
    fn joined_libs_uses_path_separator() {
        let facts = DependencyFacts {
            libs: vec![PathBuf::from("/opt/a/libblas.so"), PathBuf::from("/opt/b/libcblas.so")],
            ..Default::default()
        };
        let sep = PATH_SEPARATOR;
        assert_eq!(
            facts.joined_libs(),
            format!("/opt/a/libblas.so{sep}/opt/b/libcblas.so")
        );
    }

    #[test]
    fn default_jobs_nonzero() {
        assert!(HostFacts::default().jobs > 0);
    }
}
