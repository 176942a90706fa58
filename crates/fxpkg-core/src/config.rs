use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fxpkg_util::errors::{FxError, FxResult};

use crate::host::{Compiler, DependencyFacts, HostFacts};
use crate::version::Version;

/// File name of the per-project configuration.
pub const PROJECT_FILE: &str = "Fxpkg.toml";

/// Global user configuration loaded from `~/.fxpkg/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub host: HostSection,

    #[serde(default)]
    pub repository: RepositorySection,
}

/// Project configuration from the nearest `Fxpkg.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub host: HostSection,

    #[serde(default)]
    pub repository: RepositorySection,

    /// Installed dependencies, keyed by package name.
    #[serde(default)]
    pub deps: BTreeMap<String, DepEntry>,

    /// Directory containing the `Fxpkg.toml`; relative paths resolve against it.
    #[serde(skip)]
    pub root: PathBuf,
}

/// Host settings from `[host]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostSection {
    #[serde(default)]
    pub compiler: Option<String>,
    #[serde(default)]
    pub jobs: Option<u32>,
}

/// Extra recipe directories from `[repository]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositorySection {
    #[serde(default)]
    pub paths: Vec<PathBuf>,
}

/// One `[deps.<name>]` entry describing an installed dependency.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepEntry {
    #[serde(default)]
    pub version: Option<String>,
    /// Installed variants as a spec fragment, e.g. `"+mpi ~timer"`.
    #[serde(default)]
    pub variants: Option<String>,
    #[serde(default)]
    pub libs: Vec<PathBuf>,
}

impl HostSection {
    fn apply(&self, facts: &mut HostFacts) -> FxResult<()> {
        if let Some(ref compiler) = self.compiler {
            facts.compiler = Some(Compiler::parse(compiler)?);
        }
        if let Some(jobs) = self.jobs {
            if jobs == 0 {
                return Err(FxError::Config {
                    message: "jobs must be at least 1".to_string(),
                });
            }
            facts.jobs = jobs;
        }
        Ok(())
    }
}

impl DepEntry {
    /// Convert to host facts, resolving relative library paths against `root`.
    pub fn to_facts(&self, root: &Path) -> FxResult<DependencyFacts> {
        let version = self
            .version
            .as_deref()
            .map(Version::parse)
            .transpose()
            .map_err(|e| FxError::Config {
                message: e.to_string(),
            })?;
        let variants = match self.variants.as_deref() {
            Some(text) => DependencyFacts::parse_variants(text)?,
            None => BTreeMap::new(),
        };
        let libs = self
            .libs
            .iter()
            .map(|p| if p.is_absolute() { p.clone() } else { root.join(p) })
            .collect();
        Ok(DependencyFacts {
            version,
            variants,
            libs,
        })
    }
}

impl GlobalConfig {
    /// Load the global configuration, or return defaults if the file doesn't exist.
    pub fn load() -> FxResult<Self> {
        Self::load_from(&Self::default_path())
    }

    pub fn load_from(path: &Path) -> FxResult<Self> {
        if !path.is_file() {
            tracing::debug!("no global config at {}", path.display());
            return Ok(Self::default());
        }
        read_toml(path)
    }

    /// Returns the default path to the global config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    pub fn apply(&self, facts: &mut HostFacts) -> FxResult<()> {
        self.host.apply(facts)
    }
}

impl ProjectConfig {
    /// Find and load the nearest `Fxpkg.toml` at or above `start`.
    pub fn discover(start: &Path) -> FxResult<Option<Self>> {
        match fxpkg_util::fs::find_ancestor_with(start, PROJECT_FILE) {
            Some(dir) => Self::load_from(&dir.join(PROJECT_FILE)).map(Some),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> FxResult<Self> {
        let mut config: Self = read_toml(path)?;
        config.root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        tracing::debug!(
            "loaded project config {} ({} installed deps)",
            path.display(),
            config.deps.len()
        );
        Ok(config)
    }

    /// Layer this project's settings over `facts`.
    pub fn apply(&self, facts: &mut HostFacts) -> FxResult<()> {
        self.host.apply(facts)?;
        for (name, entry) in &self.deps {
            let dep = entry.to_facts(&self.root).map_err(|e| FxError::Config {
                message: format!("[deps.{name}]: {e}"),
            })?;
            facts.deps.insert(name.clone(), dep);
        }
        Ok(())
    }

    /// Recipe directories, resolved against the project root.
    pub fn repository_paths(&self) -> Vec<PathBuf> {
        self.repository
            .paths
            .iter()
            .map(|p| if p.is_absolute() { p.clone() } else { self.root.join(p) })
            .collect()
    }
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> FxResult<T> {
    let content = std::fs::read_to_string(path).map_err(|e| FxError::Config {
        message: format!("Failed to read {}: {e}", path.display()),
    })?;
    toml::from_str(&content).map_err(|e| FxError::Config {
        message: format!("Failed to parse {}: {e}", path.display()),
    })
}

/// Returns the fxpkg data directory: `$FXPKG_HOME`, else `~/.fxpkg/`.
pub fn dirs_path() -> PathBuf {
    if let Some(home) = std::env::var_os("FXPKG_HOME") {
        return PathBuf::from(home);
    }
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".fxpkg")
}
