//! Operation context: the recipe repository and host facts shared by every
//! command.
//!
//! Host facts are layered, lowest precedence first: the global
//! `config.toml`, the nearest `Fxpkg.toml`, then command-line overrides.
//! Recipe directories stack the same way over the built-in recipes.

use std::path::{Path, PathBuf};

use fxpkg_core::config::{dirs_path, GlobalConfig, ProjectConfig};
use fxpkg_core::host::{Compiler, DependencyFacts, HostFacts};
use fxpkg_core::recipe::Recipe;
use fxpkg_core::repository::Repository;
use fxpkg_core::version::Version;
use fxpkg_util::errors::FxError;

/// Host settings given on the command line.
#[derive(Debug, Clone, Default)]
pub struct HostOverrides {
    /// `--compiler gcc@13.2`
    pub compiler: Option<String>,
    /// `--jobs N`
    pub jobs: Option<u32>,
    /// `--dep NAME@VERSION`, one per installed dependency.
    pub deps: Vec<String>,
    /// `--libs NAME=PATH[,PATH]`
    pub libs: Vec<String>,
    /// `--recipes DIR`, searched after every configured directory.
    pub recipe_dirs: Vec<PathBuf>,
}

/// Everything an operation needs.
#[derive(Debug)]
pub struct OpsContext {
    pub repository: Repository,
    pub host: HostFacts,
    /// The project file in effect, if one was found.
    pub project: Option<PathBuf>,
}

impl OpsContext {
    /// Load the context for a command run in `cwd`.
    pub fn load(cwd: &Path, overrides: &HostOverrides) -> miette::Result<Self> {
        Self::load_with(&GlobalConfig::default_path(), cwd, overrides)
    }

    /// Like [`OpsContext::load`], reading the global configuration from `global_path`.
    pub fn load_with(
        global_path: &Path,
        cwd: &Path,
        overrides: &HostOverrides,
    ) -> miette::Result<Self> {
        let global = GlobalConfig::load_from(global_path)?;
        let global_dir = global_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(dirs_path);
        let project = ProjectConfig::discover(cwd)?;

        let mut repository = Repository::builtin()?;
        let mut dirs: Vec<PathBuf> = global
            .repository
            .paths
            .iter()
            .map(|p| if p.is_absolute() { p.clone() } else { global_dir.join(p) })
            .collect();
        if let Some(ref project) = project {
            dirs.extend(project.repository_paths());
        }
        dirs.extend(overrides.recipe_dirs.iter().map(|p| absolute(cwd, p)));
        for dir in &dirs {
            let count = repository.load_dir(dir)?;
            tracing::debug!("{count} recipes from {}", dir.display());
        }

        let mut host = HostFacts::default();
        global.apply(&mut host)?;
        if let Some(ref project) = project {
            project.apply(&mut host)?;
        }
        overrides.apply(cwd, &mut host)?;

        Ok(Self {
            repository,
            host,
            project: project.map(|p| p.root.join(fxpkg_core::config::PROJECT_FILE)),
        })
    }

    pub fn recipe(&self, name: &str) -> miette::Result<&Recipe> {
        Ok(self.repository.get(name)?)
    }
}

impl HostOverrides {
    /// Layer the command-line settings over `host`.
    pub fn apply(&self, cwd: &Path, host: &mut HostFacts) -> Result<(), FxError> {
        if let Some(ref compiler) = self.compiler {
            host.compiler = Some(Compiler::parse(compiler)?);
        }
        if let Some(jobs) = self.jobs {
            if jobs == 0 {
                return Err(config_error("--jobs must be at least 1".to_string()));
            }
            host.jobs = jobs;
        }
        for dep in &self.deps {
            let (name, version) = dep
                .split_once('@')
                .filter(|(name, version)| !name.is_empty() && !version.is_empty())
                .ok_or_else(|| config_error(format!("--dep '{dep}' is not NAME@VERSION")))?;
            let version = Version::parse(version)
                .map_err(|e| config_error(format!("--dep '{dep}': {e}")))?;
            facts_for(host, name).version = Some(version);
        }
        for libs in &self.libs {
            let (name, paths) = libs
                .split_once('=')
                .filter(|(name, paths)| !name.is_empty() && !paths.is_empty())
                .ok_or_else(|| config_error(format!("--libs '{libs}' is not NAME=PATH[,PATH]")))?;
            facts_for(host, name).libs = paths
                .split(',')
                .filter(|p| !p.is_empty())
                .map(|p| absolute(cwd, Path::new(p)))
                .collect();
        }
        Ok(())
    }
}

fn facts_for<'h>(host: &'h mut HostFacts, name: &str) -> &'h mut DependencyFacts {
    host.deps.entry(name.to_string()).or_default()
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

fn config_error(message: String) -> FxError {
    FxError::Config { message }
}
