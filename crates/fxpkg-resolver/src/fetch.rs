//! Where to get the sources for a resolved configuration.

use serde::Serialize;
use std::fmt;

use fxpkg_core::recipe::VersionSource;

use crate::resolver::Configuration;

/// The source location of the selected version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FetchSource {
    /// A checksummed release archive.
    Archive { url: String, sha256: String },
    /// A live branch; `no_cache` means the checkout must never be reused.
    Git {
        url: String,
        branch: String,
        no_cache: bool,
    },
}

/// Everything needed to obtain and prepare the sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchDescriptor {
    pub source: FetchSource,
    /// Patch files to apply, in declaration order.
    pub patches: Vec<String>,
    /// Sub-directory of the sources the build tool runs in.
    pub build_directory: Option<String>,
}

impl FetchDescriptor {
    pub fn for_configuration(config: &Configuration<'_>) -> Self {
        let source = match &config.version.source {
            VersionSource::Archive { url, sha256 } => FetchSource::Archive {
                url: url.clone(),
                sha256: sha256.clone(),
            },
            VersionSource::Branch {
                git,
                branch,
                no_cache,
            } => FetchSource::Git {
                url: git.clone(),
                branch: branch.clone(),
                no_cache: *no_cache,
            },
        };
        let patches = config
            .recipe
            .patches
            .iter()
            .filter(|p| p.when.evaluate(config))
            .map(|p| p.file.clone())
            .collect();
        Self {
            source,
            patches,
            build_directory: config.recipe.build_directory.clone(),
        }
    }
}

impl fmt::Display for FetchDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            FetchSource::Archive { url, sha256 } => {
                writeln!(f, "archive: {url}")?;
                writeln!(f, "sha256:  {sha256}")?;
            }
            FetchSource::Git {
                url,
                branch,
                no_cache,
            } => {
                writeln!(f, "git:     {url}")?;
                write!(f, "branch:  {branch}")?;
                if *no_cache {
                    write!(f, " (no cache)")?;
                }
                writeln!(f)?;
            }
        }
        for patch in &self.patches {
            writeln!(f, "patch:   {patch}")?;
        }
        if let Some(ref dir) = self.build_directory {
            writeln!(f, "build-directory: {dir}")?;
        }
        Ok(())
    }
}
