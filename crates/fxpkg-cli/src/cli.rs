//! CLI argument definitions for fxpkg.
//!
//! Uses `clap` derive macros to define the command surface. Each command
//! corresponds to a handler in the [`super::commands`] module.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "fxpkg",
    version,
    about = "Resolve FEniCS package recipes into build configurations",
    long_about = "fxpkg selects a version, values every variant, checks conflict rules and \
                  merges dependency constraints for a FEniCS recipe, then emits the build \
                  arguments and source location a build driver needs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub host: HostArgs,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Host facts given on the command line; these win over configuration files.
#[derive(Args, Debug, Default)]
pub struct HostArgs {
    /// Compiler building the package, e.g. gcc@13.2
    #[arg(long, global = true, env = "FXPKG_COMPILER")]
    pub compiler: Option<String>,

    /// Parallel build jobs
    #[arg(short, long, global = true, env = "FXPKG_JOBS")]
    pub jobs: Option<u32>,

    /// Installed dependency version, NAME@VERSION (repeatable)
    #[arg(long = "dep", global = true, value_name = "NAME@VERSION")]
    pub deps: Vec<String>,

    /// Located libraries of a dependency, NAME=PATH[,PATH] (repeatable)
    #[arg(long, global = true, value_name = "NAME=PATHS")]
    pub libs: Vec<String>,

    /// Extra recipe directory (repeatable)
    #[arg(long = "recipes", global = true, value_name = "DIR")]
    pub recipe_dirs: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available recipes
    List {
        /// Only recipes whose name matches this glob
        pattern: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show everything a recipe declares
    Info {
        /// Package name
        name: String,
    },

    /// Resolve a request into a full configuration
    Resolve {
        #[command(flatten)]
        request: RequestArgs,
    },

    /// Print the build arguments for a request
    Args {
        #[command(flatten)]
        request: RequestArgs,
    },

    /// Print where to fetch the sources for a request
    Fetch {
        #[command(flatten)]
        request: RequestArgs,
    },

    /// Display the dependency tree of a request
    Tree {
        /// Request, e.g. fenics-dolfinx@0.9.0 +petsc partitioners=parmetis,scotch
        #[arg(required = true, num_args = 1..)]
        request: Vec<String>,
        /// Maximum depth to display
        #[arg(short, long)]
        depth: Option<usize>,
    },
}

/// A request spread over one or more words, plus the output format.
#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Request, e.g. fenics-dolfinx@0.9.0 +petsc partitioners=parmetis,scotch %gcc@13.2
    #[arg(required = true, num_args = 1..)]
    pub request: Vec<String>,

    /// Print JSON
    #[arg(long)]
    pub json: bool,
}

impl RequestArgs {
    pub fn text(&self) -> String {
        self.request.join(" ")
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
