//! Command dispatch and handler modules.

mod args;
mod fetch;
mod info;
mod list;
mod resolve;
mod tree;

use miette::Result;

use fxpkg_ops::ops_context::{HostOverrides, OpsContext};
use fxpkg_ops::ops_resolve::{self, Resolution};
use fxpkg_util::errors::FxError;
use fxpkg_util::status;

use crate::cli::{Cli, Command, HostArgs};

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    let ctx = load_context(cli.host)?;
    match cli.command {
        Command::List { pattern, json } => list::exec(&ctx, pattern.as_deref(), json),
        Command::Info { name } => info::exec(&ctx, &name),
        Command::Resolve { request } => resolve::exec(&ctx, &request.text(), request.json),
        Command::Args { request } => args::exec(&ctx, &request.text(), request.json),
        Command::Fetch { request } => fetch::exec(&ctx, &request.text(), request.json),
        Command::Tree { request, depth } => tree::exec(&ctx, &request.join(" "), depth),
    }
}

fn load_context(host: HostArgs) -> Result<OpsContext> {
    let cwd = std::env::current_dir().map_err(FxError::Io)?;
    let overrides = HostOverrides {
        compiler: host.compiler,
        jobs: host.jobs,
        deps: host.deps,
        libs: host.libs,
        recipe_dirs: host.recipe_dirs,
    };
    let ctx = OpsContext::load(&cwd, &overrides)?;
    if let Some(ref project) = ctx.project {
        tracing::debug!("using project file {}", project.display());
    }
    Ok(ctx)
}

/// Resolve `request`, reporting progress on stderr.
fn resolve_request(ctx: &OpsContext, request: &str) -> Result<Resolution> {
    status::status("Resolving", request);
    let resolution = ops_resolve::resolve(ctx, request)?;
    if resolution.deprecated {
        status::status_warn(
            "Deprecated",
            &format!("{}@{}", resolution.package, resolution.version),
        );
    }
    Ok(resolution)
}
