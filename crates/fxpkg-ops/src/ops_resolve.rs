//! Operations: resolve a request, and the two views of a resolution that
//! build drivers consume (build arguments and the fetch descriptor).

use std::fmt::Write;

use fxpkg_core::request::Request;
pub use fxpkg_resolver::Resolution;

use crate::ops_context::OpsContext;
use crate::{to_json, OutputFormat};

/// Parse `request` and resolve it against the context's repository and host.
pub fn resolve(ctx: &OpsContext, request: &str) -> miette::Result<Resolution> {
    let request = Request::parse(request)?;
    let recipe = ctx.recipe(&request.name)?;
    tracing::debug!("resolving {request}");
    Ok(fxpkg_resolver::resolve(recipe, &request, &ctx.host)?)
}

/// Render a full resolution.
pub fn render(resolution: &Resolution, format: OutputFormat) -> miette::Result<String> {
    match format {
        OutputFormat::Json => to_json(resolution),
        OutputFormat::Text => Ok(render_text(resolution)),
    }
}

/// The build arguments, one per line, as the recipe's build tool takes them.
pub fn render_args(resolution: &Resolution, format: OutputFormat) -> miette::Result<String> {
    match format {
        OutputFormat::Json => to_json(&resolution.rendered_args()),
        OutputFormat::Text => Ok(lines(resolution.rendered_args())),
    }
}

pub fn render_fetch(resolution: &Resolution, format: OutputFormat) -> miette::Result<String> {
    match format {
        OutputFormat::Json => to_json(&resolution.fetch),
        OutputFormat::Text => Ok(resolution.fetch.to_string()),
    }
}

fn render_text(resolution: &Resolution) -> String {
    let mut out = String::new();
    let _ = write!(out, "{}@{}", resolution.package, resolution.version);
    if resolution.deprecated {
        out.push_str(" (deprecated)");
    }
    out.push('\n');
    if let Some(ref compiler) = resolution.compiler {
        let _ = writeln!(out, "  compiler: {compiler}");
    }

    if !resolution.variants.is_empty() {
        let _ = writeln!(out, "\nVariants:");
        for (name, value) in &resolution.variants {
            let _ = writeln!(out, "  {}", value.fragment(name));
        }
    }

    if !resolution.dependencies.is_empty() {
        let _ = writeln!(out, "\nDependencies:");
        for dep in &resolution.dependencies {
            let _ = writeln!(out, "  {dep}");
        }
    }

    if !resolution.args.is_empty() {
        let _ = writeln!(out, "\nBuild arguments ({}):", resolution.build_system);
        for arg in &resolution.args {
            let _ = writeln!(out, "  {arg}");
        }
    }

    let _ = writeln!(out, "\nFetch:");
    for line in resolution.fetch.to_string().lines() {
        let _ = writeln!(out, "  {line}");
    }
    out
}

fn lines(items: Vec<String>) -> String {
    items.into_iter().map(|line| line + "\n").collect()
}
