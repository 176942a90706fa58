//! Operation: display the dependency tree of a request.

use fxpkg_core::request::Request;
use fxpkg_resolver::graph::build_tree;

use crate::ops_context::OpsContext;

/// Options for the tree display.
#[derive(Debug, Clone, Default)]
pub struct TreeOptions {
    /// Stop printing below this depth.
    pub depth: Option<usize>,
}

/// Configure `request` and every recipe it reaches, returning the printed tree.
pub fn tree(ctx: &OpsContext, request: &str, opts: &TreeOptions) -> miette::Result<String> {
    let request = Request::parse(request)?;
    let tree = build_tree(&ctx.repository, &request, &ctx.host)?;
    tracing::debug!("dependency tree has {} nodes", tree.len());
    Ok(tree.print_tree(opts.depth))
}
