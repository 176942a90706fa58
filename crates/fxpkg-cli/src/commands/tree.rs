//! Handler for `fxpkg tree`.

use miette::Result;

use fxpkg_ops::ops_context::OpsContext;
use fxpkg_ops::ops_tree::{self, TreeOptions};

pub fn exec(ctx: &OpsContext, request: &str, depth: Option<usize>) -> Result<()> {
    let opts = TreeOptions { depth };
    print!("{}", ops_tree::tree(ctx, request, &opts)?);
    Ok(())
}
