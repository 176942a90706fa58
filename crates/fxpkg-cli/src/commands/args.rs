//! Handler for `fxpkg args`.

use miette::Result;

use fxpkg_ops::ops_context::OpsContext;
use fxpkg_ops::ops_resolve;
use fxpkg_ops::OutputFormat;

pub fn exec(ctx: &OpsContext, request: &str, json: bool) -> Result<()> {
    let resolution = super::resolve_request(ctx, request)?;
    print!(
        "{}",
        ops_resolve::render_args(&resolution, OutputFormat::from_json_flag(json))?
    );
    Ok(())
}
