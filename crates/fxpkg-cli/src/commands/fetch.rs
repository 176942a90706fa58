//! Handler for `fxpkg fetch`.

use miette::Result;

use fxpkg_ops::ops_context::OpsContext;
use fxpkg_ops::ops_resolve;
use fxpkg_ops::OutputFormat;
use fxpkg_util::status;

pub fn exec(ctx: &OpsContext, request: &str, json: bool) -> Result<()> {
    let resolution = super::resolve_request(ctx, request)?;
    if !resolution.fetch.patches.is_empty() {
        status::status_info(
            "Patches",
            &format!("{} to apply", resolution.fetch.patches.len()),
        );
    }
    print!(
        "{}",
        ops_resolve::render_fetch(&resolution, OutputFormat::from_json_flag(json))?
    );
    Ok(())
}
