//! Handler for `fxpkg info`.

use miette::Result;

use fxpkg_ops::ops_context::OpsContext;
use fxpkg_ops::ops_info;

pub fn exec(ctx: &OpsContext, name: &str) -> Result<()> {
    let recipe = ctx.recipe(name)?;
    print!("{}", ops_info::info(recipe));
    Ok(())
}
