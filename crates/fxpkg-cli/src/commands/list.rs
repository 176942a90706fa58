//! Handler for `fxpkg list`.

use miette::Result;

use fxpkg_ops::ops_context::OpsContext;
use fxpkg_ops::ops_list;
use fxpkg_ops::OutputFormat;

pub fn exec(ctx: &OpsContext, pattern: Option<&str>, json: bool) -> Result<()> {
    let summaries = ops_list::list(&ctx.repository, pattern)?;
    let format = OutputFormat::from_json_flag(json);
    if summaries.is_empty() && format == OutputFormat::Text {
        println!("No recipes match '{}'", pattern.unwrap_or("*"));
        return Ok(());
    }
    print!("{}", ops_list::render(&summaries, format)?);
    Ok(())
}
