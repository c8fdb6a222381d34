//! recipe command - Show the effective recipe

use crate::core::config::load_recipe;
use crate::engine::Context;
use crate::ui::output::{self, Verbosity};
use anyhow::{Context as _, Result};

/// Print the recipe that `stage` and `install` would use.
pub fn recipe(ctx: &Context, json: bool) -> Result<()> {
    let cwd = ctx.cwd().context("cannot determine working directory")?;
    let loaded = load_recipe(ctx.recipe.as_deref(), &cwd).context("failed to load recipe")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&loaded.recipe)?);
        return Ok(());
    }

    output::print(
        output::format_recipe(&loaded.recipe, &loaded.source),
        Verbosity::from_flags(ctx.quiet, ctx.debug),
    );
    Ok(())
}
