//! plan command - Show what staging would copy

use super::session;
use crate::cli::args::StageTarget;
use crate::engine::runner::Pipeline;
use crate::engine::Context;
use crate::ui::output;
use anyhow::Result;

/// Print the stage plan without writing anything.
pub fn plan(ctx: &Context, target: &StageTarget, json: bool) -> Result<()> {
    let session = session::open(ctx, target)?;
    let pipeline = Pipeline::new(&session.recipe, &session.resolver, &session.dest);
    let plan = pipeline.plan()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    output::print(
        format!("{} ({})", session.recipe.name, session.source),
        session.verbosity,
    );
    if plan.is_empty() {
        output::warn("no files match the copy rules", session.verbosity);
    }
    let digest = plan.digest()?;
    output::print(output::format_plan(&plan, &digest), session.verbosity);
    Ok(())
}
