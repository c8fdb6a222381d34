//! stage command - Copy dependency artifacts and run generators

use super::session;
use crate::cli::args::StageTarget;
use crate::engine::runner::{Pipeline, PipelineError};
use crate::engine::Context;
use crate::ui::output;
use anyhow::Result;

/// Stage the recipe's dependencies into the staging root.
pub fn stage(ctx: &Context, target: &StageTarget, json: bool) -> Result<()> {
    let session = session::open(ctx, target)?;
    let pipeline = Pipeline::new(&session.recipe, &session.resolver, &session.dest);

    let staged = match pipeline.stage() {
        Ok(staged) => staged,
        Err(PipelineError::Staging(err)) => {
            if let Some(partial) = err.partial_report() {
                output::warn(
                    format!("{} file(s) were copied before the failure", partial.total()),
                    session.verbosity,
                );
            }
            return Err(PipelineError::Staging(err).into());
        }
        Err(err) => return Err(err.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&staged.report)?);
        return Ok(());
    }

    output::print(output::format_report(&staged.report), session.verbosity);
    for path in &staged.generated {
        output::print(format!("Generated {}", path.display()), session.verbosity);
    }
    Ok(())
}
