//! install command - Stage, then configure, build and install with CMake

use super::session;
use crate::cli::args::StageTarget;
use crate::engine::driver::CMakeDriver;
use crate::engine::runner::Pipeline;
use crate::engine::{run_build_sequence, Context};
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Run the full recipe.
///
/// The CMake driver is built after staging so that it sees the applied
/// option model.
pub fn install(ctx: &Context, target: &StageTarget, skip_build: bool) -> Result<()> {
    let session = session::open(ctx, target)?;
    let recipe = &session.recipe;
    let pipeline = Pipeline::new(recipe, &session.resolver, &session.dest);

    let staged = pipeline.stage()?;
    output::print(output::format_report(&staged.report), session.verbosity);

    if skip_build {
        output::print("Skipping build (--skip-build)", session.verbosity);
        return Ok(());
    }

    let mut driver = CMakeDriver::new(
        session.config.cmake(),
        &recipe.source_dir,
        &recipe.build_dir,
        &session.dest,
    )
    .with_options(&staged.options);
    driver.build_type = recipe.build_type;
    driver.verbose = recipe.verbose;

    run_build_sequence(&mut driver)
        .with_context(|| format!("build of '{}' failed", recipe.name))?;

    output::print(
        format!("Installed {} into {}", recipe.name, session.dest.display()),
        session.verbosity,
    );
    Ok(())
}
