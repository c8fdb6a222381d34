//! Shared setup for commands that stage: config, recipe, paths.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::cli::args::StageTarget;
use crate::core::config::{load_recipe, Config, RecipeSource};
use crate::core::recipe::Recipe;
use crate::engine::resolve::LocalCacheResolver;
use crate::engine::Context;
use crate::ui::output::Verbosity;

/// Everything a staging command needs, resolved from flags and config.
pub(super) struct Session {
    pub config: Config,
    pub recipe: Recipe,
    pub source: RecipeSource,
    pub dest: PathBuf,
    pub resolver: LocalCacheResolver,
    pub verbosity: Verbosity,
}

/// Load config and recipe, and settle the staging and cache roots.
pub(super) fn open(ctx: &Context, target: &StageTarget) -> Result<Session> {
    let cwd = ctx.cwd().context("cannot determine working directory")?;
    let config = Config::load().context("failed to load ubistage config")?;
    let loaded = load_recipe(ctx.recipe.as_deref(), &cwd).context("failed to load recipe")?;

    let dest = anchor(&cwd, target.dest.as_deref().unwrap_or(Path::new(".")));
    let cache = match &target.cache {
        Some(dir) => anchor(&cwd, dir),
        None => config.cache_dir()?,
    };

    let mut recipe = loaded.recipe;
    if let Some(verbose) = config.verbose() {
        recipe.verbose = verbose;
    }

    tracing::debug!(
        recipe = %recipe.name,
        source = %loaded.source,
        dest = %dest.display(),
        cache = %cache.display(),
        "session opened"
    );

    Ok(Session {
        config,
        recipe,
        source: loaded.source,
        dest,
        resolver: LocalCacheResolver::new(cache),
        verbosity: Verbosity::from_flags(ctx.quiet, ctx.debug),
    })
}

fn anchor(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
