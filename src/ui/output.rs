//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag.
//! When `--json` is enabled, output is machine-readable JSON.
//! Diagnostics go to stderr through `tracing`; this module only writes
//! what the user asked for.

use std::fmt::Display;

use crate::core::recipe::Recipe;
use crate::engine::exec::StageReport;
use crate::engine::plan::StagePlan;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rules with their counts, one per line, names padded to align.
fn format_rule_counts(rules: &[String], counts: &[usize]) -> String {
    let width = rules.iter().map(|r| r.len()).max().unwrap_or(0);
    rules
        .iter()
        .zip(counts)
        .map(|(rule, n)| format!("  {:<width$}  {}", rule, n, width = width))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a stage plan for humans.
pub fn format_plan(plan: &StagePlan, digest: &str) -> String {
    let mut lines = Vec::new();
    for dep in &plan.dependencies {
        lines.push(format!("{} ({} file(s))", dep.package, dep.ops.len()));
        for op in &dep.ops {
            let rule = plan.rules.get(op.rule).map(String::as_str).unwrap_or("?");
            lines.push(format!("  [{}] {} -> {}", rule, op.relative, op.dest.display()));
        }
    }
    lines.push(format!(
        "{} file(s) to copy into {}",
        plan.op_count(),
        plan.dest_root.display()
    ));
    lines.push(format!("digest: {digest}"));
    lines.join("\n")
}

/// Render a stage report for humans.
pub fn format_report(report: &StageReport) -> String {
    format!(
        "Staged {} file(s) from {} dependencies into {}\n{}",
        report.total(),
        report.dependencies.len(),
        report.dest_root.display(),
        format_rule_counts(&report.rules, &report.per_rule())
    )
}

/// Render the effective recipe for humans.
pub fn format_recipe(recipe: &Recipe, source: impl Display) -> String {
    let mut out = format!("{} {} ({})\n", recipe.name, recipe.version, source);

    out.push_str("requires:\n");
    out.push_str(&format_list(&recipe.requires, "  "));
    out.push('\n');

    if !recipe.transitive.is_empty() {
        out.push_str("transitive:\n");
        out.push_str(&format_list(&recipe.transitive, "  "));
        out.push('\n');
    }

    if !recipe.overrides.is_empty() {
        out.push_str("options:\n");
        out.push_str(&format_list(&recipe.overrides, "  "));
        out.push('\n');
    }

    out.push_str("copy:\n");
    out.push_str(&format_list(&recipe.rules, "  "));
    out.push('\n');

    let generators: Vec<String> = recipe.generators.iter().map(|g| g.to_string()).collect();
    out.push_str(&format!("generators: {}\n", generators.join(", ")));
    out.push_str(&format!("build_type: {}", recipe.build_type));
    out
}
