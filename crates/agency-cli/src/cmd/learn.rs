use super::Context;
use crate::output::print_json;
use agency_core::archive::Archive;
use agency_core::feedback::{self, CollectReport};
use agency_core::harvest::{harvest, HarvestReport};
use agency_core::paths;
use anyhow::Context as _;
use serde::Serialize;

#[derive(Serialize)]
struct LearnOutput {
    project: String,
    harvest: HarvestReport,
    feedback: CollectReport,
}

pub fn run(ctx: &Context) -> anyhow::Result<()> {
    let project = ctx.project_name()?;
    let mut archive = Archive::load(&ctx.hq)
        .with_context(|| format!("failed to load archive at {}", ctx.hq.display()))?;

    let report = harvest(&paths::context_doc(&ctx.root), &project, &mut archive)?;
    let collected = feedback::collect(&ctx.root, &ctx.hq)?;

    if ctx.json {
        return print_json(&LearnOutput {
            project,
            harvest: report,
            feedback: collected,
        });
    }

    for warning in &report.warnings {
        println!("warning: {warning}");
    }
    println!(
        "{project}: {} learnings archived, {} already known",
        report.archived, report.skipped
    );
    if collected.collected > 0 {
        println!("{} skill feedback events collected", collected.collected);
    }
    Ok(())
}
