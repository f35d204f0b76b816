use super::Context;
use crate::output::print_json;
use agency_core::feedback::{self, FeedbackResult};
use anyhow::Context as _;

pub fn run(ctx: &Context, skill: &str, result: &str, note: &str) -> anyhow::Result<()> {
    let result: FeedbackResult = result
        .parse()
        .with_context(|| format!("unknown result '{result}', expected helpful, neutral, or harmful"))?;
    let project = ctx.project_name()?;
    let event = feedback::record(&ctx.root, &project, skill, result, note)?;

    if ctx.json {
        return print_json(&event);
    }
    println!(
        "Recorded {} feedback for '{}' [{}]",
        event.result, event.skill_id, event.context_hash
    );
    Ok(())
}
