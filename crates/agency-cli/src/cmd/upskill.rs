use super::Context;
use crate::output::{print_json, print_table};
use agency_core::archive::Archive;
use agency_core::config::HqConfig;
use agency_core::feedback::{self, QualityReport};
use agency_core::synthesis::{synthesize, SynthesisOutcome, SynthesisReport};
use serde::Serialize;

#[derive(Serialize)]
struct UpskillOutput {
    synthesis: SynthesisReport,
    quality: QualityReport,
}

pub fn run(ctx: &Context) -> anyhow::Result<()> {
    let config = HqConfig::load(&ctx.hq)?;
    let registry = ctx.registry()?;
    let archive = Archive::load(&ctx.hq)?;

    let report = synthesize(&archive, &registry, &ctx.hq, &config.synthesis)?;
    let quality = feedback::update_quality(&ctx.hq)?;

    if ctx.json {
        return print_json(&UpskillOutput {
            synthesis: report,
            quality,
        });
    }

    let rows: Vec<Vec<String>> = report
        .standards
        .iter()
        .filter(|s| s.outcome != SynthesisOutcome::Unchanged)
        .map(|s| {
            let outcome = match s.outcome {
                SynthesisOutcome::Created => "created",
                SynthesisOutcome::Merged => "merged",
                SynthesisOutcome::Unchanged => "unchanged",
            };
            vec![s.role.clone(), s.section_title.clone(), outcome.to_string()]
        })
        .collect();
    if !rows.is_empty() {
        print_table(&["ROLE", "STANDARD", "OUTCOME"], &rows);
    }
    println!(
        "{} created, {} merged, {} unchanged, {} pending, {} unrouted",
        report.created, report.merged, report.unchanged, report.pending, report.unrouted
    );
    Ok(())
}
