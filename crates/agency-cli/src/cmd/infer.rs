use super::{load_config, Context};
use crate::output::{print_json, print_table};
use agency_core::inference::{infer, MatchEvidence, RequirementSpec};
use std::path::Path;

pub fn run(ctx: &Context, text: Option<&str>, config: Option<&Path>) -> anyhow::Result<()> {
    let spec = match text {
        Some(text) => RequirementSpec::from_text(text),
        None => load_config(ctx, config)?.requirement_spec(),
    };
    if spec.is_empty() {
        anyhow::bail!("nothing to infer from: pass requirements text or a config with requests");
    }

    let registry = ctx.registry()?;
    let result = infer(&spec, &registry);

    if ctx.json {
        return print_json(&result);
    }

    let mut rows: Vec<Vec<String>> = result
        .resolved
        .iter()
        .map(|id| {
            let kind = registry
                .get(id)
                .map(|c| c.kind.to_string())
                .unwrap_or_default();
            let why = match result.evidence.get(id) {
                Some(MatchEvidence::Explicit) | None => "requested".to_string(),
                Some(MatchEvidence::Keywords { tags }) => {
                    tags.iter().cloned().collect::<Vec<_>>().join(", ")
                }
            };
            vec![id.clone(), kind, why]
        })
        .collect();
    rows.extend(
        result
            .unresolved
            .iter()
            .map(|id| vec![id.clone(), "-".to_string(), "not in registry".to_string()]),
    );

    if rows.is_empty() {
        println!("No capabilities matched.");
        return Ok(());
    }
    print_table(&["ID", "KIND", "MATCHED ON"], &rows);
    Ok(())
}
