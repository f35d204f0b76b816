use super::Context;
use crate::output::{print_json, print_table};
use agency_core::registry::{Capability, CapabilityKind};
use anyhow::Context as _;

pub fn run(ctx: &Context, kind: Option<&str>) -> anyhow::Result<()> {
    let kind: Option<CapabilityKind> = kind
        .map(str::parse::<CapabilityKind>)
        .transpose()
        .context("--kind must be 'role' or 'skill'")?;
    let registry = ctx.registry()?;
    let caps: Vec<&Capability> = registry
        .iter()
        .filter(|c| kind.map_or(true, |k| c.kind == k))
        .collect();

    if ctx.json {
        return print_json(&caps);
    }
    if caps.is_empty() {
        println!("No capabilities in {}.", ctx.hq.display());
        return Ok(());
    }
    let rows: Vec<Vec<String>> = caps
        .iter()
        .map(|c| {
            vec![
                c.identifier.clone(),
                c.kind.to_string(),
                c.tags.iter().cloned().collect::<Vec<_>>().join(", "),
            ]
        })
        .collect();
    print_table(&["ID", "KIND", "TAGS"], &rows);
    Ok(())
}
