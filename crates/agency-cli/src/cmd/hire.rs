use super::{load_config, Context};
use crate::output::print_json;
use agency_core::config::HqConfig;
use agency_core::inference::{infer, RequirementSpec};
use agency_core::persona;
use agency_core::provision::{provision, ProjectTarget, ProvisionReport};
use agency_core::registry::CapabilityKind;
use agency_core::text;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct HireOutput<'a> {
    project: &'a str,
    hq: &'a Path,
    #[serde(flatten)]
    report: &'a ProvisionReport,
    persona: Option<&'a str>,
}

pub fn run(ctx: &Context, role: Option<&str>, config: Option<&Path>) -> anyhow::Result<()> {
    let registry = ctx.registry()?;

    let (spec, project) = match role {
        Some(role) => {
            let spec = RequirementSpec {
                explicit_roles: [role.to_string()].into(),
                ..Default::default()
            };
            (spec, ctx.project_name()?)
        }
        None => {
            let config = load_config(ctx, config)?;
            let mut spec = config.requirement_spec();
            spec.explicit_roles
                .extend(HqConfig::load(&ctx.hq)?.default_roles);
            (spec, config.project_name_or(&ctx.root))
        }
    };

    let result = infer(&spec, &registry);
    let target = ProjectTarget::new(&ctx.root, project.as_str());
    let report = provision(&result, &registry, &target)?;

    // Hiring a single role also puts it on duty.
    let activated = match role.map(text::normalize_identifier) {
        Some(id)
            if result.resolved.contains(&id)
                && registry.get(&id).is_some_and(|c| c.kind == CapabilityKind::Role) =>
        {
            Some(persona::activate(&registry, &ctx.root, &id)?)
        }
        _ => None,
    };

    if ctx.json {
        return print_json(&HireOutput {
            project: &project,
            hq: &ctx.hq,
            report: &report,
            persona: activated.as_deref(),
        });
    }

    for id in &report.copied {
        println!("hired    {id}");
    }
    for id in &report.skipped {
        println!("present  {id}");
    }
    for term in &report.logged_missing {
        println!("missing  {term} (requested from HQ)");
    }
    if let Some(id) = &activated {
        println!("active   {id}");
    }
    println!(
        "{project}: {} hired, {} already present, {} requested",
        report.copied_count(),
        report.skipped_count(),
        report.logged_missing_count()
    );
    Ok(())
}
