use super::Context;
use crate::output::{print_fields, print_json};
use agency_core::archive::Archive;
use agency_core::synthesis::StandardsLedger;
use agency_core::{io, paths, persona};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct Status {
    project: String,
    root: PathBuf,
    hq: PathBuf,
    hq_roles: usize,
    hq_skills: usize,
    archived_learnings: usize,
    standards: usize,
    team: Vec<String>,
    open_requests: usize,
    active_persona: Option<String>,
}

fn team_members(root: &Path) -> anyhow::Result<Vec<String>> {
    let dir = root.join(paths::TEAM_DIR);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut ids: Vec<String> = std::fs::read_dir(&dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|x| x == "md"))
        .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect();
    ids.sort();
    Ok(ids)
}

pub fn run(ctx: &Context) -> anyhow::Result<()> {
    let registry = ctx.registry()?;
    let archive = Archive::load(&ctx.hq)?;
    let ledger = StandardsLedger::load(&ctx.hq)?;
    let requests = io::read_or_empty(&paths::requests_log(&ctx.root))?;

    let status = Status {
        project: ctx.project_name()?,
        root: ctx.root.clone(),
        hq: ctx.hq.clone(),
        hq_roles: registry.roles().count(),
        hq_skills: registry.skills().count(),
        archived_learnings: archive.len(),
        standards: ledger.roles.values().map(Vec::len).sum(),
        team: team_members(&ctx.root)?,
        open_requests: requests.lines().filter(|l| l.starts_with("- ")).count(),
        active_persona: persona::active(&ctx.root)?,
    };

    if ctx.json {
        return print_json(&status);
    }
    let team = if status.team.is_empty() {
        "(none)".to_string()
    } else {
        status.team.join(", ")
    };
    print_fields(&[
        ("Project", status.project.clone()),
        ("Root", status.root.display().to_string()),
        ("HQ", status.hq.display().to_string()),
        (
            "Registry",
            format!("{} roles, {} skills", status.hq_roles, status.hq_skills),
        ),
        ("Archive", format!("{} learnings", status.archived_learnings)),
        ("Standards", status.standards.to_string()),
        ("Team", team),
        ("Requests", status.open_requests.to_string()),
        (
            "Persona",
            status.active_persona.clone().unwrap_or_else(|| "(none)".to_string()),
        ),
    ]);
    Ok(())
}
