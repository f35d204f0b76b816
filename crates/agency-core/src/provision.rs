//! Provisioning: materialize a match result into a project's `.ai-context/`.
//!
//! Layout:
//!   .ai-context/team/<id>.md   roles
//!   .ai-context/skills/<id>/SKILL.md   skills
//!   .ai-context/HQ_REQUESTS.md   unresolved requests, one per line
//!
//! Existing local copies are never overwritten, so edits made to a hired
//! persona survive repeated hires.

use crate::error::Result;
use crate::inference::MatchResult;
use crate::registry::{CapabilityKind, Registry};
use crate::{io, paths};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const REQUESTS_HEADER: &str = "# HQ Capability Requests\n\n";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The project being provisioned.
#[derive(Debug, Clone)]
pub struct ProjectTarget {
    pub root: PathBuf,
    pub project_name: String,
}

impl ProjectTarget {
    pub fn new(root: impl Into<PathBuf>, project_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            project_name: project_name.into(),
        }
    }

    /// Local destination for a capability of the given kind.
    pub fn destination(&self, kind: CapabilityKind, id: &str) -> PathBuf {
        match kind {
            CapabilityKind::Role => paths::team_member(&self.root, id),
            CapabilityKind::Skill => paths::project_skill(&self.root, id),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvisionReport {
    pub copied: Vec<String>,
    pub skipped: Vec<String>,
    pub logged_missing: Vec<String>,
}

impl ProvisionReport {
    pub fn copied_count(&self) -> usize {
        self.copied.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn logged_missing_count(&self) -> usize {
        self.logged_missing.len()
    }
}

// ---------------------------------------------------------------------------
// Provisioning
// ---------------------------------------------------------------------------

pub fn provision(
    result: &MatchResult,
    registry: &Registry,
    target: &ProjectTarget,
) -> Result<ProvisionReport> {
    let mut report = ProvisionReport::default();

    // Read every master document before writing anything, so a broken
    // registry entry fails the hire without a partial copy.
    let mut pending: Vec<(String, PathBuf, String)> = Vec::new();
    for id in &result.resolved {
        let Some(cap) = registry.get(id) else {
            continue;
        };
        let dest = target.destination(cap.kind, &cap.identifier);
        if dest.exists() {
            tracing::debug!(id = %cap.identifier, "already provisioned, skipping");
            report.skipped.push(cap.identifier.clone());
            continue;
        }
        let content = std::fs::read_to_string(&cap.content_location)?;
        pending.push((cap.identifier.clone(), dest, content));
    }

    for (id, dest, content) in pending {
        if io::write_if_missing(&dest, content.as_bytes())? {
            tracing::info!(id = %id, dest = %dest.display(), "provisioned");
            report.copied.push(id);
        } else {
            report.skipped.push(id);
        }
    }

    report.logged_missing = log_missing(&target.root, &target.project_name, &result.unresolved)?;
    Ok(report)
}

fn request_line(term: &str, project: &str) -> String {
    format!("{term} (project: {project})")
}

/// Append unresolved requests to the project's request log, skipping exact
/// `(term, project)` repeats. Returns the newly logged terms.
pub fn log_missing(root: &Path, project: &str, terms: &BTreeSet<String>) -> Result<Vec<String>> {
    if terms.is_empty() {
        return Ok(Vec::new());
    }
    let path = paths::requests_log(root);
    let existing_text = io::read_or_empty(&path)?;
    let existing: BTreeSet<&str> = existing_text
        .lines()
        .filter_map(|l| l.trim().strip_prefix("- "))
        .map(str::trim)
        .collect();

    let mut logged = Vec::new();
    let mut block = String::new();
    if existing_text.trim().is_empty() {
        block.push_str(REQUESTS_HEADER);
    }
    for term in terms {
        let line = request_line(term, project);
        if existing.contains(line.as_str()) {
            continue;
        }
        block.push_str(&format!("- {line}\n"));
        logged.push(term.clone());
    }

    if !logged.is_empty() {
        io::append_text(&path, &block)?;
        tracing::warn!(count = logged.len(), log = %path.display(), "logged missing capabilities");
    }
    Ok(logged)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
