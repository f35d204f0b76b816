//! Active persona: the single role a project's assistant is currently
//! playing, copied to `.ai-context/ACTIVE_PERSONA.md`.

use crate::error::{AgencyError, Result};
use crate::registry::{first_heading, CapabilityKind, Registry};
use crate::{io, paths, text};
use std::path::Path;

/// Make `role_id` the project's active persona. Only roles can be activated.
pub fn activate(registry: &Registry, root: &Path, role_id: &str) -> Result<String> {
    let id = text::normalize_identifier(role_id);
    let cap = registry
        .get(&id)
        .filter(|c| c.kind == CapabilityKind::Role)
        .ok_or_else(|| AgencyError::CapabilityNotFound(id.clone()))?;

    // Prefer the project's tuned copy when the role was hired already.
    let local = paths::team_member(root, &cap.identifier);
    let content = if local.exists() {
        std::fs::read_to_string(&local)?
    } else {
        std::fs::read_to_string(&cap.content_location)?
    };
    io::atomic_write(&paths::active_persona(root), content.as_bytes())?;
    tracing::info!(role = %cap.identifier, "persona activated");
    Ok(cap.identifier.clone())
}

/// Title of the active persona, if one is set.
pub fn active(root: &Path) -> Result<Option<String>> {
    let content = io::read_or_empty(&paths::active_persona(root))?;
    let title = first_heading(&content)
        .or_else(|| content.lines().map(str::trim).find(|l| !l.is_empty()))
        .map(str::to_string);
    Ok(title)
}
