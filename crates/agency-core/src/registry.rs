//! Capability registry: the master catalog of roles and skills in an HQ.
//!
//! Layout:
//!   roles/<id>.md   one document per role
//!   skills/<id>/SKILL.md   one directory per skill (README.md accepted)
//!   registry.yaml   optional manifest: id → {kind, tags, path}
//!
//! Without a manifest, tags are derived from the identifier and the first
//! Markdown heading of each document.

use crate::error::{AgencyError, Result};
use crate::{paths, text};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// CapabilityKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    Role,
    Skill,
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CapabilityKind::Role => "role",
            CapabilityKind::Skill => "skill",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for CapabilityKind {
    type Err = AgencyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "role" | "agent" => Ok(CapabilityKind::Role),
            "skill" => Ok(CapabilityKind::Skill),
            other => Err(AgencyError::InvalidIdentifier(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub identifier: String,
    pub kind: CapabilityKind,
    pub tags: BTreeSet<String>,
    pub content_location: PathBuf,
}

impl Capability {
    pub fn new(
        identifier: &str,
        kind: CapabilityKind,
        tags: impl IntoIterator<Item = impl AsRef<str>>,
        content_location: impl Into<PathBuf>,
    ) -> Self {
        Self {
            identifier: text::normalize_identifier(identifier),
            kind,
            tags: tags
                .into_iter()
                .map(|t| text::normalize_tag(t.as_ref()))
                .filter(|t| !t.is_empty())
                .collect(),
            content_location: content_location.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct ManifestEntry {
    kind: CapabilityKind,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct FrontMatter {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Registry {
    capabilities: BTreeMap<String, Capability>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from capabilities, rejecting duplicate identifiers.
    pub fn from_capabilities(caps: impl IntoIterator<Item = Capability>) -> Result<Self> {
        let mut registry = Self::new();
        for cap in caps {
            registry.insert(cap)?;
        }
        Ok(registry)
    }

    pub fn insert(&mut self, cap: Capability) -> Result<()> {
        if cap.identifier.is_empty() {
            return Err(AgencyError::InvalidIdentifier(
                cap.content_location.display().to_string(),
            ));
        }
        if !text::is_path_safe_identifier(&cap.identifier) {
            tracing::warn!(id = %cap.identifier, "rejected capability identifier with path components");
            return Err(AgencyError::InvalidIdentifier(cap.identifier));
        }
        if let Some(existing) = self.capabilities.get(&cap.identifier) {
            return Err(AgencyError::DuplicateCapability {
                id: cap.identifier.clone(),
                first: existing.content_location.clone(),
                second: cap.content_location,
            });
        }
        self.capabilities.insert(cap.identifier.clone(), cap);
        Ok(())
    }

    /// Load the registry of the HQ at `hq`. A missing HQ yields an empty registry.
    pub fn load(hq: &Path) -> Result<Self> {
        let manifest = paths::registry_manifest(hq);
        let registry = if manifest.exists() {
            Self::load_manifest(hq, &manifest)?
        } else {
            Self::scan(hq)?
        };
        tracing::debug!(
            hq = %hq.display(),
            roles = registry.roles().count(),
            skills = registry.skills().count(),
            "loaded capability registry"
        );
        Ok(registry)
    }

    fn load_manifest(hq: &Path, manifest: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(manifest)?;
        let entries: BTreeMap<String, ManifestEntry> = if data.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_yaml::from_str(&data).map_err(|e| AgencyError::ConfigInvalid {
                path: manifest.to_path_buf(),
                message: e.to_string(),
            })?
        };

        let mut registry = Self::new();
        for (raw_id, entry) in entries {
            let id = text::normalize_identifier(&raw_id);
            let location = match entry.path {
                Some(p) => hq.join(p),
                None => match entry.kind {
                    CapabilityKind::Role => paths::role_doc(hq, &id),
                    CapabilityKind::Skill => paths::skill_doc(hq, &id),
                },
            };
            let tags: BTreeSet<String> = if entry.tags.is_empty() {
                let title = document_title(&location)?;
                text::derive_tags(&id, &title)
            } else {
                entry.tags.iter().map(|t| text::normalize_tag(t)).collect()
            };
            registry.insert(Capability::new(&id, entry.kind, tags, location))?;
        }
        Ok(registry)
    }

    fn scan(hq: &Path) -> Result<Self> {
        let mut registry = Self::new();

        let roles_dir = hq.join(paths::ROLES_DIR);
        if roles_dir.is_dir() {
            let mut files: Vec<PathBuf> = std::fs::read_dir(&roles_dir)?
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && p.extension().is_some_and(|x| x == "md"))
                .collect();
            files.sort();
            for path in files {
                let Some(stem) = path.file_stem() else {
                    continue;
                };
                let id = text::normalize_identifier(&stem.to_string_lossy());
                let title = document_title(&path)?;
                let tags = text::derive_tags(&id, &title);
                registry.insert(Capability::new(&id, CapabilityKind::Role, tags, path))?;
            }
        }

        let skills_dir = hq.join(paths::SKILLS_DIR);
        if skills_dir.is_dir() {
            let mut dirs: Vec<PathBuf> = std::fs::read_dir(&skills_dir)?
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.is_dir())
                .collect();
            dirs.sort();
            for dir in dirs {
                let doc = [paths::SKILL_FILE, "README.md"]
                    .iter()
                    .map(|f| dir.join(f))
                    .find(|p| p.is_file());
                let Some(doc) = doc else {
                    tracing::warn!(dir = %dir.display(), "skill directory has no SKILL.md, skipping");
                    continue;
                };
                let Some(name) = dir.file_name() else {
                    continue;
                };
                let id = text::normalize_identifier(&name.to_string_lossy());
                let content = std::fs::read_to_string(&doc)?;
                let (front, body) = split_front_matter(&content);
                let title = first_heading(body)
                    .map(str::to_string)
                    .or_else(|| front.as_ref().and_then(|f| f.name.clone()))
                    .unwrap_or_default();
                let mut tags = text::derive_tags(&id, &title);
                if let Some(front) = front {
                    tags.extend(front.tags.iter().map(|t| text::normalize_tag(t)));
                }
                registry.insert(Capability::new(&id, CapabilityKind::Skill, tags, doc))?;
            }
        }

        Ok(registry)
    }

    // ---------------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------------

    /// Look up by identifier, normalizing the query first.
    pub fn get(&self, id: &str) -> Option<&Capability> {
        self.capabilities.get(&text::normalize_identifier(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.capabilities.values()
    }

    pub fn roles(&self) -> impl Iterator<Item = &Capability> {
        self.iter().filter(|c| c.kind == CapabilityKind::Role)
    }

    pub fn skills(&self) -> impl Iterator<Item = &Capability> {
        self.iter().filter(|c| c.kind == CapabilityKind::Skill)
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    pub fn read_content(&self, id: &str) -> Result<String> {
        let cap = self
            .get(id)
            .ok_or_else(|| AgencyError::CapabilityNotFound(id.to_string()))?;
        Ok(std::fs::read_to_string(&cap.content_location)?)
    }
}

// ---------------------------------------------------------------------------
// Document helpers
// ---------------------------------------------------------------------------

/// Title of a capability document, or an empty string if it has none or does
/// not exist yet.
fn document_title(path: &Path) -> Result<String> {
    let content = crate::io::read_or_empty(path)?;
    let (front, body) = split_front_matter(&content);
    Ok(first_heading(body)
        .map(str::to_string)
        .or_else(|| front.and_then(|f| f.name))
        .unwrap_or_default())
}

/// First Markdown heading text, without the leading `#`s.
pub fn first_heading(markdown: &str) -> Option<&str> {
    markdown
        .lines()
        .map(str::trim)
        .find(|l| l.starts_with('#'))
        .map(|l| l.trim_start_matches('#').trim())
        .filter(|l| !l.is_empty())
}

/// Split optional `---` YAML front matter from the body. Unparsable front
/// matter is ignored with a warning.
fn split_front_matter(content: &str) -> (Option<FrontMatter>, &str) {
    let Some(rest) = content.strip_prefix("---") else {
        return (None, content);
    };
    let Some(end) = rest.find("\n---") else {
        return (None, content);
    };
    let yaml = &rest[..end];
    let body = rest[end + 4..].trim_start_matches(['\r', '\n']);
    match serde_yaml::from_str::<FrontMatter>(yaml) {
        Ok(front) => (Some(front), body),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unparsable front matter");
            (None, body)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn scan_derives_tags_from_headings() {
        let dir = TempDir::new().unwrap();
        let hq = dir.path();
        write(&paths::role_doc(hq, "architect"), "# System Architect\n\nDesigns things.\n");
        write(
            &paths::skill_doc(hq, "accessibility"),
            "---\nname: accessibility\ntags: [a11y, WCAG]\n---\n# Accessibility Review\n",
        );

        let registry = Registry::load(hq).unwrap();
        assert_eq!(registry.len(), 2);

        let architect = registry.get("architect").unwrap();
        assert_eq!(architect.kind, CapabilityKind::Role);
        assert!(architect.tags.contains("architect"));
        assert!(architect.tags.contains("system"));

        let skill = registry.get("Accessibility").unwrap();
        assert_eq!(skill.kind, CapabilityKind::Skill);
        assert!(skill.tags.contains("a11y"));
        assert!(skill.tags.contains("wcag"));
        assert!(skill.tags.contains("review"));
    }

    #[test]
    fn manifest_overrides_scan() {
        let dir = TempDir::new().unwrap();
        let hq = dir.path();
        write(&paths::role_doc(hq, "architect"), "# Architect\n");
        write(&paths::role_doc(hq, "unlisted"), "# Unlisted\n");
        write(
            &paths::registry_manifest(hq),
            "architect:\n  kind: role\n  tags: [Design, planning]\naccessibility:\n  kind: skill\n  tags: [accessibility, a11y]\n",
        );

        let registry = Registry::load(hq).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(!registry.contains("unlisted"));
        let tags: Vec<&str> = registry
            .get("architect")
            .unwrap()
            .tags
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(tags, vec!["design", "planning"]);
        assert_eq!(
            registry.get("accessibility").unwrap().content_location,
            paths::skill_doc(hq, "accessibility")
        );
    }

    #[test]
    fn duplicate_identifier_across_kinds_rejected() {
        let result = Registry::from_capabilities([
            Capability::new("reviewer", CapabilityKind::Role, ["review"], "/r.md"),
            Capability::new("Reviewer", CapabilityKind::Skill, ["review"], "/s.md"),
        ]);
        assert!(matches!(
            result,
            Err(AgencyError::DuplicateCapability { ref id, .. }) if id == "reviewer"
        ));
    }

    #[test]
    fn traversal_identifiers_rejected() {
        let dir = TempDir::new().unwrap();
        write(
            &paths::registry_manifest(dir.path()),
            "\"../../../escaped\":\n  kind: role\n  path: roles/x.md\n",
        );
        write(&paths::role_doc(dir.path(), "x"), "# X\n");
        assert!(matches!(
            Registry::load(dir.path()),
            Err(AgencyError::InvalidIdentifier(id)) if id == "../../../escaped"
        ));

        let mut registry = Registry::new();
        for bad in ["a/b", "..", "a\\b"] {
            assert!(registry
                .insert(Capability::new(bad, CapabilityKind::Skill, ["x"], "/s.md"))
                .is_err());
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn missing_hq_is_empty() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::load(&dir.path().join("nowhere")).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn malformed_manifest_is_config_error() {
        let dir = TempDir::new().unwrap();
        write(&paths::registry_manifest(dir.path()), "architect: [not, a, map");
        assert!(matches!(
            Registry::load(dir.path()),
            Err(AgencyError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn read_content_unknown_capability() {
        let registry = Registry::new();
        assert!(matches!(
            registry.read_content("ghost"),
            Err(AgencyError::CapabilityNotFound(_))
        ));
    }

    #[test]
    fn first_heading_skips_body_text() {
        assert_eq!(first_heading("intro\n## Backend Dev\n"), Some("Backend Dev"));
        assert_eq!(first_heading("no headings"), None);
    }
}
