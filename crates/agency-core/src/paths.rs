use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// HQ layout
// ---------------------------------------------------------------------------

pub const ROLES_DIR: &str = "roles";
pub const SKILLS_DIR: &str = "skills";
pub const SKILL_FILE: &str = "SKILL.md";
pub const REGISTRY_MANIFEST: &str = "registry.yaml";
pub const HQ_CONFIG_FILE: &str = "hq.yaml";
pub const ARCHIVE_DIR: &str = "knowledge/archive";
pub const STANDARDS_FILE: &str = "knowledge/standards.yaml";
pub const SKILL_FEEDBACK_LOG: &str = "knowledge/skill_feedback.jsonl";
pub const SKILL_QUALITY_FILE: &str = "knowledge/skill_quality.yaml";

/// Project-local HQ override, preferred over the shared one when present.
pub const LOCAL_HQ_DIR: &str = ".agency-hq";

// ---------------------------------------------------------------------------
// Project layout
// ---------------------------------------------------------------------------

pub const PROJECT_CONFIG_FILE: &str = "agency.yaml";
pub const CONTEXT_DOC: &str = "AGENTS.md";
pub const AI_CONTEXT_DIR: &str = ".ai-context";
pub const TEAM_DIR: &str = ".ai-context/team";
pub const PROJECT_SKILLS_DIR: &str = ".ai-context/skills";
pub const REQUESTS_FILE: &str = ".ai-context/HQ_REQUESTS.md";
pub const ACTIVE_PERSONA_FILE: &str = ".ai-context/ACTIVE_PERSONA.md";
pub const FEEDBACK_EVENTS_FILE: &str = ".ai-context/learning/events.jsonl";

// ---------------------------------------------------------------------------
// HQ path helpers
// ---------------------------------------------------------------------------

pub fn role_doc(hq: &Path, id: &str) -> PathBuf {
    hq.join(ROLES_DIR).join(format!("{id}.md"))
}

pub fn skill_doc(hq: &Path, id: &str) -> PathBuf {
    hq.join(SKILLS_DIR).join(id).join(SKILL_FILE)
}

pub fn registry_manifest(hq: &Path) -> PathBuf {
    hq.join(REGISTRY_MANIFEST)
}

pub fn hq_config(hq: &Path) -> PathBuf {
    hq.join(HQ_CONFIG_FILE)
}

pub fn archive_dir(hq: &Path) -> PathBuf {
    hq.join(ARCHIVE_DIR)
}

pub fn archive_partition(hq: &Path, topic: &str) -> PathBuf {
    archive_dir(hq).join(format!("{topic}.jsonl"))
}

pub fn standards_ledger(hq: &Path) -> PathBuf {
    hq.join(STANDARDS_FILE)
}

pub fn skill_feedback_log(hq: &Path) -> PathBuf {
    hq.join(SKILL_FEEDBACK_LOG)
}

pub fn skill_quality(hq: &Path) -> PathBuf {
    hq.join(SKILL_QUALITY_FILE)
}

// ---------------------------------------------------------------------------
// Project path helpers
// ---------------------------------------------------------------------------

pub fn project_config(root: &Path) -> PathBuf {
    root.join(PROJECT_CONFIG_FILE)
}

pub fn context_doc(root: &Path) -> PathBuf {
    root.join(CONTEXT_DOC)
}

pub fn local_hq(root: &Path) -> PathBuf {
    root.join(LOCAL_HQ_DIR)
}

pub fn team_member(root: &Path, id: &str) -> PathBuf {
    root.join(TEAM_DIR).join(format!("{id}.md"))
}

pub fn project_skill(root: &Path, id: &str) -> PathBuf {
    root.join(PROJECT_SKILLS_DIR).join(id).join(SKILL_FILE)
}

pub fn requests_log(root: &Path) -> PathBuf {
    root.join(REQUESTS_FILE)
}

pub fn active_persona(root: &Path) -> PathBuf {
    root.join(ACTIVE_PERSONA_FILE)
}

pub fn feedback_events(root: &Path) -> PathBuf {
    root.join(FEEDBACK_EVENTS_FILE)
}

/// Best-effort project name: the last component of the root path.
pub fn project_name_from_root(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skill_paths_nest_under_identifier() {
        let hq = Path::new("/hq");
        assert_eq!(
            skill_doc(hq, "accessibility"),
            PathBuf::from("/hq/skills/accessibility/SKILL.md")
        );
        assert_eq!(
            project_skill(Path::new("/p"), "accessibility"),
            PathBuf::from("/p/.ai-context/skills/accessibility/SKILL.md")
        );
    }

    #[test]
    fn archive_partition_by_topic() {
        assert_eq!(
            archive_partition(Path::new("/hq"), "testing"),
            PathBuf::from("/hq/knowledge/archive/testing.jsonl")
        );
    }

    #[test]
    fn project_name_uses_last_component() {
        assert_eq!(project_name_from_root(Path::new("/work/shop-api")), "shop-api");
    }
}
