//! Knowledge harvester: pull list items out of the `Learned` section of a
//! project's context document (AGENTS.md) into the HQ archive.
//!
//! Accepted headings: `## Learned`, `## 7. Learned`, `### Learned lessons`.
//! Longer titles such as `## Learned Protocols` are other sections.
//! The section runs until the next heading of the same or a higher level.
//! An item may open with a `[Category]` marker, which becomes its topic.

use crate::archive::{Archive, ArchiveEntry, GENERAL_TOPIC};
use crate::error::Result;
use crate::text;
use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HarvestWarning {
    DocumentMissing { path: PathBuf },
    LearnedSectionMissing { path: PathBuf },
}

impl fmt::Display for HarvestWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarvestWarning::DocumentMissing { path } => {
                write!(f, "no context document at {}", path.display())
            }
            HarvestWarning::LearnedSectionMissing { path } => {
                write!(f, "no 'Learned' section in {}", path.display())
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarvestReport {
    pub archived: usize,
    pub skipped: usize,
    pub warnings: Vec<HarvestWarning>,
}

/// One list item from a Learned section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnedItem {
    pub topic: String,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

static HEADING_RE: OnceLock<Regex> = OnceLock::new();
static LEARNED_RE: OnceLock<Regex> = OnceLock::new();
static ITEM_RE: OnceLock<Regex> = OnceLock::new();
static MARKER_RE: OnceLock<Regex> = OnceLock::new();

fn heading_re() -> &'static Regex {
    HEADING_RE.get_or_init(|| Regex::new(r"^(#{1,6})\s+(.*)$").unwrap())
}

fn learned_re() -> &'static Regex {
    LEARNED_RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:\d+\.\s*)?learned(?:\s+lessons)?\s*:?$").unwrap()
    })
}

fn item_re() -> &'static Regex {
    ITEM_RE.get_or_init(|| Regex::new(r"^\s{0,3}(?:[-*+]|\d+[.)])\s+(.*)$").unwrap())
}

fn marker_re() -> &'static Regex {
    MARKER_RE.get_or_init(|| Regex::new(r"^\[([^\]]*)\]\s*(.*)$").unwrap())
}

/// Extract the items of the Learned section. `None` when there is no such
/// section; `Some(vec![])` when the section exists but lists nothing.
pub fn parse_learned(content: &str) -> Option<Vec<LearnedItem>> {
    let lines: Vec<&str> = content.lines().collect();
    let (start, level) = lines.iter().enumerate().find_map(|(i, line)| {
        let caps = heading_re().captures(line.trim_end())?;
        learned_re()
            .is_match(caps[2].trim())
            .then(|| (i, caps[1].len()))
    })?;

    let mut raw_items: Vec<String> = Vec::new();
    let mut open = false;
    for line in &lines[start + 1..] {
        if let Some(caps) = heading_re().captures(line.trim_end()) {
            if caps[1].len() <= level {
                break;
            }
            open = false;
            continue;
        }
        if let Some(caps) = item_re().captures(line) {
            raw_items.push(caps[1].trim().to_string());
            open = true;
        } else if line.trim().is_empty() {
            continue;
        } else if open && line.starts_with(char::is_whitespace) {
            if let Some(last) = raw_items.last_mut() {
                last.push(' ');
                last.push_str(line.trim());
            }
        } else {
            open = false;
        }
    }

    Some(raw_items.iter().filter_map(|raw| split_marker(raw)).collect())
}

/// Split a leading `[Category]` marker off an item. Task-list boxes
/// (`[ ]`, `[x]`) are not categories.
fn split_marker(raw: &str) -> Option<LearnedItem> {
    let mut body = raw.trim();
    for checkbox in ["[ ]", "[x]", "[X]"] {
        if let Some(rest) = body.strip_prefix(checkbox) {
            body = rest.trim_start();
        }
    }
    let (topic, text) = match marker_re().captures(body) {
        Some(caps) => {
            let topic = text::slugify(&caps[1]);
            let rest = caps[2].trim().to_string();
            let topic = if topic.is_empty() {
                GENERAL_TOPIC.to_string()
            } else {
                topic
            };
            (topic, rest)
        }
        None => (GENERAL_TOPIC.to_string(), body.to_string()),
    };
    if text.is_empty() {
        return None;
    }
    Some(LearnedItem { topic, text })
}

// ---------------------------------------------------------------------------
// Harvest
// ---------------------------------------------------------------------------

/// Archive every new learned item of `doc`. A missing document or section is
/// reported as a warning with zero entries, never as an error.
pub fn harvest(doc: &Path, project_name: &str, archive: &mut Archive) -> Result<HarvestReport> {
    let mut report = HarvestReport::default();

    let content = match std::fs::read_to_string(doc) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(doc = %doc.display(), "context document not found");
            report.warnings.push(HarvestWarning::DocumentMissing {
                path: doc.to_path_buf(),
            });
            return Ok(report);
        }
        Err(e) => return Err(e.into()),
    };

    let Some(items) = parse_learned(&content) else {
        tracing::warn!(doc = %doc.display(), "no Learned section");
        report.warnings.push(HarvestWarning::LearnedSectionMissing {
            path: doc.to_path_buf(),
        });
        return Ok(report);
    };

    for item in items {
        let content_hash = archive.hash_for(&item.text);
        if archive.lookup(&content_hash).is_some() {
            report.skipped += 1;
            continue;
        }
        let appended = archive.append(ArchiveEntry {
            project_name: project_name.to_string(),
            role_or_topic: item.topic,
            text: item.text,
            timestamp: Utc::now(),
            content_hash,
        })?;
        if appended {
            report.archived += 1;
        } else {
            report.skipped += 1;
        }
    }

    tracing::info!(
        archived = report.archived,
        skipped = report.skipped,
        project = project_name,
        "harvest complete"
    );
    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DOC: &str = "\
# Project

## Conventions
- not a learning

## 7. Learned
- [Testing] Use atomic writes for fixture files
- Keep migrations reversible,
  even for seed data
* [ ] [Frontend] Debounce search inputs
1. Numbered items count too

### Sub heading inside
- nested section items count

## Next Section
- ignored
";

    #[test]
    fn parses_items_topics_and_continuations() {
        let items = parse_learned(DOC).unwrap();
        let got: Vec<(&str, &str)> = items
            .iter()
            .map(|i| (i.topic.as_str(), i.text.as_str()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("testing", "Use atomic writes for fixture files"),
                ("general", "Keep migrations reversible, even for seed data"),
                ("frontend", "Debounce search inputs"),
                ("general", "Numbered items count too"),
                ("general", "nested section items count"),
            ]
        );
    }

    #[test]
    fn learned_protocols_heading_is_not_the_learned_section() {
        let doc = "\
## Learned Protocols
- from a role document

## 3. Learned Lessons
- [Ops] Rotate keys quarterly
";
        let items = parse_learned(doc).unwrap();
        assert_eq!(
            items,
            vec![LearnedItem {
                topic: "ops".to_string(),
                text: "Rotate keys quarterly".to_string(),
            }]
        );
        assert_eq!(parse_learned("## Learned the hard way\n- nope\n"), None);
    }

    #[test]
    fn missing_section_is_none_and_empty_section_is_empty() {
        assert_eq!(parse_learned("# Doc\n\n## Other\n- x\n"), None);
        assert_eq!(parse_learned("## Learned\n\n## Next\n"), Some(vec![]));
    }

    #[test]
    fn harvest_twice_archives_once() {
        let hq = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let doc = project.path().join("AGENTS.md");
        std::fs::write(&doc, "## Learned\n- [Testing] Use atomic writes\n").unwrap();

        let mut archive = Archive::load(hq.path()).unwrap();
        let first = harvest(&doc, "shop", &mut archive).unwrap();
        assert_eq!((first.archived, first.skipped), (1, 0));

        let mut archive = Archive::load(hq.path()).unwrap();
        let second = harvest(&doc, "shop", &mut archive).unwrap();
        assert_eq!((second.archived, second.skipped), (0, 1));

        let archive = Archive::load(hq.path()).unwrap();
        assert_eq!(archive.len(), 1);
        let entry = &archive.entries()[0];
        assert_eq!(entry.role_or_topic, "testing");
        assert_eq!(entry.project_name, "shop");
        assert_eq!(entry.content_hash, text::content_hash("Use atomic writes"));
    }

    #[test]
    fn same_note_from_another_project_is_skipped() {
        let hq = TempDir::new().unwrap();
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        std::fs::write(a.path().join("AGENTS.md"), "## Learned\n- Pin the toolchain\n").unwrap();
        std::fs::write(b.path().join("AGENTS.md"), "## Learned\n- pin   the TOOLCHAIN\n").unwrap();

        let mut archive = Archive::load(hq.path()).unwrap();
        harvest(&a.path().join("AGENTS.md"), "a", &mut archive).unwrap();
        let report = harvest(&b.path().join("AGENTS.md"), "b", &mut archive).unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn duplicate_items_in_one_document() {
        let hq = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let doc = project.path().join("AGENTS.md");
        std::fs::write(&doc, "## Learned\n- Same thing\n- same thing\n").unwrap();
        let mut archive = Archive::load(hq.path()).unwrap();
        let report = harvest(&doc, "shop", &mut archive).unwrap();
        assert_eq!((report.archived, report.skipped), (1, 1));
    }

    #[test]
    fn missing_document_is_a_warning() {
        let hq = TempDir::new().unwrap();
        let mut archive = Archive::load(hq.path()).unwrap();
        let doc = hq.path().join("AGENTS.md");
        let report = harvest(&doc, "shop", &mut archive).unwrap();
        assert_eq!(report.archived, 0);
        assert_eq!(report.warnings, vec![HarvestWarning::DocumentMissing { path: doc }]);
    }

    #[test]
    fn missing_section_is_a_warning() {
        let hq = TempDir::new().unwrap();
        let doc = hq.path().join("AGENTS.md");
        std::fs::write(&doc, "# Project\n\nNothing learned yet.\n").unwrap();
        let mut archive = Archive::load(hq.path()).unwrap();
        let report = harvest(&doc, "shop", &mut archive).unwrap();
        assert_eq!(report.archived, 0);
        assert!(matches!(
            report.warnings.as_slice(),
            [HarvestWarning::LearnedSectionMissing { .. }]
        ));
    }

    #[test]
    fn other_sections_left_untouched() {
        let hq = TempDir::new().unwrap();
        let doc = hq.path().join("AGENTS.md");
        std::fs::write(&doc, DOC).unwrap();
        let mut archive = Archive::load(hq.path()).unwrap();
        harvest(&doc, "shop", &mut archive).unwrap();
        assert_eq!(std::fs::read_to_string(&doc).unwrap(), DOC);
    }
}
