//! Archive store: the append-only ledger of harvested learnings.
//!
//! Layout:
//!   knowledge/archive/<topic>.jsonl   one JSON `ArchiveEntry` per line
//!
//! Entries are never rewritten or deleted. `content_hash` is unique across
//! all partitions.

use crate::error::Result;
use crate::{io, paths, text};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

pub const GENERAL_TOPIC: &str = "general";

// ---------------------------------------------------------------------------
// ArchiveEntry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub project_name: String,
    pub role_or_topic: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub content_hash: String,
}

// ---------------------------------------------------------------------------
// Archive
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Archive {
    hq: PathBuf,
    entries: Vec<ArchiveEntry>,
    by_hash: HashMap<String, usize>,
}

impl Archive {
    /// Load every partition under the HQ. Lines that fail to parse (a torn
    /// final append, a hand edit) are skipped with a warning.
    pub fn load(hq: &Path) -> Result<Self> {
        let mut archive = Self {
            hq: hq.to_path_buf(),
            entries: Vec::new(),
            by_hash: HashMap::new(),
        };
        let dir = paths::archive_dir(hq);
        if !dir.is_dir() {
            return Ok(archive);
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|x| x == "jsonl"))
            .collect();
        files.sort();

        for file in files {
            let content = std::fs::read_to_string(&file)?;
            for (lineno, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<ArchiveEntry>(line) {
                    Ok(entry) => {
                        if archive.by_hash.contains_key(&entry.content_hash) {
                            tracing::warn!(hash = %entry.content_hash, "duplicate archive entry ignored");
                            continue;
                        }
                        archive.index(entry);
                    }
                    Err(e) => {
                        tracing::warn!(
                            file = %file.display(),
                            line = lineno + 1,
                            error = %e,
                            "skipping malformed archive line"
                        );
                    }
                }
            }
        }
        archive.entries.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.content_hash.cmp(&b.content_hash))
        });
        archive.by_hash = archive
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.content_hash.clone(), i))
            .collect();
        Ok(archive)
    }

    fn index(&mut self, entry: ArchiveEntry) {
        self.by_hash
            .insert(entry.content_hash.clone(), self.entries.len());
        self.entries.push(entry);
    }

    pub fn hq(&self) -> &Path {
        &self.hq
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, hash: &str) -> Option<&ArchiveEntry> {
        self.by_hash.get(hash).map(|&i| &self.entries[i])
    }

    /// Entries grouped by topic, each group in archive order.
    pub fn by_topic(&self) -> BTreeMap<&str, Vec<&ArchiveEntry>> {
        let mut groups: BTreeMap<&str, Vec<&ArchiveEntry>> = BTreeMap::new();
        for entry in &self.entries {
            groups
                .entry(entry.role_or_topic.as_str())
                .or_default()
                .push(entry);
        }
        groups
    }

    /// Hash to store `text` under.
    ///
    /// Normally the plain content hash. If that hash is already taken by an
    /// entry whose normalized text differs (a collision), a suffixed hash is
    /// derived instead so the new learning is kept rather than dropped.
    pub fn hash_for(&self, text: &str) -> String {
        let normalized = text::normalize_statement(text);
        let mut candidate = text::content_hash(&normalized);
        let mut attempt = 0u32;
        while let Some(existing) = self.lookup(&candidate) {
            if text::normalize_statement(&existing.text) == normalized {
                break;
            }
            attempt += 1;
            tracing::warn!(hash = %candidate, attempt, "archive hash collision, deriving new hash");
            candidate = text::content_hash(&format!("{normalized}#{attempt}"));
        }
        candidate
    }

    /// Append an entry to its topic partition. Returns `false` without writing
    /// if an entry with the same hash is already archived.
    pub fn append(&mut self, entry: ArchiveEntry) -> Result<bool> {
        if self.by_hash.contains_key(&entry.content_hash) {
            return Ok(false);
        }
        let partition = paths::archive_partition(&self.hq, &partition_name(&entry.role_or_topic));
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');
        io::append_text(&partition, &line)?;
        tracing::info!(topic = %entry.role_or_topic, hash = %entry.content_hash, "archived learning");
        self.index(entry);
        Ok(true)
    }
}

/// Filesystem-safe partition name for a topic.
fn partition_name(topic: &str) -> String {
    let slug = text::slugify(topic);
    if slug.is_empty() {
        GENERAL_TOPIC.to_string()
    } else {
        slug
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(archive: &Archive, topic: &str, text: &str) -> ArchiveEntry {
        ArchiveEntry {
            project_name: "shop".to_string(),
            role_or_topic: topic.to_string(),
            text: text.to_string(),
            timestamp: Utc::now(),
            content_hash: archive.hash_for(text),
        }
    }

    #[test]
    fn append_and_reload() {
        let dir = TempDir::new().unwrap();
        let mut archive = Archive::load(dir.path()).unwrap();
        assert!(archive.is_empty());

        let e = entry(&archive, "testing", "Use atomic writes for state");
        assert!(archive.append(e.clone()).unwrap());
        assert!(paths::archive_partition(dir.path(), "testing").exists());

        let reloaded = Archive::load(dir.path()).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.lookup(&e.content_hash), Some(&e));
    }

    #[test]
    fn duplicate_hash_not_appended() {
        let dir = TempDir::new().unwrap();
        let mut archive = Archive::load(dir.path()).unwrap();
        let e = entry(&archive, "testing", "Use atomic writes");
        assert!(archive.append(e).unwrap());
        let again = entry(&archive, "general", "use  ATOMIC writes");
        assert!(!archive.append(again).unwrap());
        assert_eq!(archive.len(), 1);
        assert!(!paths::archive_partition(dir.path(), "general").exists());
    }

    #[test]
    fn collision_derives_new_hash() {
        let dir = TempDir::new().unwrap();
        let mut archive = Archive::load(dir.path()).unwrap();
        // Plant an entry under the hash that "second note" would get.
        let stolen = text::content_hash("second note");
        archive
            .append(ArchiveEntry {
                project_name: "shop".to_string(),
                role_or_topic: "general".to_string(),
                text: "first note".to_string(),
                timestamp: Utc::now(),
                content_hash: stolen.clone(),
            })
            .unwrap();

        let hash = archive.hash_for("second note");
        assert_ne!(hash, stolen);
        let e = entry(&archive, "general", "second note");
        assert!(archive.append(e).unwrap());
        assert_eq!(archive.len(), 2);
        // Stable across calls: the same text now maps to its stored hash.
        assert_eq!(archive.hash_for("second note"), hash);
    }

    #[test]
    fn malformed_lines_skipped() {
        let dir = TempDir::new().unwrap();
        let mut archive = Archive::load(dir.path()).unwrap();
        let e = entry(&archive, "testing", "Pin tool versions");
        archive.append(e).unwrap();
        io::append_text(&paths::archive_partition(dir.path(), "testing"), "{\"torn\":").unwrap();

        let reloaded = Archive::load(dir.path()).unwrap();
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn odd_topics_get_safe_partitions() {
        assert_eq!(partition_name("Front/End"), "front-end");
        assert_eq!(partition_name("!!"), GENERAL_TOPIC);
    }

    #[test]
    fn by_topic_groups_entries() {
        let dir = TempDir::new().unwrap();
        let mut archive = Archive::load(dir.path()).unwrap();
        for (topic, text) in [("testing", "a one"), ("testing", "a two"), ("general", "b")] {
            let e = entry(&archive, topic, text);
            archive.append(e).unwrap();
        }
        let groups = archive.by_topic();
        assert_eq!(groups["testing"].len(), 2);
        assert_eq!(groups["general"].len(), 1);
    }
}
