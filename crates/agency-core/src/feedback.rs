//! Skill feedback loop: projects record whether a provisioned skill helped,
//! the HQ collects those events and keeps a per-skill quality tally.
//!
//! Layout:
//!   <project>/.ai-context/learning/events.jsonl   local event log
//!   <hq>/knowledge/skill_feedback.jsonl   collected events
//!   <hq>/knowledge/skill_quality.yaml   derived counts
//!
//! The quality file is a projection of the HQ log and can always be rebuilt.

use crate::error::{AgencyError, Result};
use crate::{io, paths, text};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

const CONTEXT_HASH_LEN: usize = 12;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackResult {
    Helpful,
    Neutral,
    Harmful,
}

impl fmt::Display for FeedbackResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FeedbackResult::Helpful => "helpful",
            FeedbackResult::Neutral => "neutral",
            FeedbackResult::Harmful => "harmful",
        };
        f.write_str(s)
    }
}

impl FromStr for FeedbackResult {
    type Err = AgencyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "helpful" | "good" => Ok(FeedbackResult::Helpful),
            "neutral" => Ok(FeedbackResult::Neutral),
            "harmful" | "bad" => Ok(FeedbackResult::Harmful),
            other => Err(AgencyError::InvalidIdentifier(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillFeedback {
    pub timestamp: DateTime<Utc>,
    pub project: String,
    pub skill_id: String,
    pub result: FeedbackResult,
    #[serde(default)]
    pub note: String,
    pub context_hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillQuality {
    pub use_count: u32,
    pub helpful_count: u32,
    pub neutral_count: u32,
    pub harmful_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
}

impl SkillQuality {
    /// Helpful minus harmful, over all uses. `0.0` for an unused skill.
    pub fn score(&self) -> f64 {
        if self.use_count == 0 {
            return 0.0;
        }
        (f64::from(self.helpful_count) - f64::from(self.harmful_count)) / f64::from(self.use_count)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub skills: BTreeMap<String, SkillQuality>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectReport {
    pub collected: usize,
    pub already_seen: usize,
}

/// First 12 hex chars of the sha256 over `project|skill|result|note`.
pub fn context_hash(project: &str, skill_id: &str, result: FeedbackResult, note: &str) -> String {
    let mut hash = text::content_hash(&format!("{project}|{skill_id}|{result}|{note}"));
    hash.truncate(CONTEXT_HASH_LEN);
    hash
}

// ---------------------------------------------------------------------------
// Internal file I/O
// ---------------------------------------------------------------------------

fn read_events(path: &Path) -> Result<Vec<SkillFeedback>> {
    let content = io::read_or_empty(path)?;
    let mut events = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<SkillFeedback>(line) {
            Ok(event) => events.push(event),
            Err(e) => tracing::warn!(
                file = %path.display(),
                line = lineno + 1,
                error = %e,
                "skipping malformed feedback event"
            ),
        }
    }
    Ok(events)
}

fn append_event(path: &Path, event: &SkillFeedback) -> Result<()> {
    let mut line = serde_json::to_string(event)?;
    line.push('\n');
    io::append_text(path, &line)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Append a feedback event to the project's local log.
pub fn record(
    root: &Path,
    project: &str,
    skill_id: &str,
    result: FeedbackResult,
    note: &str,
) -> Result<SkillFeedback> {
    let skill_id = text::normalize_identifier(skill_id);
    if skill_id.is_empty() {
        return Err(AgencyError::InvalidIdentifier(skill_id));
    }
    let note = note.trim().to_string();
    let event = SkillFeedback {
        timestamp: Utc::now(),
        project: project.to_string(),
        context_hash: context_hash(project, &skill_id, result, &note),
        skill_id,
        result,
        note,
    };
    append_event(&paths::feedback_events(root), &event)?;
    tracing::info!(skill = %event.skill_id, result = %event.result, "recorded skill feedback");
    Ok(event)
}

/// Copy the project's events into the HQ log, skipping any whose context
/// hash the HQ has already seen. Safe to run repeatedly.
pub fn collect(root: &Path, hq: &Path) -> Result<CollectReport> {
    let mut report = CollectReport::default();
    let local = read_events(&paths::feedback_events(root))?;
    if local.is_empty() {
        return Ok(report);
    }

    let hq_log = paths::skill_feedback_log(hq);
    let mut seen: HashSet<String> = read_events(&hq_log)?
        .into_iter()
        .map(|e| e.context_hash)
        .collect();

    for event in &local {
        if !seen.insert(event.context_hash.clone()) {
            report.already_seen += 1;
            continue;
        }
        append_event(&hq_log, event)?;
        report.collected += 1;
    }

    if report.collected > 0 {
        tracing::info!(count = report.collected, "collected skill feedback");
    }
    Ok(report)
}

pub fn load_quality(hq: &Path) -> Result<QualityReport> {
    let content = io::read_or_empty(&paths::skill_quality(hq))?;
    if content.trim().is_empty() {
        return Ok(QualityReport::default());
    }
    Ok(serde_yaml::from_str(&content)?)
}

/// Rebuild `skill_quality.yaml` from the whole HQ feedback log.
pub fn update_quality(hq: &Path) -> Result<QualityReport> {
    let events = read_events(&paths::skill_feedback_log(hq))?;
    let mut skills: BTreeMap<String, SkillQuality> = BTreeMap::new();
    for event in &events {
        let q = skills.entry(event.skill_id.clone()).or_default();
        q.use_count += 1;
        match event.result {
            FeedbackResult::Helpful => q.helpful_count += 1,
            FeedbackResult::Neutral => q.neutral_count += 1,
            FeedbackResult::Harmful => q.harmful_count += 1,
        }
        q.last_used = q.last_used.max(Some(event.timestamp));
    }

    let previous = load_quality(hq)?;
    if previous.skills == skills {
        return Ok(previous);
    }
    let report = QualityReport {
        updated_at: Some(Utc::now()),
        skills,
    };
    io::atomic_write(
        &paths::skill_quality(hq),
        serde_yaml::to_string(&report)?.as_bytes(),
    )?;
    tracing::info!(skills = report.skills.len(), "skill quality updated");
    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
