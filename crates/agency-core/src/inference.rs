//! Inference engine: turns explicit selections and free-text requirements
//! into the set of capabilities to provision.
//!
//! Matching is lexical set intersection: a capability is included when any of
//! its tags appears among the tokens or 2-3 word phrases of the requirements.
//! There is no scoring and no threshold.

use crate::registry::Registry;
use crate::text;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementSpec {
    pub explicit_roles: BTreeSet<String>,
    pub explicit_skills: BTreeSet<String>,
    pub free_text: String,
}

impl RequirementSpec {
    pub fn from_text(free_text: impl Into<String>) -> Self {
        Self {
            free_text: free_text.into(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.explicit_roles.is_empty()
            && self.explicit_skills.is_empty()
            && self.free_text.trim().is_empty()
    }
}

/// Why a capability was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchEvidence {
    Explicit,
    Keywords { tags: BTreeSet<String> },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub resolved: BTreeSet<String>,
    pub unresolved: BTreeSet<String>,
    #[serde(default)]
    pub evidence: BTreeMap<String, MatchEvidence>,
}

impl MatchResult {
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty() && self.unresolved.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Inference
// ---------------------------------------------------------------------------

pub fn infer(spec: &RequirementSpec, registry: &Registry) -> MatchResult {
    let mut result = MatchResult::default();

    for raw in spec.explicit_roles.iter().chain(&spec.explicit_skills) {
        let id = text::normalize_identifier(raw);
        if id.is_empty() {
            continue;
        }
        if registry.contains(&id) {
            result.evidence.insert(id.clone(), MatchEvidence::Explicit);
            result.resolved.insert(id);
        } else {
            tracing::debug!(id = %id, "explicit capability not in registry");
            result.unresolved.insert(id);
        }
    }

    if spec.free_text.trim().is_empty() {
        return result;
    }

    let terms = text::candidate_terms(&spec.free_text);
    for cap in registry.iter() {
        if result.resolved.contains(&cap.identifier) {
            continue;
        }
        let matched: BTreeSet<String> = cap.tags.intersection(&terms).cloned().collect();
        if matched.is_empty() {
            continue;
        }
        tracing::debug!(id = %cap.identifier, tags = ?matched, "inferred from requirements");
        result
            .evidence
            .insert(cap.identifier.clone(), MatchEvidence::Keywords { tags: matched });
        result.resolved.insert(cap.identifier.clone());
    }

    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
