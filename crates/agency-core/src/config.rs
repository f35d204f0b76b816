use crate::error::{AgencyError, Result};
use crate::inference::RequirementSpec;
use crate::{paths, text};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// CapabilityRef
// ---------------------------------------------------------------------------

/// An entry in `required_agents` / `required_skills`: either a bare identifier
/// or a mapping with a name and a description to infer from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapabilityRef {
    Name(String),
    Detailed {
        #[serde(default, alias = "role")]
        name: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },
}

impl CapabilityRef {
    pub fn name(&self) -> Option<&str> {
        match self {
            CapabilityRef::Name(n) => Some(n.as_str()),
            CapabilityRef::Detailed { name, .. } => name.as_deref(),
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            CapabilityRef::Name(_) => None,
            CapabilityRef::Detailed { description, .. } => description.as_deref(),
        }
    }
}

// ---------------------------------------------------------------------------
// AgencyConfig
// ---------------------------------------------------------------------------

/// Project configuration, read from `agency.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgencyConfig {
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub project_description: Option<String>,
    #[serde(default)]
    pub project_requirements: Option<String>,
    #[serde(default)]
    pub required_agents: Vec<CapabilityRef>,
    #[serde(default)]
    pub required_skills: Vec<CapabilityRef>,
}

impl AgencyConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AgencyError::ConfigNotFound(path.to_path_buf()));
        }
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&data).map_err(|e| AgencyError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load `agency.yaml` from a project root if present.
    pub fn load_optional(root: &Path) -> Result<Option<Self>> {
        let path = paths::project_config(root);
        if !path.exists() {
            return Ok(None);
        }
        Self::load(&path).map(Some)
    }

    /// Configured project name, falling back to the root directory name.
    pub fn project_name_or(&self, root: &Path) -> String {
        self.project_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| paths::project_name_from_root(root))
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        if self
            .project_name
            .as_deref()
            .map_or(true, |n| n.trim().is_empty())
        {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "project_name is not set; the directory name will be used".to_string(),
            });
        }
        for entry in self.required_agents.iter().chain(&self.required_skills) {
            if entry.name().is_none() && entry.description().is_none() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: "capability entry has neither a name nor a description".to_string(),
                });
            }
        }
        if self.requirement_spec().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "nothing requested: no agents, skills, or requirements text".to_string(),
            });
        }
        warnings
    }

    /// Build the inference input. Descriptions of detailed entries join the
    /// requirements text.
    pub fn requirement_spec(&self) -> RequirementSpec {
        let mut spec = RequirementSpec::default();
        for entry in &self.required_agents {
            if let Some(name) = entry.name() {
                spec.explicit_roles.insert(text::normalize_identifier(name));
            }
        }
        for entry in &self.required_skills {
            if let Some(name) = entry.name() {
                spec.explicit_skills.insert(text::normalize_identifier(name));
            }
        }
        spec.explicit_roles.retain(|id| !id.is_empty());
        spec.explicit_skills.retain(|id| !id.is_empty());

        let mut parts: Vec<&str> = Vec::new();
        if let Some(req) = self.project_requirements.as_deref() {
            parts.push(req);
        }
        parts.extend(
            self.required_agents
                .iter()
                .chain(&self.required_skills)
                .filter_map(CapabilityRef::description),
        );
        spec.free_text = parts
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        spec
    }
}

// ---------------------------------------------------------------------------
// HqConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Entries a theme needs before it becomes a standard.
    #[serde(default = "default_min_cluster_size")]
    pub min_cluster_size: usize,
    /// Role that receives learnings no other role claims.
    #[serde(default = "default_fallback_role")]
    pub fallback_role: Option<String>,
}

fn default_min_cluster_size() -> usize {
    1
}

fn default_fallback_role() -> Option<String> {
    Some("task-assigner".to_string())
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            min_cluster_size: default_min_cluster_size(),
            fallback_role: default_fallback_role(),
        }
    }
}

/// Engine settings for an HQ, read from `hq.yaml`. Absent file → defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HqConfig {
    /// Roles requested for every project on hire.
    #[serde(default)]
    pub default_roles: Vec<String>,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
}

impl HqConfig {
    pub fn load(hq: &Path) -> Result<Self> {
        let path = paths::hq_config(hq);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&data).map_err(|e| AgencyError::ConfigInvalid {
            path,
            message: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
