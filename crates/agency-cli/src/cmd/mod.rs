pub mod feedback;
pub mod hire;
pub mod infer;
pub mod learn;
pub mod persona;
pub mod registry;
pub mod status;
pub mod upskill;

use agency_core::config::AgencyConfig;
use agency_core::registry::Registry;
use anyhow::Context as _;
use std::path::{Path, PathBuf};

/// Resolved locations shared by every command.
pub struct Context {
    pub root: PathBuf,
    pub hq: PathBuf,
    pub json: bool,
}

impl Context {
    pub fn registry(&self) -> anyhow::Result<Registry> {
        Registry::load(&self.hq)
            .with_context(|| format!("failed to load HQ registry at {}", self.hq.display()))
    }

    /// Project name from `agency.yaml`, else the root directory name.
    pub fn project_name(&self) -> anyhow::Result<String> {
        let config = AgencyConfig::load_optional(&self.root)?;
        Ok(config.unwrap_or_default().project_name_or(&self.root))
    }
}

/// Load an explicit config path, or `<root>/agency.yaml` when none is given.
pub fn load_config(ctx: &Context, explicit: Option<&Path>) -> anyhow::Result<AgencyConfig> {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| agency_core::paths::project_config(&ctx.root));
    let config = AgencyConfig::load(&path)
        .with_context(|| format!("failed to load project config {}", path.display()))?;
    for warning in config.validate() {
        tracing::warn!(level = ?warning.level, "{}", warning.message);
    }
    Ok(config)
}
