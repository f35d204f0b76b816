use agency_core::paths;
use std::path::{Path, PathBuf};

/// Resolve the project root.
///
/// Priority:
/// 1. `--root` flag / `AGENCY_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `agency.yaml`
/// 3. Walk upward from `cwd` looking for `.git/`
/// 4. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_upward(&cwd, |dir| paths::project_config(dir).is_file())
        .or_else(|| find_upward(&cwd, |dir| dir.join(".git").is_dir()))
        .unwrap_or(cwd)
}

fn find_upward(start: &Path, found: impl Fn(&Path) -> bool) -> Option<PathBuf> {
    start.ancestors().find(|dir| found(dir)).map(Path::to_path_buf)
}

/// Resolve the HQ directory.
///
/// Priority:
/// 1. `--hq` flag / `AGENCY_HQ` env var
/// 2. `<root>/.agency-hq` when it exists
/// 3. `~/.agency-hq`
/// 4. `<root>/.agency-hq` when there is no home directory
pub fn resolve_hq(explicit: Option<&Path>, root: &Path) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let local = paths::local_hq(root);
    if local.is_dir() {
        return local;
    }
    match home::home_dir() {
        Some(home) => home.join(paths::LOCAL_HQ_DIR),
        None => local,
    }
}
