use crate::domain::models::PlannerPolicy;
use crate::infrastructure::config::{
    ensure_default_configs, load_planner_policy, read_store_base_url,
};
use crate::infrastructure::error::CoreError;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug)]
pub struct BootstrapResult {
    pub workspace_root: PathBuf,
    pub config_dir: PathBuf,
    pub policy: PlannerPolicy,
    pub store_base_url: Url,
}

/// Prepares a workspace: creates the config directory, writes the default
/// config files, and loads the planner policy and store address from them.
pub fn bootstrap_workspace(workspace_root: &Path) -> Result<BootstrapResult, CoreError> {
    let config_dir = workspace_root.join("config");
    fs::create_dir_all(&config_dir)?;

    ensure_default_configs(&config_dir)?;
    let policy = load_planner_policy(&config_dir);
    policy.validate().map_err(CoreError::InvalidConfig)?;
    let store_base_url = read_store_base_url(&config_dir)?;

    Ok(BootstrapResult {
        workspace_root: workspace_root.to_path_buf(),
        config_dir,
        policy,
        store_base_url,
    })
}
