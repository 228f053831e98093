use std::path::{Path, PathBuf};

use crate::error::{NexusError, Result};
use crate::policy::{PolicyConfiguration, PolicyFile};
use crate::util::nexus_home;

pub fn default_policy_path() -> Option<PathBuf> {
    nexus_home().map(|h| h.join("policy.json"))
}

/// Reads a policy file without validating it.
pub fn read_policy_file(path: &Path) -> Result<PolicyFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Loads and validates the policy used for this process.
///
/// An explicit path must exist. The default path falls back to the
/// built-in policy when no file has been written yet.
pub fn load_policy(explicit: Option<&Path>) -> Result<PolicyConfiguration> {
    let file = match explicit {
        Some(path) => read_policy_file(path).map_err(|e| {
            NexusError::Custom(format!("Cannot load policy {}: {e}", path.display()))
        })?,
        None => match default_policy_path() {
            Some(path) if path.exists() => read_policy_file(&path).map_err(|e| {
                NexusError::Custom(format!("Cannot load policy {}: {e}", path.display()))
            })?,
            _ => PolicyFile::default(),
        },
    };
    file.compile()
}

/// Writes `policy` as pretty JSON, creating parent directories.
pub fn save_policy(path: &Path, policy: &PolicyFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(policy)?;
    std::fs::write(path, json)?;
    Ok(())
}
