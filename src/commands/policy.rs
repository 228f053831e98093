use std::path::Path;

use crate::commands::config::save_policy;
use crate::error::{NexusError, Result};
use crate::policy::{PolicyConfiguration, PolicyFile};

/// The effective policy as pretty JSON.
pub fn show_policy(policy: &PolicyConfiguration) -> Result<String> {
    Ok(serde_json::to_string_pretty(&policy.to_file())?)
}

/// Writes the built-in policy to `path`. Existing files are kept unless `force`.
pub fn init_policy(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(NexusError::Custom(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    save_policy(path, &PolicyFile::default())
}
