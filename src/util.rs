use std::path::PathBuf;

/// Expands a leading `~` in a path to the user's home directory.
/// Also normalizes path separators for the current OS.
pub fn expand_tilde(path: &str) -> String {
    let result = if path.starts_with("~/") || path == "~" {
        if let Some(home) = dirs::home_dir() {
            let rest = path.strip_prefix('~').unwrap_or(path);
            home.join(rest.trim_start_matches('/'))
                .to_string_lossy()
                .to_string()
        } else {
            path.to_string()
        }
    } else {
        path.to_string()
    };
    if cfg!(windows) {
        result.replace('/', "\\")
    } else {
        result
    }
}

/// Directory holding the policy file and session logs.
///
/// `NEXUS_HOME` wins over the default `~/.nexus`.
pub fn nexus_home() -> Option<PathBuf> {
    if let Ok(custom) = std::env::var("NEXUS_HOME") {
        if !custom.trim().is_empty() {
            return Some(PathBuf::from(expand_tilde(custom.trim())));
        }
    }
    dirs::home_dir().map(|h| h.join(".nexus"))
}
