use serde::Serialize;

/// All errors that can occur while loading a policy or reviewing scripts.
///
/// Policy violations found in a script are not errors; they come back as
/// `ValidationIssue` values.
#[derive(Debug, thiserror::Error)]
pub enum NexusError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid policy: {0}")]
    Policy(String),

    #[error("{0}")]
    Custom(String),
}

// Reports carry errors as plain strings in JSON output.
impl Serialize for NexusError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NexusError>;
