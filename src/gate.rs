use serde::ser::SerializeStruct;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::error::{NexusError, Result};
use crate::policy::PolicyConfiguration;
use crate::validator::{validate, ValidationIssue};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Files read at once by `review_files`; keeps large batches under the
/// open-file limit.
const MAX_CONCURRENT_READS: usize = 16;

/// Upload decision for one script. No issues means accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
    issues: Vec<ValidationIssue>,
}

impl Verdict {
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn is_accepted(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn is_rejected(&self) -> bool {
        !self.is_accepted()
    }

    /// Rejection reasons, shown to the uploader verbatim.
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }
}

// `accepted` is derived from the issues when written out.
impl Serialize for Verdict {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("Verdict", 2)?;
        state.serialize_field("accepted", &self.is_accepted())?;
        state.serialize_field("issues", &self.issues)?;
        state.end()
    }
}

/// Runs the validator and wraps the result as a verdict.
pub fn review(source: &str, config: &PolicyConfiguration) -> Verdict {
    Verdict::from_issues(validate(source, config))
}

/// A reviewed script, named by where it came from.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptReport {
    pub name: String,
    pub line_count: usize,
    pub verdict: Verdict,
    pub messages: Vec<String>,
}

impl ScriptReport {
    pub fn new(name: impl Into<String>, source: &str, config: &PolicyConfiguration) -> Self {
        let verdict = review(source, config);
        Self {
            name: name.into(),
            line_count: source.split('\n').count(),
            messages: verdict.messages(),
            verdict,
        }
    }
}

/// Outcome of reviewing one input path.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum FileReview {
    Reviewed(ScriptReport),
    Failed { name: String, error: NexusError },
}

impl FileReview {
    pub fn name(&self) -> &str {
        match self {
            Self::Reviewed(report) => &report.name,
            Self::Failed { name, .. } => name,
        }
    }
}

/// Reads and reviews each file, keeping input order. A file that cannot be
/// read is reported as `Failed` without stopping the others.
pub async fn review_files(paths: &[PathBuf], config: &PolicyConfiguration) -> Vec<FileReview> {
    let permits = Arc::new(Semaphore::new(MAX_CONCURRENT_READS));
    let mut reads = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.clone();
        let permits = Arc::clone(&permits);
        reads.push(tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|e| NexusError::Custom(format!("read limiter closed: {e}")))?;
            read_script(&path).await
        }));
    }

    let mut reviews = Vec::with_capacity(paths.len());
    for (path, read) in paths.iter().zip(reads) {
        let name = path.to_string_lossy().to_string();
        let source = match read.await {
            Ok(result) => result,
            Err(e) => Err(NexusError::Custom(format!("read task failed: {e}"))),
        };
        reviews.push(match source {
            Ok(text) => FileReview::Reviewed(ScriptReport::new(name, &text, config)),
            Err(error) => FileReview::Failed { name, error },
        });
    }
    reviews
}

async fn read_script(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await?;
    decode_script(&path.display().to_string(), bytes)
}

/// UTF-8 text of an uploaded script, without a leading byte-order mark.
pub fn decode_script(name: &str, bytes: Vec<u8>) -> Result<String> {
    let text = String::from_utf8(bytes)
        .map_err(|_| NexusError::Custom(format!("{name} is not valid UTF-8")))?;
    match text.strip_prefix(BYTE_ORDER_MARK) {
        Some(rest) => Ok(rest.to_string()),
        None => Ok(text),
    }
}
