use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::commands::logs::SessionLogger;
use crate::error::{NexusError, Result};
use crate::gate::{decode_script, review_files, FileReview, ScriptReport};
use crate::policy::PolicyConfiguration;

pub const STDIN_MARKER: &str = "-";
const STDIN_NAME: &str = "<stdin>";

/// What the process should report back to the shell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    AllAccepted,
    SomeRejected,
    Failed,
}

impl Outcome {
    pub fn code(self) -> u8 {
        match self {
            Self::AllAccepted => 0,
            Self::SomeRejected => 1,
            Self::Failed => 2,
        }
    }

    pub fn of(reviews: &[FileReview]) -> Self {
        let mut outcome = Self::AllAccepted;
        for review in reviews {
            match review {
                FileReview::Failed { .. } => return Self::Failed,
                FileReview::Reviewed(report) if report.verdict.is_rejected() => {
                    outcome = Self::SomeRejected;
                }
                FileReview::Reviewed(_) => {}
            }
        }
        outcome
    }
}

/// Reviews every input (`-` is stdin) and renders the results.
pub async fn run_validate(
    inputs: &[PathBuf],
    policy: &PolicyConfiguration,
    logger: Option<&SessionLogger>,
) -> (Vec<FileReview>, Outcome) {
    run_validate_with_stdin(inputs, policy, logger, tokio::io::stdin()).await
}

/// `run_validate` with an explicit reader standing in for stdin. A stdin
/// that can't be read or decoded is reported like an unreadable file.
pub async fn run_validate_with_stdin<R>(
    inputs: &[PathBuf],
    policy: &PolicyConfiguration,
    logger: Option<&SessionLogger>,
    mut stdin: R,
) -> (Vec<FileReview>, Outcome)
where
    R: AsyncRead + Unpin,
{
    let (stdin_positions, files): (Vec<usize>, Vec<PathBuf>) = split_stdin(inputs);
    let mut file_reviews = review_files(&files, policy).await.into_iter();

    let mut reviews = Vec::with_capacity(inputs.len());
    // Read once; `-` given twice reviews the same text.
    let mut stdin_text: Option<std::result::Result<String, String>> = None;
    for idx in 0..inputs.len() {
        if stdin_positions.contains(&idx) {
            if stdin_text.is_none() {
                stdin_text = Some(read_stdin(&mut stdin).await.map_err(|e| e.to_string()));
            }
            let review = match stdin_text.as_ref() {
                Some(Ok(text)) => FileReview::Reviewed(ScriptReport::new(STDIN_NAME, text, policy)),
                Some(Err(message)) => FileReview::Failed {
                    name: STDIN_NAME.to_string(),
                    error: NexusError::Custom(message.clone()),
                },
                None => continue,
            };
            reviews.push(review);
        } else if let Some(review) = file_reviews.next() {
            reviews.push(review);
        }
    }

    if let Some(logger) = logger {
        for review in &reviews {
            logger.log("validate", &summary_line(review));
        }
    }

    let outcome = Outcome::of(&reviews);
    (reviews, outcome)
}

fn split_stdin(inputs: &[PathBuf]) -> (Vec<usize>, Vec<PathBuf>) {
    let mut stdin_positions = Vec::new();
    let mut files = Vec::new();
    for (idx, input) in inputs.iter().enumerate() {
        if input == Path::new(STDIN_MARKER) {
            stdin_positions.push(idx);
        } else {
            files.push(input.clone());
        }
    }
    (stdin_positions, files)
}

async fn read_stdin<R: AsyncRead + Unpin>(stdin: &mut R) -> Result<String> {
    let mut bytes = Vec::new();
    stdin
        .read_to_end(&mut bytes)
        .await
        .map_err(|e| NexusError::Custom(format!("Cannot read stdin: {e}")))?;
    decode_script(STDIN_NAME, bytes)
}

fn summary_line(review: &FileReview) -> String {
    match review {
        FileReview::Reviewed(report) if report.verdict.is_accepted() => {
            format!("{}: accepted ({} lines)", report.name, report.line_count)
        }
        FileReview::Reviewed(report) => format!(
            "{}: rejected ({} issues)",
            report.name,
            report.verdict.issues().len()
        ),
        FileReview::Failed { name, error } => format!("{name}: error: {error}"),
    }
}

/// Human-readable report: a status line per input followed by its reasons.
pub fn render_text(reviews: &[FileReview], quiet: bool) -> String {
    let mut out = String::new();
    for review in reviews {
        match review {
            FileReview::Reviewed(report) if report.verdict.is_accepted() => {
                if !quiet {
                    out.push_str(&format!("{}: accepted\n", report.name));
                }
            }
            FileReview::Reviewed(report) => {
                out.push_str(&format!("{}: rejected\n", report.name));
                for message in &report.messages {
                    out.push_str(&format!("  {message}\n"));
                }
            }
            FileReview::Failed { name, error } => {
                out.push_str(&format!("{name}: error: {error}\n"));
            }
        }
    }
    out
}

pub fn render_json(reviews: &[FileReview]) -> Result<String> {
    Ok(serde_json::to_string_pretty(reviews)?)
}
