use serde::Serialize;
use std::fmt;

/// One policy violation found in a script.
///
/// `Display` renders the message shown to the uploader.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValidationIssue {
    #[serde(rename_all = "camelCase")]
    TooLong { line_count: usize, max_lines: usize },

    #[serde(rename_all = "camelCase")]
    MissingKeyword { keywords: Vec<String> },

    #[serde(rename_all = "camelCase")]
    BannedWord { line: usize, word: String },

    #[serde(rename_all = "camelCase")]
    BareLink { line: usize, keywords: Vec<String> },
}

impl ValidationIssue {
    /// 1-based line number for line-scoped issues.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::BannedWord { line, .. } | Self::BareLink { line, .. } => Some(*line),
            Self::TooLong { .. } | Self::MissingKeyword { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::TooLong { .. } => "tooLong",
            Self::MissingKeyword { .. } => "missingKeyword",
            Self::BannedWord { .. } => "bannedWord",
            Self::BareLink { .. } => "bareLink",
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLong {
                line_count,
                max_lines,
            } => write!(f, "Script is too long ({line_count}/{max_lines} lines)"),
            Self::MissingKeyword { keywords } => write!(
                f,
                "Script must contain at least one of the following keywords: {}",
                keywords.join(", ")
            ),
            Self::BannedWord { line, word } => write!(
                f,
                "Line {line}: Contains banned word \"{word}\". Script is not allowed."
            ),
            Self::BareLink { line, keywords } => write!(
                f,
                "Line {line}: Contains a link without a valid keyword ({}). Script is not allowed.",
                or_list(keywords)
            ),
        }
    }
}

/// "a, b, or c" / "a or b" / "a".
fn or_list(words: &[String]) -> String {
    match words {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} or {second}"),
        [init @ .., last] => format!("{}, or {last}", init.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_or_list_shapes() {
        assert_eq!(or_list(&words(&["if"])), "if");
        assert_eq!(or_list(&words(&["local", "if"])), "local or if");
        assert_eq!(
            or_list(&words(&["loadstring", "require", "local", "then", "if"])),
            "loadstring, require, local, then, or if"
        );
    }

    #[test]
    fn test_line_and_kind() {
        let issue = ValidationIssue::BannedWord {
            line: 4,
            word: "lootlabs".into(),
        };
        assert_eq!(issue.line(), Some(4));
        assert_eq!(issue.kind(), "bannedWord");

        let issue = ValidationIssue::TooLong {
            line_count: 2,
            max_lines: 1,
        };
        assert_eq!(issue.line(), None);
        assert_eq!(issue.to_string(), "Script is too long (2/1 lines)");
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let issue = ValidationIssue::BareLink {
            line: 7,
            keywords: words(&["local"]),
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["kind"], "bareLink");
        assert_eq!(json["line"], 7);
    }
}
