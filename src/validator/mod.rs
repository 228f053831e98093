//! Script content validation.
//!
//! `validate` is pure: it reads its arguments and returns every violation in
//! a fixed order. It never logs and never fails.

mod issue;

pub use issue::ValidationIssue;

use crate::policy::PolicyConfiguration;

const COMMENT_MARKER: &str = "--";

/// Whitespace plus the byte-order mark some editors put in front of line 1.
fn is_blank(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}

/// Returns every policy violation in `source`, in this order:
/// length, required keyword, then per-line issues by line number.
pub fn validate(source: &str, config: &PolicyConfiguration) -> Vec<ValidationIssue> {
    let lines: Vec<&str> = source.split('\n').collect();
    let mut issues = Vec::new();

    if lines.len() > config.max_lines() {
        issues.push(ValidationIssue::TooLong {
            line_count: lines.len(),
            max_lines: config.max_lines(),
        });
    }

    // Whole text, comments included.
    if !config.has_required_keyword(source) {
        issues.push(ValidationIssue::MissingKeyword {
            keywords: config.required_keywords().to_vec(),
        });
    }

    for (idx, line) in lines.iter().enumerate() {
        let number = idx + 1;
        let trimmed = line.trim_matches(is_blank);
        if trimmed.starts_with(COMMENT_MARKER) {
            continue;
        }

        let lower = trimmed.to_lowercase();
        for word in config.banned_words_in(&lower) {
            issues.push(ValidationIssue::BannedWord {
                line: number,
                word: word.to_string(),
            });
        }

        // Case-sensitive on the untouched line.
        if config.has_link(line) && !config.has_safe_context(line) {
            issues.push(ValidationIssue::BareLink {
                line: number,
                keywords: config.safe_context_keywords().to_vec(),
            });
        }
    }

    issues
}

/// `validate`, rendered to the messages shown to uploaders.
pub fn validate_messages(source: &str, config: &PolicyConfiguration) -> Vec<String> {
    validate(source, config)
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyFile;

    const LINK_MESSAGE: &str = "Contains a link without a valid keyword (loadstring, require, local, then, or if). Script is not allowed.";

    fn messages(source: &str) -> Vec<String> {
        validate_messages(source, &PolicyConfiguration::standard())
    }

    /// Builds a script whose line `n` (1-based) is `line` and whose other
    /// lines are harmless.
    fn script_with_line(n: usize, line: &str) -> String {
        let mut lines = vec!["local ok = true"; n];
        lines[n - 1] = line;
        lines.join("\n")
    }

    #[test]
    fn test_clean_script_is_accepted() {
        assert!(messages("local x = 1").is_empty());
    }

    #[test]
    fn test_deterministic() {
        let source = "print(1)\nworkink http://a.b\n-- c";
        let policy = PolicyConfiguration::standard();
        assert_eq!(validate(source, &policy), validate(source, &policy));
    }

    #[test]
    fn test_too_long_only() {
        let source = vec!["local"; 1001].join("\n");
        assert_eq!(messages(&source), vec!["Script is too long (1001/1000 lines)"]);
    }

    #[test]
    fn test_exactly_max_lines_is_fine() {
        let source = vec!["local"; 1000].join("\n");
        assert!(messages(&source).is_empty());
    }

    #[test]
    fn test_trailing_newline_counts_as_a_line() {
        let policy = PolicyFile {
            max_lines: 2,
            ..PolicyFile::default()
        }
        .compile()
        .unwrap();
        assert!(validate("local a\nlocal b", &policy).is_empty());
        assert_eq!(
            validate_messages("local a\nlocal b\n", &policy),
            vec!["Script is too long (3/2 lines)"]
        );
    }

    #[test]
    fn test_missing_keyword() {
        assert_eq!(
            messages("print(1)"),
            vec!["Script must contain at least one of the following keywords: loadstring, local, luarmor"]
        );
    }

    #[test]
    fn test_empty_source_is_one_line_missing_keyword() {
        let issues = validate("", &PolicyConfiguration::standard());
        assert_eq!(issues.len(), 1);
        assert!(matches!(issues[0], ValidationIssue::MissingKeyword { .. }));

        let one_line = PolicyFile {
            max_lines: 1,
            ..PolicyFile::default()
        }
        .compile()
        .unwrap();
        let issues = validate("", &one_line);
        assert!(!issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::TooLong { .. })));
    }

    #[test]
    fn test_comment_lines_count_toward_length() {
        let policy = PolicyFile {
            max_lines: 2,
            ..PolicyFile::default()
        }
        .compile()
        .unwrap();
        assert_eq!(
            validate_messages("local a\n-- c\n-- d", &policy),
            vec!["Script is too long (3/2 lines)"]
        );
    }

    #[test]
    fn test_byte_order_mark_before_comment() {
        let source = "\u{feff}-- see https://linkvertise.com\nlocal x = 1";
        assert!(messages(source).is_empty());

        let source = "\u{feff}print('lootdest')\nlocal x = 1";
        assert_eq!(
            messages(source),
            vec!["Line 1: Contains banned word \"lootdest\". Script is not allowed."]
        );
    }

    #[test]
    fn test_required_keyword_ignores_case_and_comments() {
        assert!(messages("LoadString(game:HttpGet(x))()").is_empty());
        assert!(messages("-- luarmor\nprint(1)").is_empty());
    }

    #[test]
    fn test_comment_line_is_exempt() {
        let source = script_with_line(3, "-- workink http://evil.com");
        assert!(messages(&source).is_empty());

        let indented = script_with_line(3, "   \t-- lootlabs https://x.y");
        assert!(messages(&indented).is_empty());
    }

    #[test]
    fn test_banned_word() {
        let source = script_with_line(5, "getgenv().workink = true");
        assert_eq!(
            messages(&source),
            vec!["Line 5: Contains banned word \"workink\". Script is not allowed."]
        );
    }

    #[test]
    fn test_banned_word_ignores_case() {
        let source = script_with_line(2, "local url = 'LinkVertise'");
        assert_eq!(
            messages(&source),
            vec!["Line 2: Contains banned word \"linkvertise\". Script is not allowed."]
        );
    }

    #[test]
    fn test_each_banned_word_reported() {
        let source = script_with_line(1, "local a = 'lootlabs workink'");
        assert_eq!(
            messages(&source),
            vec![
                "Line 1: Contains banned word \"workink\". Script is not allowed.",
                "Line 1: Contains banned word \"lootlabs\". Script is not allowed.",
            ]
        );
    }

    #[test]
    fn test_bare_link() {
        let source = script_with_line(7, "print(\"http://example.com\")");
        assert_eq!(messages(&source), vec![format!("Line 7: {LINK_MESSAGE}")]);
    }

    #[test]
    fn test_link_with_safe_keyword() {
        let source = script_with_line(7, "local x = http://example.com");
        assert!(messages(&source).is_empty());

        let source = script_with_line(2, "loadstring(game:HttpGet(\"https://x.y/s.lua\"))()");
        assert!(messages(&source).is_empty());
    }

    #[test]
    fn test_link_match_is_case_sensitive() {
        // Upper-case scheme is not a link.
        let source = script_with_line(2, "print(\"HTTP://example.com\")");
        assert!(messages(&source).is_empty());

        // Capitalised keyword is not a safe context.
        let source = script_with_line(2, "Local x = \"https://example.com\"");
        assert_eq!(messages(&source), vec![format!("Line 2: {LINK_MESSAGE}")]);
    }

    #[test]
    fn test_safe_keyword_is_substring_match() {
        let source = script_with_line(2, "gift(\"https://example.com\")");
        assert!(messages(&source).is_empty());
    }

    #[test]
    fn test_scheme_alone_is_not_a_link() {
        let source = script_with_line(2, "print(\"http:// \")");
        assert!(messages(&source).is_empty());
    }

    #[test]
    fn test_banned_word_and_link_on_one_line() {
        let source = script_with_line(4, "print(\"https://workink.net/abc\")");
        assert_eq!(
            messages(&source),
            vec![
                "Line 4: Contains banned word \"workink\". Script is not allowed.".to_string(),
                format!("Line 4: {LINK_MESSAGE}"),
            ]
        );
    }

    #[test]
    fn test_crlf_lines() {
        let source = "local a = 1\r\n-- workink\r\nprint('lootdest')\r\n";
        assert_eq!(
            messages(source),
            vec!["Line 3: Contains banned word \"lootdest\". Script is not allowed."]
        );
    }

    #[test]
    fn test_issue_order() {
        let mut lines = vec!["print(1)"; 6];
        lines[1] = "print(\"https://a.b\")";
        lines[4] = "x = 'workink'";
        let source = lines.join("\n");
        let policy = PolicyFile {
            max_lines: 5,
            ..PolicyFile::default()
        }
        .compile()
        .unwrap();

        let issues = validate(&source, &policy);
        let kinds: Vec<_> = issues.iter().map(ValidationIssue::kind).collect();
        assert_eq!(kinds, vec!["tooLong", "missingKeyword", "bareLink", "bannedWord"]);
        assert_eq!(issues[2].line(), Some(2));
        assert_eq!(issues[3].line(), Some(5));
    }

    #[test]
    fn test_custom_policy_substitutes() {
        let policy = PolicyFile {
            required_keywords: vec!["return".into()],
            banned_words: vec!["pastebin".into()],
            safe_context_keywords: vec!["game".into()],
            ..PolicyFile::default()
        }
        .compile()
        .unwrap();

        assert!(validate("return game:HttpGet(\"https://a.b\")", &policy).is_empty());
        assert_eq!(
            validate_messages("return 'pastebin'\nprint(\"https://a.b\")", &policy),
            vec![
                "Line 1: Contains banned word \"pastebin\". Script is not allowed.",
                "Line 2: Contains a link without a valid keyword (game). Script is not allowed.",
            ]
        );
    }
}
