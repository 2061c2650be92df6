use std::sync::LazyLock;

use regex_lite::Regex;

use crate::error::GenerateError;

/// Conventional-commit subject line: `type(scope): subject`.
static CONVENTIONAL_COMMIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(feat|fix|docs|style|refactor|test|chore|perf)(\(.+?\))?:.+")
        .expect("conventional commit pattern must compile")
});

/// Last-resort message when the backend answered with nothing usable.
pub const FALLBACK_MESSAGE: &str = "chore: update code";

/// Extract a single usable commit message from raw backend output.
///
/// Backends sometimes emit reasoning before the final answer, so single-line
/// mode scans from the end and the *last* conventional-commit line wins.
/// Multi-line mode instead takes everything from the *first* matching line
/// onward, capturing subject + body + footer as one block.
///
/// A response with no conventional-commit line degrades to the last
/// non-empty line rather than failing.
pub fn parse_commit_message(raw: &str, multi_line: bool) -> Result<String, GenerateError> {
    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    if lines.is_empty() {
        return Err(GenerateError::EmptyResponse);
    }

    if multi_line {
        if let Some(start) = lines.iter().position(|l| CONVENTIONAL_COMMIT.is_match(l)) {
            return Ok(lines[start..].join("\n"));
        }
    }

    if let Some(line) = lines.iter().rev().find(|l| CONVENTIONAL_COMMIT.is_match(l)) {
        return Ok((*line).to_string());
    }

    // Non-empty here, so best-effort degradation is always possible.
    Ok(lines[lines.len() - 1].to_string())
}

/// Managed-mode responses are trusted to already be well-formed; return them
/// trimmed verbatim, with the literal fallback for a blank answer.
pub fn parse_managed_response(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        FALLBACK_MESSAGE.to_string()
    } else {
        trimmed.to_string()
    }
}
