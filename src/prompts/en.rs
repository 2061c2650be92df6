//! English prompt family.

use super::{EDIT_DIFF_LIMIT, GENERATION_DIFF_LIMIT, PromptSet, truncate_chars};
use crate::git::DiffSource;

pub static PROMPTS: PromptSet = PromptSet {
    generation: generation_prompt,
    edit: edit_prompt,
    managed: managed_prompt,
};

fn generation_prompt(diff: &str, stats: &str, multi_line: bool) -> String {
    let diff = truncate_chars(diff, GENERATION_DIFF_LIMIT);

    if multi_line {
        return format!(
            r#"Analyze git changes and generate detailed commit message in conventional commits format.

Change statistics:
{stats}

Diff (first 6000 characters):
{diff}

RESPONSE FORMAT:
<type>(<scope>): <subject>

<body>

<footer>

RULES:
- Subject: PAST TENSE, max 50 characters, no period
- Body: detailed description of changes (what and why)
- Footer: Breaking changes, issue references
- Type: feat/fix/refactor/docs/style/test/chore/perf
- Use verbs: added, fixed, updated, removed, refactored

Example:
feat(auth): added Google OAuth provider

Implemented authentication via Google OAuth 2.0.
Added token handling and refresh mechanism.
Updated configuration to support new providers.

Closes #123

Return ONLY the commit message in the specified format, no explanations."#
        );
    }

    format!(
        r#"Analyze git changes and generate commit message in conventional commits format.

Change statistics:
{stats}

Diff (first 6000 characters):
{diff}

STRICT RULES:
- Format: <type>(<scope>): <subject>
- Type: feat/fix/refactor/docs/style/test/chore/perf
- Subject in PAST TENSE (what WAS DONE), max 50 characters, no period
- Use verbs like: added, fixed, updated, removed, refactored
- WRONG: "add feature", "fix bug", "update styles"
- CORRECT: "added feature", "fixed bug", "updated styles"

Examples:
feat(auth): added Google OAuth provider
fix(api): fixed validation error in user endpoint
refactor(store): optimized cart state management
docs(readme): updated installation instructions

Return ONLY the commit message (one line), no explanations."#
    )
}

fn edit_prompt(current_message: &str, user_feedback: &str, diff: &str, stats: &str) -> String {
    let diff = truncate_chars(diff, EDIT_DIFF_LIMIT);

    format!(
        r#"Current commit message:
{current_message}

User feedback:
{user_feedback}

Git changes:
{stats}

{diff}

Regenerate the commit message considering user feedback.
Follow conventional commits format.
Return ONLY the new commit message, no explanations."#
    )
}

fn managed_prompt(source: DiffSource, keep_co_authored_by: bool, custom: &str) -> String {
    let scope = match source {
        DiffSource::Staged => "Only consider staged changes.",
        DiffSource::All => "Consider all changes in the working tree.",
        DiffSource::Auto => {
            "Consider staged changes; if nothing is staged, consider all changes."
        }
    };

    let mut prompt = format!(
        "Generate a git commit message for the current changes, in English. {scope} Output ONLY the commit message content, nothing else."
    );
    if !custom.is_empty() {
        prompt.push_str(&format!("\n\nAdditional instructions: {custom}"));
    }
    if keep_co_authored_by {
        prompt.push_str(
            "\n\nKeep at the end of the commit message:\n🤖 Generated with Claude Code\nCo-Authored-By: Claude <noreply@anthropic.com>",
        );
    }
    prompt
}
