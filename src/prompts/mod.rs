pub mod en;
pub mod ua;
pub mod zh;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::git::DiffSource;

/// Diff text included in a generation prompt is capped at this many
/// characters; the backend does not need the whole change set to name it.
pub const GENERATION_DIFF_LIMIT: usize = 6000;

/// Edit prompts carry a shorter excerpt since the previous message and the
/// feedback already anchor the context.
pub const EDIT_DIFF_LIMIT: usize = 4000;

/// Supported prompt localizations. There is no fallback chain; an
/// unsupported tag is rejected at the CLI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Ua,
    Zh,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ua => "ua",
            Language::Zh => "zh",
        }
    }

    /// The prompt family for this language.
    pub fn prompt_set(&self) -> &'static PromptSet {
        match self {
            Language::En => &en::PROMPTS,
            Language::Ua => &ua::PROMPTS,
            Language::Zh => &zh::PROMPTS,
        }
    }
}

/// One localization's three prompt builders. The backend is a memoryless
/// completion function, so every builder produces a fully self-contained
/// instruction.
pub struct PromptSet {
    /// `(diff, stats, multi_line)` → generation prompt.
    pub generation: fn(&str, &str, bool) -> String,
    /// `(current_message, feedback, diff, stats)` → revision prompt.
    pub edit: fn(&str, &str, &str, &str) -> String,
    /// `(diff_source, keep_co_authored_by, custom_instruction)` → minimal
    /// delegation prompt for a backend that inspects the repository itself.
    pub managed: fn(DiffSource, bool, &str) -> String,
}

/// Truncate on a character boundary, mirroring the fixed caps above.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
