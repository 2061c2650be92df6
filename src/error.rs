use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong between "give me a commit message" and
/// having one. Callers match on variants to decide whether the failure is
/// user-actionable (credentials, paths) or just a bad run (timeout, empty
/// response).
#[derive(Error, Debug)]
pub enum GenerateError {
    /// An explicitly configured CLI path that fails the executability check.
    /// This never falls through to auto-discovery; a misconfiguration must
    /// surface.
    #[error("configured CLI path not found: {0}")]
    ConfiguredPathNotFound(PathBuf),

    /// The executable existed at discovery time but was gone at invocation.
    /// Recoverable: the next call re-probes from scratch.
    #[error("CLI executable not found at: {0}")]
    CliVanished(PathBuf),

    #[error("CLI process timed out after 2 minutes. Try a smaller diff or check your connection.")]
    Timeout,

    /// Backend produced an error; carries captured stderr/stdout detail for
    /// diagnostics.
    #[error("CLI execution failed: {detail}")]
    Backend { detail: String },

    #[error(
        "ANTHROPIC_API_KEY not found. Set it in the config file, --api-key, or the environment."
    )]
    MissingCredential,

    #[error("Invalid API key. Check your ANTHROPIC_API_KEY.")]
    InvalidCredential,

    #[error("Rate limit exceeded. Please wait and try again.")]
    RateLimit,

    #[error("Empty response from CLI")]
    EmptyResponse,

    #[error("No changes found. Stage some files first.")]
    NoChanges,

    #[error("Failed to get git diff: {0}")]
    Diff(String),

    #[error(
        "Claude CLI not found and no path configured. Run \"which claude\" in a terminal to find the path."
    )]
    CliUnavailable,

    #[error(
        "No generation method available. Install the Claude CLI or set ANTHROPIC_API_KEY."
    )]
    NoBackendAvailable,

    #[error(
        "Managed mode requires the Claude CLI. Install it or disable managed mode."
    )]
    ManagedModeNeedsCli,
}
