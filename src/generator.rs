use std::path::PathBuf;

use crate::backend::api::AnthropicClient;
use crate::backend::cli as cli_backend;
use crate::backend::locator::CliLocator;
use crate::config::{self, Config, GenerationMethod};
use crate::error::GenerateError;
use crate::git::{self, DiffResult};
use crate::parse;

/// Optional notifier invoked at pipeline-stage boundaries; callers use it to
/// drive a spinner or status line.
pub type Progress<'a> = Option<&'a dyn Fn(&str)>;

/// Interactive collaborator that can ask the user for a CLI path when
/// discovery fails. Returning `None` means the user declined.
pub trait PathPrompt {
    fn request_cli_path(&self) -> Option<PathBuf>;
}

fn notify(progress: Progress, message: &str) {
    if let Some(sink) = progress {
        sink(message);
    }
}

/// Generate a commit message for the repository's pending changes.
///
/// Policy:
/// - `auto`: CLI first; any CLI invocation failure falls back to the API.
///   With neither a discoverable CLI nor a credential, the combined
///   no-backend error surfaces instead of either alone.
/// - `cli`: the CLI is required; an undiscoverable one triggers an
///   interactive path request, and declining fails with guidance.
/// - `api`: credential required; CLI discovery is never attempted.
///
/// Each backend runs at most once per call; the only retries are the
/// explicit, user-visible path-request steps.
pub fn generate_commit_message(
    cfg: &Config,
    locator: &CliLocator,
    prompter: Option<&dyn PathPrompt>,
    progress: Progress,
) -> Result<String, GenerateError> {
    let set = cfg.language.prompt_set();

    // Managed delegation skips diff collection entirely; the CLI inspects
    // the repository itself. Only effective for the CLI method.
    if cfg.managed && cfg.method == GenerationMethod::Cli {
        notify(progress, "Claude Code managed mode...");
        let Some(cli) = locator.locate(cfg.cli_path.as_deref())? else {
            return Err(GenerateError::ManagedModeNeedsCli);
        };
        let prompt = (set.managed)(cfg.diff_source, cfg.keep_co_authored_by, "");
        let raw = cli_backend::run_cli_managed(&cli, &prompt, &cfg.repo, progress)?;
        return Ok(parse::parse_managed_response(&raw));
    }

    notify(progress, "Getting git diff...");
    let DiffResult { diff, stats } = git::get_diff(&cfg.repo, cfg.diff_source)?;

    if diff.trim().is_empty() && stats.trim().is_empty() {
        return Err(GenerateError::NoChanges);
    }

    notify(progress, "Preparing prompt...");
    let prompt = (set.generation)(&diff, &stats, cfg.multi_line);

    let mut cli_not_found = false;

    if cfg.method.tries_cli() {
        match locator.locate(cfg.cli_path.as_deref())? {
            Some(cli) => {
                if cfg.cli_path.is_none() {
                    config::autosave_cli_path(&cli);
                }
                match run_cli_once(cfg, &cli, &prompt, progress) {
                    Ok(message) => return Ok(message),
                    Err(e) if cfg.method == GenerationMethod::Cli => return Err(e),
                    Err(e) => log::warn!("CLI failed, trying API: {e}"),
                }
            }
            None => {
                cli_not_found = true;
                if cfg.method == GenerationMethod::Cli {
                    if let Some(path) = request_and_adopt_path(locator, prompter) {
                        return run_cli_once(cfg, &path, &prompt, progress);
                    }
                    return Err(GenerateError::CliUnavailable);
                }
            }
        }
    }

    if cfg.method.tries_api() {
        let Some(key) = cfg.api_key.as_ref() else {
            if cli_not_found {
                // One explicit, user-visible recovery: a manually supplied
                // CLI path. Declining means nothing can generate.
                if let Some(path) = request_and_adopt_path(locator, prompter) {
                    return run_cli_once(cfg, &path, &prompt, progress);
                }
                return Err(GenerateError::NoBackendAvailable);
            }
            return Err(GenerateError::MissingCredential);
        };

        notify(progress, "Generating with Anthropic API...");
        let raw = api_client(cfg, key).generate(&prompt, progress)?;
        return parse::parse_commit_message(&raw, cfg.multi_line);
    }

    Err(GenerateError::NoBackendAvailable)
}

/// Regenerate an existing message honoring free-text feedback.
pub fn edit_commit_message(
    cfg: &Config,
    locator: &CliLocator,
    current_message: &str,
    feedback: &str,
    progress: Progress,
) -> Result<String, GenerateError> {
    notify(progress, "Getting git diff...");
    let DiffResult { diff, stats } = git::get_diff(&cfg.repo, cfg.diff_source)?;

    notify(progress, "Regenerating based on feedback...");
    let set = cfg.language.prompt_set();
    let prompt = (set.edit)(current_message, feedback, &diff, &stats);

    if cfg.method.tries_cli() {
        if let Some(cli) = locator.locate(cfg.cli_path.as_deref())? {
            return run_cli_once(cfg, &cli, &prompt, progress);
        }
        if cfg.method == GenerationMethod::Cli {
            return Err(GenerateError::CliUnavailable);
        }
    }

    if cfg.method.tries_api() {
        let key = cfg
            .api_key
            .as_ref()
            .ok_or(GenerateError::MissingCredential)?;
        notify(progress, "Generating with Anthropic API...");
        let raw = api_client(cfg, key).generate(&prompt, progress)?;
        return parse::parse_commit_message(&raw, cfg.multi_line);
    }

    Err(GenerateError::NoBackendAvailable)
}

/// Managed delegation with a caller-supplied instruction.
pub fn generate_with_custom_prompt(
    cfg: &Config,
    locator: &CliLocator,
    instruction: &str,
    progress: Progress,
) -> Result<String, GenerateError> {
    notify(progress, "Regenerating with custom prompt...");

    let Some(cli) = locator.locate(cfg.cli_path.as_deref())? else {
        return Err(GenerateError::ManagedModeNeedsCli);
    };

    let set = cfg.language.prompt_set();
    let prompt = (set.managed)(cfg.diff_source, cfg.keep_co_authored_by, instruction);
    let raw = cli_backend::run_cli_managed(&cli, &prompt, &cfg.repo, progress)?;
    Ok(parse::parse_managed_response(&raw))
}

fn api_client(cfg: &Config, key: &str) -> AnthropicClient {
    match cfg.api_url.as_deref() {
        Some(url) => AnthropicClient::with_base_url(key.to_string(), url),
        None => AnthropicClient::new(key.to_string()),
    }
}

fn run_cli_once(
    cfg: &Config,
    cli: &std::path::Path,
    prompt: &str,
    progress: Progress,
) -> Result<String, GenerateError> {
    notify(progress, "Generating with Claude CLI...");
    let raw = cli_backend::run_cli(cli, prompt, cfg.model, progress)?;
    parse::parse_commit_message(&raw, cfg.multi_line)
}

fn request_and_adopt_path(
    locator: &CliLocator,
    prompter: Option<&dyn PathPrompt>,
) -> Option<PathBuf> {
    let path = prompter?.request_cli_path()?;
    locator.seed(path.clone());
    if let Err(e) = config::save_cli_path(&path) {
        log::warn!("Failed to save CLI path: {e}");
    }
    Some(path)
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use crate::config::ModelTier;
    use crate::git::DiffSource;
    use crate::prompts::Language;
    use std::fs;
    use std::path::Path;
    use std::process::Command;

    struct Declines;

    impl PathPrompt for Declines {
        fn request_cli_path(&self) -> Option<PathBuf> {
            None
        }
    }

    fn git(repo: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(repo)
            .status()
            .unwrap();
        assert!(status.success());
    }

    fn repo_with_staged_change() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        git(dir.path(), &["init", "-q"]);
        git(dir.path(), &["config", "user.email", "test@example.com"]);
        git(dir.path(), &["config", "user.name", "Test"]);
        fs::write(dir.path().join("a.txt"), "one\n").unwrap();
        git(dir.path(), &["add", "a.txt"]);
        git(dir.path(), &["commit", "-q", "-m", "init"]);
        fs::write(dir.path().join("a.txt"), "two\n").unwrap();
        git(dir.path(), &["add", "a.txt"]);
        dir
    }

    fn fake_cli(dir: &Path, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("claude");
        fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn base_config(repo: &Path) -> Config {
        Config {
            repo: repo.to_path_buf(),
            method: GenerationMethod::Cli,
            model: ModelTier::Haiku,
            language: Language::En,
            multi_line: false,
            diff_source: DiffSource::Auto,
            managed: false,
            keep_co_authored_by: false,
            cli_path: None,
            api_key: None,
            api_url: None,
        }
    }

    #[test]
    fn clean_repo_is_a_no_changes_error() {
        let repo = tempfile::tempdir().unwrap();
        git(repo.path(), &["init", "-q"]);

        let cfg = base_config(repo.path());
        let locator = CliLocator::new();
        let err = generate_commit_message(&cfg, &locator, None, None).unwrap_err();
        assert!(matches!(err, GenerateError::NoChanges));
    }

    #[test]
    fn cli_only_with_configured_cli_returns_parsed_message() {
        let repo = repo_with_staged_change();
        let cli = fake_cli(
            repo.path(),
            "echo 'Here is your message:'; echo 'feat(core): added a thing'",
        );

        let mut cfg = base_config(repo.path());
        cfg.cli_path = Some(cli);

        let locator = CliLocator::new();
        let message = generate_commit_message(&cfg, &locator, None, None).unwrap();
        assert_eq!(message, "feat(core): added a thing");
    }

    #[test]
    fn misconfigured_path_never_falls_through() {
        let repo = repo_with_staged_change();
        let mut cfg = base_config(repo.path());
        cfg.method = GenerationMethod::Auto;
        cfg.cli_path = Some(PathBuf::from("/no/such/claude"));
        cfg.api_key = Some("sk-unused".into());

        let locator = CliLocator::new();
        let err = generate_commit_message(&cfg, &locator, None, None).unwrap_err();
        assert!(matches!(err, GenerateError::ConfiguredPathNotFound(_)));
    }

    #[test]
    fn auto_without_credential_after_cli_failure_is_missing_credential() {
        let repo = repo_with_staged_change();
        let cli = fake_cli(repo.path(), "echo 'model unavailable' >&2; exit 1");

        let mut cfg = base_config(repo.path());
        cfg.method = GenerationMethod::Auto;
        cfg.cli_path = Some(cli);

        let locator = CliLocator::new();
        let err = generate_commit_message(&cfg, &locator, None, None).unwrap_err();
        assert!(matches!(err, GenerateError::MissingCredential));
    }

    #[test]
    fn cli_failure_in_cli_only_mode_propagates_detail() {
        let repo = repo_with_staged_change();
        let cli = fake_cli(repo.path(), "echo 'model unavailable' >&2; exit 1");

        let mut cfg = base_config(repo.path());
        cfg.cli_path = Some(cli);

        let locator = CliLocator::new();
        let err = generate_commit_message(&cfg, &locator, Some(&Declines), None).unwrap_err();
        match err {
            GenerateError::Backend { detail } => assert!(detail.contains("model unavailable")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn cli_only_undiscoverable_and_declined_gives_guidance() {
        let repo = repo_with_staged_change();
        let cfg = base_config(repo.path());
        let locator = CliLocator::with_discovery(|| None);

        let err = generate_commit_message(&cfg, &locator, Some(&Declines), None).unwrap_err();
        assert!(matches!(err, GenerateError::CliUnavailable));
    }

    #[test]
    fn auto_with_undiscoverable_cli_and_credential_uses_the_api() {
        use crate::backend::api::fake_server;

        let repo = repo_with_staged_change();
        let (url, server) = fake_server::spawn(
            "200 OK",
            r#"{"content":[{"type":"text","text":"Here you go:\nfeat(api): added remote generation"}]}"#,
        );

        let mut cfg = base_config(repo.path());
        cfg.method = GenerationMethod::Auto;
        cfg.api_key = Some("sk-test".into());
        cfg.api_url = Some(url);

        // Discovery comes up dry, so auto mode must reach the remote backend.
        let locator = CliLocator::with_discovery(|| None);
        let message = generate_commit_message(&cfg, &locator, None, None).unwrap();
        server.join().unwrap();

        // The noisy preamble is stripped by the same parser the CLI path uses.
        assert_eq!(message, "feat(api): added remote generation");
    }

    #[test]
    fn managed_mode_returns_cli_output_verbatim() {
        let repo = repo_with_staged_change();
        let cli = fake_cli(
            repo.path(),
            "printf 'feat: managed subject\\n\\nbody paragraph\\n'",
        );

        let mut cfg = base_config(repo.path());
        cfg.managed = true;
        cfg.cli_path = Some(cli);

        let locator = CliLocator::new();
        let message = generate_commit_message(&cfg, &locator, None, None).unwrap();
        assert_eq!(message, "feat: managed subject\n\nbody paragraph");
    }

    #[test]
    fn custom_prompt_carries_the_instruction() {
        let repo = repo_with_staged_change();
        // The fake backend echoes its stdin, so the instruction must appear.
        let cli = fake_cli(repo.path(), "cat");

        let mut cfg = base_config(repo.path());
        cfg.cli_path = Some(cli);

        let locator = CliLocator::new();
        let out =
            generate_with_custom_prompt(&cfg, &locator, "mention ticket ABC-42", None).unwrap();
        assert!(out.contains("mention ticket ABC-42"));
    }

    #[test]
    fn edit_flow_feeds_message_and_feedback_to_the_cli() {
        let repo = repo_with_staged_change();
        let cli = fake_cli(repo.path(), "cat");

        let mut cfg = base_config(repo.path());
        cfg.cli_path = Some(cli);

        let locator = CliLocator::new();
        let out = edit_commit_message(
            &cfg,
            &locator,
            "feat: old subject",
            "use the fix type",
            None,
        )
        .unwrap();
        // The fake backend echoes the prompt; the single-line parser then
        // extracts the embedded current message, proving it was sent.
        assert_eq!(out, "feat: old subject");
    }

    #[test]
    fn api_only_without_credential_is_missing_credential() {
        let repo = repo_with_staged_change();
        let mut cfg = base_config(repo.path());
        cfg.method = GenerationMethod::Api;

        let locator = CliLocator::new();
        let err = generate_commit_message(&cfg, &locator, None, None).unwrap_err();
        assert!(matches!(err, GenerateError::MissingCredential));
    }

    #[test]
    fn progress_labels_fire_in_pipeline_order() {
        use std::sync::Mutex;

        let repo = repo_with_staged_change();
        let cli = fake_cli(repo.path(), "echo 'chore: noted'");

        let mut cfg = base_config(repo.path());
        cfg.cli_path = Some(cli);

        let stages: Mutex<Vec<String>> = Mutex::new(Vec::new());
        let sink = |label: &str| stages.lock().unwrap().push(label.to_string());
        let sink_ref: &dyn Fn(&str) = &sink;

        let locator = CliLocator::new();
        generate_commit_message(&cfg, &locator, None, Some(sink_ref)).unwrap();

        let stages = stages.into_inner().unwrap();
        assert_eq!(
            stages,
            vec![
                "Getting git diff...",
                "Preparing prompt...",
                "Generating with Claude CLI...",
                "Using haiku model...",
            ]
        );
    }
}
