use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::cli_args::Cli;
use crate::git::DiffSource;
use crate::prompts::Language;

/// Backend selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMethod {
    Auto,
    Cli,
    Api,
}

impl GenerationMethod {
    pub fn tries_cli(&self) -> bool {
        matches!(self, GenerationMethod::Auto | GenerationMethod::Cli)
    }

    pub fn tries_api(&self) -> bool {
        matches!(self, GenerationMethod::Auto | GenerationMethod::Api)
    }
}

/// Model tier handed to the Claude CLI via `--model`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Haiku,
    Sonnet,
    Opus,
}

impl ModelTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Haiku => "haiku",
            ModelTier::Sonnet => "sonnet",
            ModelTier::Opus => "opus",
        }
    }
}

/// Final resolved configuration, read fresh per invocation. The core never
/// mutates this; persisting a discovered CLI path goes through
/// `save_cli_path` below.
#[derive(Debug, Clone)]
pub struct Config {
    pub repo: PathBuf,
    pub method: GenerationMethod,
    pub model: ModelTier,
    pub language: Language,
    pub multi_line: bool,
    pub diff_source: DiffSource,
    pub managed: bool,
    pub keep_co_authored_by: bool,
    pub cli_path: Option<PathBuf>,
    pub api_key: Option<String>,
    /// Endpoint override for the remote backend; `None` means the public
    /// Anthropic endpoint. File-config only, no CLI flag.
    pub api_url: Option<String>,
}

impl Config {
    /// Build the final config from CLI flags, environment, TOML file, and
    /// defaults.
    ///
    /// Precedence:
    ///   1. CLI flags (clap also resolves `ANTHROPIC_API_KEY` for `--api-key`)
    ///   2. TOML `~/.config/claude-commit.toml`
    ///   3. Hardcoded defaults
    pub fn from_sources(cli: &Cli) -> Self {
        let file = load_file_config().unwrap_or_default();

        Config {
            repo: cli.repo.clone(),
            method: cli
                .method
                .or(file.method)
                .unwrap_or(GenerationMethod::Auto),
            model: cli.model.or(file.model).unwrap_or(ModelTier::Haiku),
            language: cli.language.or(file.language).unwrap_or(Language::En),
            multi_line: cli.multi_line || file.multi_line.unwrap_or(false),
            diff_source: cli
                .diff_source
                .or(file.diff_source)
                .unwrap_or(DiffSource::Auto),
            managed: cli.managed || file.managed.unwrap_or(false),
            keep_co_authored_by: cli.keep_co_authored_by
                || file.keep_co_authored_by.unwrap_or(false),
            cli_path: cli.cli_path.clone().or(file.cli_path),
            api_key: cli.api_key.clone().or(file.api_key),
            api_url: file.api_url,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FileConfig {
    cli_path: Option<PathBuf>,
    api_key: Option<String>,
    api_url: Option<String>,
    method: Option<GenerationMethod>,
    model: Option<ModelTier>,
    language: Option<Language>,
    multi_line: Option<bool>,
    diff_source: Option<DiffSource>,
    managed: Option<bool>,
    keep_co_authored_by: Option<bool>,
}

/// Return `~/.config/claude-commit.toml`
fn config_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".config").join("claude-commit.toml"))
}

fn load_file_config() -> Option<FileConfig> {
    let path = config_path()?;
    load_file_config_from(&path)
}

fn load_file_config_from(path: &Path) -> Option<FileConfig> {
    if !path.exists() {
        return None;
    }

    let data = fs::read_to_string(path).ok()?;
    toml::from_str::<FileConfig>(&data).ok()
}

/// Persist a CLI path into the config file, preserving other settings.
pub fn save_cli_path(path: &Path) -> Result<()> {
    let config_file = config_path().context("could not determine home directory")?;
    save_cli_path_to(&config_file, path)
}

fn save_cli_path_to(config_file: &Path, cli_path: &Path) -> Result<()> {
    let mut file = load_file_config_from(config_file).unwrap_or_default();
    file.cli_path = Some(cli_path.to_path_buf());

    if let Some(parent) = config_file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {:?}", parent))?;
    }
    let data = toml::to_string_pretty(&file).context("failed to serialize config")?;
    fs::write(config_file, data)
        .with_context(|| format!("failed to write {:?}", config_file))?;
    Ok(())
}

/// Offer a freshly discovered path for persistence. Never overwrites an
/// explicit user choice; failure to save is only worth a warning.
pub fn autosave_cli_path(path: &Path) {
    let Some(config_file) = config_path() else {
        return;
    };
    let existing = load_file_config_from(&config_file)
        .unwrap_or_default()
        .cli_path;
    if existing.is_some() {
        return;
    }
    match save_cli_path_to(&config_file, path) {
        Ok(()) => log::info!("Claude CLI path auto-saved: {}", path.display()),
        Err(e) => log::warn!("Failed to auto-save CLI path: {e}"),
    }
}
