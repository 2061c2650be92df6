mod backend;
mod cli_args;
mod config;
mod error;
mod generator;
mod git;
mod logging;
mod parse;
mod prompts;

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;
use indicatif::ProgressBar;

use crate::backend::locator::{CliLocator, is_executable};
use crate::cli_args::{Cli, Command};
use crate::config::Config;
use crate::generator::PathPrompt;

/// Ask the user a question and return a trimmed input line.
fn prompt_input(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut buf = String::new();
    io::stdin().read_line(&mut buf)?;
    Ok(buf.trim().to_string())
}

/// Interactive path entry, with the spinner parked while the user types.
struct StdinPrompter<'a> {
    spinner: &'a ProgressBar,
}

impl PathPrompt for StdinPrompter<'_> {
    fn request_cli_path(&self) -> Option<PathBuf> {
        self.spinner.suspend(|| {
            let answer = prompt_input(
                "Claude CLI not found. Enter the full path to the executable (leave empty to skip): ",
            )
            .ok()?;
            if answer.is_empty() {
                return None;
            }

            let path = PathBuf::from(answer);
            if is_executable(&path) {
                Some(path)
            } else {
                eprintln!("File not found or not executable: {}", path.display());
                None
            }
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    let cfg = Config::from_sources(&cli);
    let locator = CliLocator::new();

    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(120));

    let progress = |label: &str| spinner.set_message(label.to_string());
    let progress_ref: &dyn Fn(&str) = &progress;
    let prompter = StdinPrompter { spinner: &spinner };

    let result = match &cli.command {
        Some(Command::Edit { feedback }) => {
            let Some(current) = git::read_commit_editmsg(&cfg.repo)? else {
                spinner.finish_and_clear();
                bail!("No commit message to edit. Generate one first.");
            };
            generator::edit_commit_message(
                &cfg,
                &locator,
                current.trim(),
                feedback,
                Some(progress_ref),
            )
        }
        Some(Command::Prompt { instruction }) => generator::generate_with_custom_prompt(
            &cfg,
            &locator,
            instruction,
            Some(progress_ref),
        ),
        None => {
            if let (Ok(staged), Ok(unstaged)) = (
                git::staged_change_count(&cfg.repo),
                git::unstaged_change_count(&cfg.repo),
            ) {
                log::info!("Changes: {staged} staged file(s), {unstaged} unstaged file(s)");
            }
            generator::generate_commit_message(
                &cfg,
                &locator,
                Some(&prompter),
                Some(progress_ref),
            )
        }
    };

    spinner.finish_and_clear();
    let message = result?;

    if cli.apply {
        git::write_commit_editmsg(&cfg.repo, &message)?;
        println!("Commit message written to COMMIT_EDITMSG.");
    } else {
        println!();
        println!("----- Commit Message Preview -----");
        println!("{message}");
        println!("----------------------------------");
    }

    Ok(())
}
