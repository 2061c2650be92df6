use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command as GitCommand;
use std::thread;

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::GenerateError;

/// Ceiling on captured git output. Huge repositories must not exhaust
/// memory; excess diff text is cut off rather than failing the call.
pub const MAX_GIT_OUTPUT: usize = 10 * 1024 * 1024;

/// Which change set feeds the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffSource {
    /// Staged changes only.
    Staged,
    /// Full working-tree changes.
    All,
    /// Staged changes, falling back to the working tree when nothing is staged.
    Auto,
}

/// Raw unified diff text plus the short stat summary, as one immutable pair.
#[derive(Debug, Clone)]
pub struct DiffResult {
    pub diff: String,
    pub stats: String,
}

/// Run a git command in `repo` and capture stdout as String.
pub fn git_output(repo: &Path, args: &[&str]) -> Result<String> {
    let output = GitCommand::new("git")
        .args(args)
        .current_dir(repo)
        .output()
        .with_context(|| format!("failed to run git {:?}", args))?;

    if !output.status.success() {
        return Err(anyhow!(
            "git {:?} exited with status {:?}: {}",
            args,
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    let mut text = String::from_utf8_lossy(&output.stdout).to_string();
    if text.len() > MAX_GIT_OUTPUT {
        let mut end = MAX_GIT_OUTPUT;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    Ok(text)
}

/// Fetch a diff/stat pair with the two independent reads running concurrently.
fn diff_pair(repo: &Path, diff_args: &[&str], stat_args: &[&str]) -> Result<DiffResult> {
    thread::scope(|scope| {
        let diff_handle = scope.spawn(|| git_output(repo, diff_args));
        let stats = git_output(repo, stat_args)?;
        let diff = diff_handle
            .join()
            .map_err(|_| anyhow!("diff reader thread panicked"))??;
        Ok(DiffResult { diff, stats })
    })
}

/// Obtain the change set and stat summary for `repo` according to `source`.
///
/// Staged-empty with a non-`staged` source falls back to the working tree.
/// Both-empty is not an error here; the orchestrator decides whether "no
/// changes" is worth surfacing.
pub fn get_diff(repo: &Path, source: DiffSource) -> Result<DiffResult, GenerateError> {
    if source != DiffSource::All {
        let staged = diff_pair(
            repo,
            &["diff", "--cached", "--unified=1"],
            &["diff", "--cached", "--stat"],
        )
        .map_err(|e| GenerateError::Diff(e.to_string()))?;

        if !staged.diff.trim().is_empty() || source == DiffSource::Staged {
            return Ok(staged);
        }
    }

    diff_pair(repo, &["diff", "--unified=1"], &["diff", "--stat"])
        .map_err(|e| GenerateError::Diff(e.to_string()))
}

fn name_only_count(repo: &Path, args: &[&str]) -> Result<usize> {
    let output = git_output(repo, args)?;
    Ok(output.lines().filter(|l| !l.trim().is_empty()).count())
}

/// Number of files with staged changes.
pub fn staged_change_count(repo: &Path) -> Result<usize> {
    name_only_count(repo, &["diff", "--cached", "--name-only"])
}

/// Number of files with unstaged changes.
pub fn unstaged_change_count(repo: &Path) -> Result<usize> {
    name_only_count(repo, &["diff", "--name-only"])
}

/// Get the path to the Git directory (e.g. .git) for `repo`.
pub fn git_dir(repo: &Path) -> Result<PathBuf> {
    let dir = git_output(repo, &["rev-parse", "--git-dir"])?
        .trim()
        .to_string();
    let path = PathBuf::from(dir);
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(repo.join(path))
    }
}

/// Write the commit message into .git/COMMIT_EDITMSG so the next `git commit`
/// will offer it as the default message in the editor.
pub fn write_commit_editmsg(repo: &Path, message: &str) -> Result<()> {
    let path = git_dir(repo)?.join("COMMIT_EDITMSG");
    fs::write(&path, message)
        .with_context(|| format!("failed to write commit message to {:?}", path))?;
    Ok(())
}

/// Read back the current COMMIT_EDITMSG content, if any.
pub fn read_commit_editmsg(repo: &Path) -> Result<Option<String>> {
    let path = git_dir(repo)?.join("COMMIT_EDITMSG");
    if !path.exists() {
        return Ok(None);
    }
    let text =
        fs::read_to_string(&path).with_context(|| format!("failed to read {:?}", path))?;
    Ok(Some(text))
}
