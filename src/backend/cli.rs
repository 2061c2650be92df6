use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tempfile::NamedTempFile;
use wait_timeout::ChildExt;

use crate::backend::locator::is_executable;
use crate::config::ModelTier;
use crate::error::GenerateError;

/// Wall-clock budget for one CLI invocation.
pub const CLI_TIMEOUT: Duration = Duration::from_secs(120);

/// Ceiling per output stream. Exceeding it is a signaled failure, never a
/// silent cut.
pub const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Pipe a generation prompt into the Claude CLI and return raw stdout.
pub fn run_cli(
    cli_path: &Path,
    prompt: &str,
    model: ModelTier,
    progress: Option<&dyn Fn(&str)>,
) -> Result<String, GenerateError> {
    if let Some(notify) = progress {
        notify(&format!("Using {} model...", model.as_str()));
    }
    invoke(cli_path, prompt, model.as_str(), None, CLI_TIMEOUT)
}

/// Managed delegation: same pipeline, but the CLI runs inside the repository
/// so it can inspect the changes itself. Always the haiku tier.
pub fn run_cli_managed(
    cli_path: &Path,
    prompt: &str,
    repo: &Path,
    progress: Option<&dyn Fn(&str)>,
) -> Result<String, GenerateError> {
    if let Some(notify) = progress {
        notify("Using haiku model (managed mode)...");
    }
    invoke(cli_path, prompt, "haiku", Some(repo), CLI_TIMEOUT)
}

fn invoke(
    cli_path: &Path,
    prompt: &str,
    model: &str,
    cwd: Option<&Path>,
    timeout: Duration,
) -> Result<String, GenerateError> {
    if !is_executable(cli_path) {
        return Err(GenerateError::CliVanished(cli_path.to_path_buf()));
    }

    // The prompt goes through a temp file rather than a shell argument;
    // arbitrary diff content is hostile to shell escaping. The file is
    // removed on every exit path when the handle drops.
    let prompt_file = NamedTempFile::with_prefix("claude-commit-prompt-")
        .and_then(|mut f| {
            f.write_all(prompt.as_bytes())?;
            f.flush()?;
            Ok(f)
        })
        .map_err(|e| GenerateError::Backend {
            detail: format!("failed to write prompt file: {e}"),
        })?;

    let pipeline = pipeline_command(prompt_file.path(), cli_path, model);
    log::debug!("Executing: {pipeline}");

    let mut command = shell_command(&pipeline);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            GenerateError::CliVanished(cli_path.to_path_buf())
        } else {
            GenerateError::Backend {
                detail: format!("failed to spawn CLI: {e}"),
            }
        }
    })?;

    let stdout_reader = spawn_capped_reader(child.stdout.take());
    let stderr_reader = spawn_capped_reader(child.stderr.take());

    let status = match child.wait_timeout(timeout).map_err(|e| GenerateError::Backend {
        detail: format!("failed to wait for CLI: {e}"),
    })? {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            // Join the drains so the temp file outlives every reader.
            let _ = stdout_reader.join();
            let _ = stderr_reader.join();
            return Err(GenerateError::Timeout);
        }
    };

    let (stdout_bytes, stdout_overflow) = stdout_reader.join().unwrap_or((Vec::new(), false));
    let (stderr_bytes, _) = stderr_reader.join().unwrap_or((Vec::new(), false));
    drop(prompt_file);

    let stdout = String::from_utf8_lossy(&stdout_bytes).to_string();
    let stderr = String::from_utf8_lossy(&stderr_bytes).trim().to_string();

    if !stderr.is_empty() {
        log::info!("CLI stderr: {stderr}");
    }
    if !stdout.is_empty() {
        let head: String = stdout.chars().take(500).collect();
        log::debug!("CLI stdout (first 500 chars): {head}");
    }

    if stdout_overflow {
        return Err(GenerateError::Backend {
            detail: format!("CLI output exceeded the {MAX_OUTPUT_BYTES} byte buffer"),
        });
    }

    if !status.success() {
        let mut details = Vec::new();
        if !stderr.is_empty() {
            details.push(format!("stderr: {stderr}"));
        }
        let stdout_trimmed = stdout.trim();
        if !stdout_trimmed.is_empty() {
            details.push(format!("stdout: {stdout_trimmed}"));
        }
        let detail_str = if details.is_empty() {
            String::new()
        } else {
            format!(" [{}]", details.join("; "))
        };
        return Err(GenerateError::Backend {
            detail: format!(
                "exit status {}{detail_str}",
                status.code().map_or_else(|| "killed".to_string(), |c| c.to_string())
            ),
        });
    }

    // Diagnostic noise on stderr does not invalidate a good answer; only
    // stderr *without* stdout counts as a failure.
    if stdout.trim().is_empty() && !stderr.is_empty() {
        return Err(GenerateError::Backend {
            detail: format!("CLI error output: {stderr}"),
        });
    }

    Ok(stdout)
}

/// `cat`/`type` the prompt file into the CLI with the model flag.
fn pipeline_command(prompt_file: &Path, cli_path: &Path, model: &str) -> String {
    let file = prompt_file.display();
    let cli = cli_path.display();
    if cfg!(windows) {
        format!(r#"type "{file}" | "{cli}" -p --model {model}"#)
    } else {
        format!(r#"cat "{file}" | "{cli}" -p --model {model}"#)
    }
}

/// Login shell so the user's profile environment (credentials, PATH
/// additions) is loaded before the CLI starts.
fn shell_command(pipeline: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(pipeline);
        cmd
    } else {
        let mut cmd = Command::new("/bin/bash");
        cmd.arg("-l").arg("-c").arg(pipeline);
        cmd
    }
}

/// Drain a child stream on its own thread, keeping at most
/// `MAX_OUTPUT_BYTES` and flagging overflow. Draining continues past the cap
/// so the child never blocks on a full pipe.
fn spawn_capped_reader<R: Read + Send + 'static>(
    stream: Option<R>,
) -> JoinHandle<(Vec<u8>, bool)> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let mut overflow = false;
        let Some(mut stream) = stream else {
            return (buf, overflow);
        };
        let mut chunk = [0u8; 8192];
        loop {
            match stream.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    let room = MAX_OUTPUT_BYTES.saturating_sub(buf.len());
                    let take = n.min(room);
                    buf.extend_from_slice(&chunk[..take]);
                    if take < n {
                        overflow = true;
                    }
                }
            }
        }
        (buf, overflow)
    })
}

/// Test seam: invoke with an explicit timeout.
#[cfg(test)]
fn invoke_for_test(
    cli_path: &Path,
    prompt: &str,
    timeout: Duration,
) -> Result<String, GenerateError> {
    invoke(cli_path, prompt, "haiku", None, timeout)
}
