use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::GenerateError;

/// Name of the backend executable we look for.
pub const CLI_NAME: &str = "claude";

/// Discovers the Claude CLI on the host and remembers where it was found.
///
/// The cache lives for the host process and is revalidated lazily: a cached
/// path that stops existing is dropped and discovery runs again. The mutex
/// keeps two threads from racing to discover different paths.
pub struct CliLocator {
    cache: Mutex<Option<PathBuf>>,
    discover: fn() -> Option<PathBuf>,
}

impl Default for CliLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl CliLocator {
    pub fn new() -> Self {
        CliLocator {
            cache: Mutex::new(None),
            discover: discover_cli,
        }
    }

    /// Locator with a replaced discovery step. Host machines may well have a
    /// real CLI installed, so tests needing a miss must not probe the host.
    #[cfg(test)]
    pub(crate) fn with_discovery(discover: fn() -> Option<PathBuf>) -> Self {
        CliLocator {
            cache: Mutex::new(None),
            discover,
        }
    }

    /// Resolve the CLI path. Resolution order:
    ///
    /// 1. Explicitly configured path. An invalid one is a hard failure, not
    ///    a fallthrough; a misconfiguration must surface.
    /// 2. Previously discovered path, revalidated.
    /// 3. `which` lookup against the inherited environment.
    /// 4. Login-shell lookup (Unix): PATH entries only visible after
    ///    sourcing the user's shell profile.
    /// 5. Conventional install locations, with one wildcard segment for
    ///    version-manager layouts.
    ///
    /// All steps missing is `Ok(None)`; callers decide whether to prompt the
    /// user or fail outright.
    pub fn locate(&self, configured: Option<&Path>) -> Result<Option<PathBuf>, GenerateError> {
        if let Some(path) = configured.filter(|p| !p.as_os_str().is_empty()) {
            if is_executable(path) {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(GenerateError::ConfiguredPathNotFound(path.to_path_buf()));
        }

        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = cache.as_ref() {
            if is_executable(cached) {
                return Ok(Some(cached.clone()));
            }
            log::debug!("cached CLI path {:?} is stale, re-probing", cached);
            *cache = None;
        }

        let discovered = (self.discover)();

        if let Some(path) = discovered.as_ref() {
            log::info!("discovered Claude CLI at {:?}", path);
            *cache = Some(path.clone());
        }
        Ok(discovered)
    }

    /// Error-swallowing boolean view of `locate`.
    pub fn is_available(&self, configured: Option<&Path>) -> bool {
        matches!(self.locate(configured), Ok(Some(_)))
    }

    /// Adopt a user-supplied path into the cache.
    pub fn seed(&self, path: PathBuf) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        *cache = Some(path);
    }

    /// Snapshot of the cached path, if any.
    pub fn cached(&self) -> Option<PathBuf> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// PATH lookup, then login-shell lookup, then conventional locations.
fn discover_cli() -> Option<PathBuf> {
    which::which(CLI_NAME)
        .ok()
        .filter(|p| is_executable(p))
        .or_else(shell_profile_lookup)
        .or_else(|| common_cli_paths().iter().find_map(|p| find_with_glob(p)))
}

#[cfg(unix)]
pub(crate) fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub(crate) fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Re-source the user's shell profile and ask `which`; recovers PATH entries
/// the host process never inherited.
#[cfg(unix)]
fn shell_profile_lookup() -> Option<PathBuf> {
    use std::process::Command;

    let output = Command::new("/bin/bash")
        .arg("-lc")
        .arg(format!(
            "source ~/.zshrc 2>/dev/null || source ~/.bashrc 2>/dev/null || true; which {CLI_NAME}"
        ))
        .output()
        .ok()?;

    let found = String::from_utf8_lossy(&output.stdout);
    let path = PathBuf::from(found.trim().lines().next()?.trim());
    if !path.as_os_str().is_empty() && is_executable(&path) {
        Some(path)
    } else {
        None
    }
}

#[cfg(not(unix))]
fn shell_profile_lookup() -> Option<PathBuf> {
    None
}

/// Conventional install locations, checked after PATH-based lookups fail.
/// A `*` segment matches one directory level (nvm-style layouts).
fn common_cli_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    #[cfg(windows)]
    {
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join("AppData").join("Roaming").join("npm").join("claude.cmd"));
            paths.push(home.join("AppData").join("Local").join("npm").join("claude.cmd"));
            paths.push(home.join(".claude").join("local").join("claude.exe"));
        }
        paths.push(PathBuf::from("C:\\Program Files\\nodejs\\claude.cmd"));
        paths.push(PathBuf::from("C:\\Program Files (x86)\\nodejs\\claude.cmd"));
    }

    #[cfg(not(windows))]
    {
        paths.push(PathBuf::from("/usr/local/bin/claude"));
        paths.push(PathBuf::from("/usr/bin/claude"));
        paths.push(PathBuf::from("/opt/homebrew/bin/claude"));
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".local").join("bin").join("claude"));
            paths.push(home.join(".claude").join("local").join("claude"));
            paths.push(home.join(".nvm").join("versions").join("node").join("*").join("bin").join("claude"));
            paths.push(home.join(".npm-global").join("bin").join("claude"));
            paths.push(home.join("bin").join("claude"));
        }
    }

    paths
}

/// Resolve a candidate path that may contain one `*` segment by enumerating
/// the parent directory and testing each entry with the fixed suffix.
fn find_with_glob(pattern: &Path) -> Option<PathBuf> {
    let text = pattern.to_string_lossy();
    if !text.contains('*') {
        return is_executable(pattern).then(|| pattern.to_path_buf());
    }

    let mut parts = text.splitn(3, '*');
    let base = parts.next()?;
    let suffix = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let sep = std::path::MAIN_SEPARATOR;
    let base_dir = PathBuf::from(base.trim_end_matches(sep));
    let suffix = suffix.trim_start_matches(sep).to_string();

    for entry in fs::read_dir(&base_dir).ok()?.flatten() {
        let candidate = entry.path().join(&suffix);
        if is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn make_executable(dir: &Path, name: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn invalid_configured_path_is_a_hard_failure() {
        let locator = CliLocator::new();
        // A valid cache entry must not rescue a misconfigured explicit path.
        locator.seed(PathBuf::from("/bin/sh"));

        let result = locator.locate(Some(Path::new("/definitely/not/here/claude")));
        assert!(matches!(
            result,
            Err(GenerateError::ConfiguredPathNotFound(_))
        ));
    }

    #[test]
    fn empty_configured_path_is_treated_as_unset() {
        let locator = CliLocator::new();
        locator.seed(PathBuf::from("/bin/sh"));

        let found = locator.locate(Some(Path::new(""))).unwrap();
        assert_eq!(found, Some(PathBuf::from("/bin/sh")));
    }

    #[cfg(unix)]
    #[test]
    fn valid_cache_short_circuits_discovery() {
        let dir = tempfile::tempdir().unwrap();
        let exe = make_executable(dir.path(), "claude");

        let locator = CliLocator::with_discovery(|| None);
        locator.seed(exe.clone());

        // Two sequential calls both resolve from the cache; discovery would
        // never return this temp path.
        assert_eq!(locator.locate(None).unwrap(), Some(exe.clone()));
        assert_eq!(locator.locate(None).unwrap(), Some(exe));
    }

    #[cfg(unix)]
    #[test]
    fn stale_cache_entry_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let exe = make_executable(dir.path(), "claude");

        let locator = CliLocator::with_discovery(|| None);
        locator.seed(exe.clone());
        fs::remove_file(&exe).unwrap();

        assert_eq!(locator.locate(None).unwrap(), None);
        assert_eq!(locator.cached(), None);
    }

    #[cfg(unix)]
    #[test]
    fn glob_resolves_one_wildcard_segment() {
        let dir = tempfile::tempdir().unwrap();
        let versions = dir.path().join("versions");
        fs::create_dir_all(versions.join("v20.1.0").join("bin")).unwrap();
        let exe = make_executable(&versions.join("v20.1.0").join("bin"), "claude");

        let pattern = versions.join("*").join("bin").join("claude");
        assert_eq!(find_with_glob(&pattern), Some(exe));
    }

    #[test]
    fn glob_with_missing_base_dir_finds_nothing() {
        let pattern = PathBuf::from("/nonexistent-base/*/bin/claude");
        assert_eq!(find_with_glob(&pattern), None);
    }

    #[test]
    fn all_discovery_steps_missing_is_none_not_an_error() {
        let locator = CliLocator::with_discovery(|| None);
        assert_eq!(locator.locate(None).unwrap(), None);
    }

    #[test]
    fn is_available_is_the_boolean_view_of_locate() {
        let missing = CliLocator::with_discovery(|| None);
        assert!(!missing.is_available(None));
        // The hard configured-path error is swallowed into false here.
        assert!(!missing.is_available(Some(Path::new("/definitely/not/here/claude"))));

        let found = CliLocator::with_discovery(|| None);
        found.seed(PathBuf::from("/bin/sh"));
        assert!(found.is_available(None));
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("claude");
        fs::write(&path, "not a program").unwrap();
        assert!(!is_executable(&path));
    }
}
