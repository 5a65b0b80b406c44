//! Search-path scanning: command resolution and fuzzy lookup.
//!
//! Pure functions over an explicit search-path string so tests can run
//! against a controlled directory layout instead of the ambient `$PATH`.

use std::collections::HashSet;
use std::path::Path;

use panepilot_core::error::ToolError;

/// Resolve whether the first whitespace-delimited token of `command` names
/// an executable file on the given search path.
pub fn resolve_on_path(path_env: &str, command: &str) -> bool {
    let Some(name) = command.split_whitespace().next() else {
        return false;
    };

    std::env::split_paths(path_env)
        .any(|dir| !dir.as_os_str().is_empty() && is_executable(&dir.join(name)))
}

/// Collect distinct executable names on the search path whose lowercase
/// form contains the lowercase `query` substring.
///
/// Directories that cannot be listed are silently skipped. Fails when no
/// executable matches.
pub fn scan_matching(path_env: &str, query: &str) -> Result<Vec<String>, ToolError> {
    if path_env.is_empty() {
        return Err(ToolError::ExecutionFailed {
            tool_name: "getAvailableCommands".into(),
            reason: "PATH environment variable is empty".into(),
        });
    }

    let query = query.to_lowercase();
    let mut seen = HashSet::new();
    let mut commands = Vec::new();

    for dir in std::env::split_paths(path_env) {
        if dir.as_os_str().is_empty() {
            continue;
        }

        // Skip inaccessible directories
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !is_executable(&path) {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            if name.to_lowercase().contains(&query) && seen.insert(name.clone()) {
                commands.push(name);
            }
        }
    }

    if commands.is_empty() {
        return Err(ToolError::ExecutionFailed {
            tool_name: "getAvailableCommands".into(),
            reason: format!("no matching executable commands found for query: {query}"),
        });
    }

    Ok(commands)
}

fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[cfg(unix)]
    fn make_executable(dir: &Path, name: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    fn path_env(dirs: &[&Path]) -> String {
        std::env::join_paths(dirs)
            .unwrap()
            .to_string_lossy()
            .to_string()
    }

    #[cfg(unix)]
    #[test]
    fn resolve_finds_executable() {
        let dir = tempfile::tempdir().unwrap();
        make_executable(dir.path(), "htop");

        let path = path_env(&[dir.path()]);
        assert!(resolve_on_path(&path, "htop"));
        assert!(!resolve_on_path(&path, "nonexistent-xyz"));
    }

    #[cfg(unix)]
    #[test]
    fn resolve_uses_first_token_only() {
        let dir = tempfile::tempdir().unwrap();
        make_executable(dir.path(), "ls");

        let path = path_env(&[dir.path()]);
        assert!(resolve_on_path(&path, "ls -lh /tmp"));
    }

    #[cfg(unix)]
    #[test]
    fn resolve_ignores_non_executable_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes"), "plain file").unwrap();

        let path = path_env(&[dir.path()]);
        assert!(!resolve_on_path(&path, "notes"));
    }

    #[test]
    fn resolve_empty_command_is_false() {
        assert!(!resolve_on_path("/bin:/usr/bin", ""));
        assert!(!resolve_on_path("/bin:/usr/bin", "   "));
    }

    #[cfg(unix)]
    #[test]
    fn scan_matches_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        make_executable(dir.path(), "MyTool");
        make_executable(dir.path(), "other");

        let found = scan_matching(&path_env(&[dir.path()]), "mytool").unwrap();
        assert_eq!(found, vec!["MyTool"]);
    }

    #[cfg(unix)]
    #[test]
    fn scan_dedupes_across_directories() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        make_executable(dir_a.path(), "ls");
        make_executable(dir_b.path(), "ls");

        let found = scan_matching(&path_env(&[dir_a.path(), dir_b.path()]), "ls").unwrap();
        assert_eq!(found, vec!["ls"]);
    }

    #[cfg(unix)]
    #[test]
    fn scan_skips_unreadable_directories() {
        let dir = tempfile::tempdir().unwrap();
        make_executable(dir.path(), "grep");

        let missing = dir.path().join("does-not-exist");
        let found = scan_matching(&path_env(&[&missing, dir.path()]), "grep").unwrap();
        assert_eq!(found, vec!["grep"]);
    }

    #[test]
    fn scan_empty_path_is_error() {
        let err = scan_matching("", "ls").unwrap_err();
        assert!(err.to_string().contains("PATH"));
    }

    #[cfg(unix)]
    #[test]
    fn scan_no_match_is_error() {
        let dir = tempfile::tempdir().unwrap();
        make_executable(dir.path(), "ls");

        let err = scan_matching(&path_env(&[dir.path()]), "zz-no-such-tool").unwrap_err();
        assert!(err.to_string().contains("no matching"));
    }
}
