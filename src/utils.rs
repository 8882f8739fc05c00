use std::path::{Path, PathBuf};

/// Resolves a program name the way `execvp` would: names containing a
/// slash are taken as paths, everything else is looked up in `paths`.
pub fn search_cmd(cmd: &str, paths: &str) -> Option<PathBuf> {
    // If command contains a slash, use it directly without PATH search
    if cmd.contains('/') {
        let path = Path::new(cmd);
        if path.is_file() && is_executable(path) {
            return Some(path.to_path_buf());
        }
        return None;
    }

    for dir in paths.split(':') {
        if dir.is_empty() {
            continue;
        }
        let cmd_path = Path::new(dir).join(cmd);
        if cmd_path.is_file() && is_executable(&cmd_path) {
            return Some(cmd_path);
        }
    }
    None
}

fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(metadata) = path.metadata() {
        let mode = metadata.permissions().mode();
        return mode & 0o111 != 0; // Check for execute permission
    }
    false
}

pub fn is_builtin(cmd: &str) -> bool {
    crate::builtins::BUILTINS.contains(&cmd)
}
