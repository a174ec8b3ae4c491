use std::path::{Component, Path, PathBuf};

/// Expand a leading `~` and make `user_path` absolute against the working directory.
///
/// `..` components are folded lexically; the path does not have to exist.
pub fn absolute_path(user_path: &str) -> PathBuf {
    let expanded = match user_path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => match dirs::home_dir() {
            Some(home) => home.join(rest.trim_start_matches('/')),
            None => PathBuf::from(user_path),
        },
        _ => PathBuf::from(user_path),
    };

    let joined = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    };

    normalize(&joined)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
