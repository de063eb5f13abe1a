use std::path::{Component, Path, PathBuf};

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    } else if path == "~" {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home);
        }
    }
    PathBuf::from(path)
}

/// Resolves a configured directory: tilde first, then relative to `base`.
pub fn resolve_dir(raw: &str, base: &Path) -> PathBuf {
    let expanded = expand_tilde(raw);
    let joined = if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    };
    let cleaned: PathBuf = joined
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if cleaned.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        cleaned
    }
}

/// Path of a watch event relative to the watched root. `None` for paths
/// outside the root.
pub fn relative_to<'a>(root: &Path, path: &'a Path) -> Option<&'a Path> {
    path.strip_prefix(root).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_tilde_replaces_home() {
        let home = std::env::var("HOME").unwrap();
        let result = expand_tilde("~/src/foo");
        assert_eq!(result, PathBuf::from(&home).join("src/foo"));
    }

    #[test]
    fn expand_tilde_bare_tilde() {
        let home = std::env::var("HOME").unwrap();
        assert_eq!(expand_tilde("~"), PathBuf::from(&home));
    }

    #[test]
    fn expand_tilde_leaves_absolute_unchanged() {
        let result = expand_tilde("/usr/local/bin");
        assert_eq!(result, PathBuf::from("/usr/local/bin"));
    }

    #[test]
    fn resolve_dir_joins_relative_onto_base() {
        let base = PathBuf::from("/tmp/project");
        assert_eq!(
            resolve_dir("pkg/api", &base),
            PathBuf::from("/tmp/project/pkg/api")
        );
    }

    #[test]
    fn resolve_dir_keeps_absolute() {
        let base = PathBuf::from("/tmp/project");
        assert_eq!(resolve_dir("/srv/code", &base), PathBuf::from("/srv/code"));
    }

    #[test]
    fn resolve_dir_dot_is_base() {
        let base = PathBuf::from("/tmp/project");
        assert_eq!(resolve_dir(".", &base).to_str(), Some("/tmp/project"));
        assert_eq!(resolve_dir("./svc", &base).to_str(), Some("/tmp/project/svc"));
    }

    #[test]
    fn resolve_dir_dot_on_dot_stays_dot() {
        assert_eq!(resolve_dir(".", Path::new(".")).to_str(), Some("."));
    }

    #[test]
    fn relative_to_strips_root() {
        let root = PathBuf::from("/tmp/project");
        let path = PathBuf::from("/tmp/project/pkg/main.go");
        assert_eq!(relative_to(&root, &path), Some(Path::new("pkg/main.go")));
    }

    #[test]
    fn relative_to_outside_root_is_none() {
        let root = PathBuf::from("/tmp/project");
        let path = PathBuf::from("/var/log/syslog");
        assert_eq!(relative_to(&root, &path), None);
    }
}
