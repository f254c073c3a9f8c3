//! Path validation
//!
//! Resolves client-supplied paths against the session's virtual working
//! directory. Virtual paths are absolute (`/`-rooted) and never climb above
//! the server root.

use std::path::{Path, PathBuf};

/// Resolves `target` relative to `current`, normalizing `.` and `..`.
///
/// An empty target resolves to `current`; a leading `/` starts from the root.
pub fn resolve_virtual_path(current: &str, target: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if !target.starts_with('/') {
        parts.extend(current.split('/').filter(|p| !p.is_empty() && *p != "."));
    }

    for part in target.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            name => parts.push(name),
        }
    }

    format!("/{}", parts.join("/"))
}

/// Maps a virtual path onto the real filesystem below `server_root`.
pub fn virtual_to_real_path(server_root: &Path, virtual_path: &str) -> PathBuf {
    server_root.join(virtual_path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_and_absolute_targets() {
        assert_eq!(resolve_virtual_path("/", "docs"), "/docs");
        assert_eq!(resolve_virtual_path("/docs", "a/b.txt"), "/docs/a/b.txt");
        assert_eq!(resolve_virtual_path("/docs", "/etc"), "/etc");
        assert_eq!(resolve_virtual_path("/docs", ""), "/docs");
        assert_eq!(resolve_virtual_path("/docs", "./x"), "/docs/x");
    }

    #[test]
    fn parent_never_escapes_root() {
        assert_eq!(resolve_virtual_path("/docs", ".."), "/");
        assert_eq!(resolve_virtual_path("/", "../../etc/passwd"), "/etc/passwd");
        assert_eq!(resolve_virtual_path("/a/b", "../../.."), "/");
    }

    #[test]
    fn maps_virtual_onto_root() {
        let root = Path::new("/srv/ftp");
        assert_eq!(virtual_to_real_path(root, "/"), PathBuf::from("/srv/ftp"));
        assert_eq!(
            virtual_to_real_path(root, "/docs/a.txt"),
            PathBuf::from("/srv/ftp/docs/a.txt")
        );
    }
}
