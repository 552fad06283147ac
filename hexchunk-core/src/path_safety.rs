use crate::error::{ChunkError, Result};
use std::path::{Component, Path, PathBuf};

#[derive(Clone, Copy, Debug, Default)]
pub struct PathPolicy {
    pub follow_symlinks: bool,
}

/// A record's `file_name` must be a bare base name: one normal component.
pub fn validate_file_name(name: &str) -> Result<()> {
    let p = Path::new(name);
    let mut comps = p.components();
    match (comps.next(), comps.next()) {
        (Some(Component::Normal(c)), None) if c == p.as_os_str() => Ok(()),
        _ => Err(ChunkError::unsafe_path(p, "not a bare file name")),
    }
}

/// Resolve a chunk locator against the manifest directory `base`: no
/// absolute paths, no `..`, and if `follow_symlinks` the canonicalized path
/// must stay under `base`; otherwise any symlink on the way is rejected.
pub fn validate_locator(base: &Path, rel: &str, policy: PathPolicy) -> Result<PathBuf> {
    let rel_path = Path::new(rel);
    if rel_path.is_absolute() || rel_path.has_root() {
        return Err(ChunkError::unsafe_path(rel_path, "absolute locators are not allowed"));
    }
    for comp in rel_path.components() {
        match comp {
            Component::ParentDir => {
                return Err(ChunkError::unsafe_path(rel_path, "parent traversal not allowed"))
            }
            Component::Prefix(_) | Component::RootDir => {
                return Err(ChunkError::unsafe_path(rel_path, "absolute locators are not allowed"))
            }
            _ => {}
        }
    }
    let candidate = base.join(rel_path);
    if !policy.follow_symlinks {
        let mut cur = base.to_path_buf();
        for comp in rel_path.components() {
            cur = cur.join(comp);
            if let Ok(m) = std::fs::symlink_metadata(&cur) {
                if m.file_type().is_symlink() {
                    return Err(ChunkError::unsafe_path(&cur, "symlink encountered (not following)"));
                }
            }
        }
        Ok(candidate)
    } else {
        let base_can = std::fs::canonicalize(base).map_err(|e| ChunkError::io(base, e))?;
        let cand_can = std::fs::canonicalize(&candidate).map_err(|e| ChunkError::io(&candidate, e))?;
        if !cand_can.starts_with(&base_can) {
            return Err(ChunkError::unsafe_path(rel_path, "path escapes manifest directory"));
        }
        Ok(cand_can)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_names_accepted() {
        validate_file_name("report.pdf").unwrap();
        validate_file_name("no_extension").unwrap();
    }

    #[test]
    fn paths_rejected_as_file_names() {
        for bad in ["", ".", "..", "a/b", "/abs", "./x"] {
            assert!(validate_file_name(bad).is_err(), "{bad:?} accepted");
        }
    }

    #[test]
    fn traversal_and_absolute_locators_rejected() {
        let td = tempfile::tempdir().unwrap();
        for bad in ["../x.json", "a/../../x.json", "/etc/passwd"] {
            let err = validate_locator(td.path(), bad, PathPolicy::default()).unwrap_err();
            assert!(matches!(err, ChunkError::UnsafePath { .. }), "{bad}: {err}");
        }
    }

    #[test]
    fn plain_locator_resolves_under_base() {
        let td = tempfile::tempdir().unwrap();
        let p = validate_locator(td.path(), "f_01_01.json", PathPolicy::default()).unwrap();
        assert_eq!(p, td.path().join("f_01_01.json"));
    }
}
