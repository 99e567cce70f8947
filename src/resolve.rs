//! Path resolution relative to the calling source file.
//!
//! Callers write module paths relative to their own source location, the way
//! `mod`/`include!` paths read. Rust has no reflective call stack, so callers
//! hand in their source files explicitly, nearest first (usually `file!()`).
//!
//! - [`resolve_caller_path`]: resolve against the nearest qualifying caller
//! - [`normalize_path`]: canonical store key for a module file

use std::path::{Component, Path, PathBuf};

use crate::error::{HotError, Result};

/// Source file of the resolver itself, always skipped as a caller.
const RESOLVER_FILE: &str = file!();

/// Resolve `path` relative to the directory of the nearest caller file.
///
/// Absolute paths are returned unchanged. Otherwise `callers` is walked nearest
/// first; the resolver's own file and `exclude` (so a wrapper can resolve
/// relative to *its* caller) are skipped. Relative caller files, as produced by
/// `file!()`, are taken relative to the working directory.
///
/// # Errors
///
/// [`HotError::Resolution`] when no qualifying caller is left.
pub fn resolve_caller_path<'a, I>(
    path: impl AsRef<Path>,
    callers: I,
    exclude: Option<&Path>,
) -> Result<PathBuf>
where
    I: IntoIterator<Item = &'a Path>,
{
    let path = path.as_ref();
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    let own = absolute(Path::new(RESOLVER_FILE));
    let exclude = exclude.map(absolute);

    let caller = callers
        .into_iter()
        .map(absolute)
        .inspect(|file| crate::debug!("hot"; "caller candidate: {}", file.display()))
        .find(|file| *file != own && exclude.as_ref() != Some(file));

    let Some(caller) = caller else {
        return Err(HotError::Resolution {
            path: path.to_path_buf(),
        });
    };

    let dir = caller.parent().unwrap_or(Path::new("/"));
    Ok(clean(&dir.join(path)))
}

/// Normalize a module path to the absolute key used by every store.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`), falling back
/// to a lexical absolute path when the file does not exist (yet).
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| clean(&absolute(path)))
}

/// Make `path` absolute against the working directory without touching it.
fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Lexically remove `.` and `..` components.
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `..` at the root stays at the root
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_path_unchanged() {
        let abs = std::env::temp_dir().join("module.json");
        let resolved = resolve_caller_path(&abs, std::iter::empty::<&Path>(), None).unwrap();
        assert_eq!(resolved, abs);
    }

    #[test]
    fn test_relative_to_caller_dir() {
        let caller = std::env::temp_dir().join("app").join("main.rs");
        let resolved = resolve_caller_path("./test", [caller.as_path()], None).unwrap();
        assert_eq!(resolved, std::env::temp_dir().join("app").join("test"));
    }

    #[test]
    fn test_parent_components_cleaned() {
        let caller = std::env::temp_dir().join("app").join("src").join("main.rs");
        let resolved =
            resolve_caller_path("../fixtures/answer.json", [caller.as_path()], None).unwrap();
        assert_eq!(
            resolved,
            std::env::temp_dir()
                .join("app")
                .join("fixtures")
                .join("answer.json")
        );
    }

    #[test]
    fn test_skips_resolver_and_excluded_file() {
        let wrapper = std::env::temp_dir().join("wrapper").join("lib.rs");
        let app = std::env::temp_dir().join("app").join("main.rs");
        let callers = [Path::new(RESOLVER_FILE), wrapper.as_path(), app.as_path()];

        let resolved = resolve_caller_path("./test", callers, Some(wrapper.as_path())).unwrap();
        assert_eq!(resolved, std::env::temp_dir().join("app").join("test"));
    }

    #[test]
    fn test_relative_caller_file_uses_working_dir() {
        let resolved = resolve_caller_path("./test", [Path::new(file!())], Some(Path::new("none")));
        // file!() is this resolver, so it is skipped and nothing is left
        assert!(matches!(resolved, Err(HotError::Resolution { .. })));

        let caller = Path::new("tests").join("consumer.rs");
        let resolved = resolve_caller_path("./test", [caller.as_path()], None).unwrap();
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(resolved, cwd.join("tests").join("test"));
    }

    #[test]
    fn test_no_caller_is_resolution_error() {
        let err = resolve_caller_path("./test", std::iter::empty::<&Path>(), None).unwrap_err();
        assert!(matches!(err, HotError::Resolution { ref path } if path == Path::new("./test")));
    }

    #[test]
    fn test_normalize_missing_file_is_absolute() {
        let normalized = normalize_path(Path::new("missing/../module.json"));
        assert!(normalized.is_absolute());
        assert!(normalized.ends_with("module.json"));
        assert!(!normalized.to_string_lossy().contains(".."));
    }

    #[test]
    fn test_clean_keeps_root() {
        assert_eq!(clean(Path::new("/../a/./b")), PathBuf::from("/a/b"));
    }
}
