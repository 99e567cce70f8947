//! Error types for hot importing.

use std::path::PathBuf;
use thiserror::Error;

use crate::module::ExportKind;

pub type Result<T, E = HotError> = std::result::Result<T, E>;

/// Errors surfaced by the hot import context and its handles.
#[derive(Debug, Error)]
pub enum HotError {
    /// A relative path was given but no caller file was left to resolve against.
    #[error("cannot resolve `{}`: no caller file found", .path.display())]
    Resolution { path: PathBuf },

    #[error("module `{}` has not been loaded", .0.display())]
    NotLoaded(PathBuf),

    #[error("module `{}` is a {kind}, not a {expected}", .path.display())]
    NotCallable {
        path: PathBuf,
        kind: ExportKind,
        expected: &'static str,
    },

    #[error("module `{}` has no export named `{name}`", .path.display())]
    MissingExport { path: PathBuf, name: String },

    /// The first load of a module failed; there is no previous version to serve.
    #[error("failed to load `{}`", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// A reload failed and was rolled back. Never returned from a handle.
    #[error("failed to reload `{}`", .path.display())]
    Reload {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to watch `{}`", .path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// The export ran and returned an error of its own.
    #[error("call into `{}` failed", .path.display())]
    Call {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

impl HotError {
    /// Full error chain on one line, e.g. for status output.
    pub fn chain(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            message.push_str(": ");
            message.push_str(&err.to_string());
            source = err.source();
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_callable_display() {
        let err = HotError::NotCallable {
            path: PathBuf::from("/srv/answer.json"),
            kind: ExportKind::Value,
            expected: "function",
        };
        let display = err.to_string();
        assert!(display.contains("/srv/answer.json"));
        assert!(display.contains("value"));
        assert!(display.contains("function"));
    }

    #[test]
    fn test_chain_includes_source() {
        let err = HotError::Load {
            path: PathBuf::from("broken.json"),
            source: anyhow::anyhow!("expected value at line 1 column 1"),
        };
        let chain = err.chain();
        assert!(chain.starts_with("failed to load `broken.json`"));
        assert!(chain.ends_with("expected value at line 1 column 1"));
    }
}
