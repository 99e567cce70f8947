//! Hot module reloading.
//!
//! Import a file-backed module once and keep the [`Handle`]: every call goes
//! to the newest successfully loaded version, and edits on disk are picked up
//! without re-importing. A broken edit is rolled back and the last good
//! version keeps serving.
//!
//! ```ignore
//! use hot_import::{DataLoader, HotImport};
//!
//! let hot = HotImport::new(DataLoader);
//! let settings = hot.import_from(file!(), "./settings.toml")?;
//! let port = settings.value("port");
//! ```
//!
//! Custom module formats plug in through [`Loader`]; any
//! `Fn(&Path) -> anyhow::Result<Export>` qualifies.

pub mod config;
pub mod error;
pub mod hot;
pub mod loader;
pub mod logger;
pub mod module;
pub mod resolve;

mod utils;

pub use config::{ConfigError, HotConfig};
pub use error::{HotError, Result};
pub use hot::{Handle, HotImport, ReloadEvent, ReloadOutcome, Watch};
pub use loader::{DataLoader, Loader, ModuleCache};
pub use module::{Class, DEFAULT_EXPORT, Export, ExportKind, Function, Namespace, Value};
pub use resolve::{normalize_path, resolve_caller_path};
