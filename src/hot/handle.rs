//! Stable handles to hot modules.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use super::store::ModuleCell;
use crate::error::{HotError, Result};
use crate::module::{Export, ExportKind, Value};

/// Long-lived handle to a hot module.
///
/// Every operation dereferences the module's current export at call time, so
/// a handle obtained once keeps serving the newest successfully loaded
/// version across any number of reloads. Cloning is cheap and clones compare
/// equal under [`Handle::ptr_eq`].
#[derive(Clone)]
pub struct Handle {
    cell: Arc<ModuleCell>,
}

impl Handle {
    pub(crate) fn new(cell: Arc<ModuleCell>) -> Self {
        Self { cell }
    }

    /// Absolute path of the module file.
    pub fn path(&self) -> &Path {
        self.cell.path()
    }

    /// Number of successful loads so far (1 after the first import).
    pub fn version(&self) -> u64 {
        self.cell.version()
    }

    /// Snapshot of the current export.
    ///
    /// The snapshot does not follow later reloads; keep the handle, not the
    /// snapshot.
    pub fn current(&self) -> Arc<Export> {
        self.cell.load()
    }

    pub fn kind(&self) -> ExportKind {
        self.current().kind()
    }

    /// Call the module as a function.
    ///
    /// A namespace with a callable `default` export calls that default.
    pub fn invoke(&self, args: &[Value]) -> Result<Value> {
        invoke_export(self.path(), &self.current().primary(), args)
    }

    /// Construct a new instance of the module's current class.
    ///
    /// A namespace whose `default` export is a class constructs that class.
    pub fn construct(&self, args: &[Value]) -> Result<Value> {
        construct_export(self.path(), &self.current().primary(), args)
    }

    /// Named member of the current export.
    pub fn get(&self, name: &str) -> Option<Export> {
        self.current().get(name)
    }

    /// Named member as plain data.
    pub fn value(&self, name: &str) -> Option<Value> {
        self.get(name).and_then(|export| export.as_value().cloned())
    }

    /// Member names of the current export.
    pub fn keys(&self) -> Vec<String> {
        self.current().keys()
    }

    /// Call a named function export, e.g. `answer()`.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        invoke_export(self.path(), &self.member(name)?, args)
    }

    /// Construct a named class export, e.g. `new MeaningOfLife()`.
    pub fn new_instance(&self, name: &str, args: &[Value]) -> Result<Value> {
        construct_export(self.path(), &self.member(name)?, args)
    }

    /// Whether both handles are the same handle.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    fn member(&self, name: &str) -> Result<Export> {
        self.get(name).ok_or_else(|| HotError::MissingExport {
            path: self.path().to_path_buf(),
            name: name.to_string(),
        })
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("path", &self.path())
            .field("version", &self.version())
            .field("kind", &self.kind())
            .finish()
    }
}

fn invoke_export(path: &Path, export: &Export, args: &[Value]) -> Result<Value> {
    match export {
        Export::Function(function) => function.call(args).map_err(|source| HotError::Call {
            path: path.to_path_buf(),
            source,
        }),
        other => Err(HotError::NotCallable {
            path: path.to_path_buf(),
            kind: other.kind(),
            expected: "function",
        }),
    }
}

fn construct_export(path: &Path, export: &Export, args: &[Value]) -> Result<Value> {
    match export {
        Export::Class(class) => class.construct(args).map_err(|source| HotError::Call {
            path: path.to_path_buf(),
            source,
        }),
        other => Err(HotError::NotCallable {
            path: path.to_path_buf(),
            kind: other.kind(),
            expected: "class",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hot::store::ModuleStore;
    use crate::module::{DEFAULT_EXPORT, Namespace};
    use serde_json::json;

    const EXPECTED_TEXT: &str = "testing123";

    fn handle_for(export: Export) -> (Arc<ModuleCell>, Handle) {
        let store = ModuleStore::default();
        let cell = store.insert_new(Path::new("/srv/module"), export, None);
        (Arc::clone(&cell), Handle::new(cell))
    }

    fn text_class(id: i64) -> Export {
        Export::class(format!("Test{id}"), move |args| {
            Ok(json!({ "id": id, "text": args.first().cloned().unwrap_or(Value::Null) }))
        })
    }

    #[test]
    fn test_invoke_follows_replacement() {
        let (cell, handle) = handle_for(Export::function("answer", |_| Ok(json!(42))));
        assert_eq!(handle.invoke(&[]).unwrap(), json!(42));

        cell.replace(Export::function("answer", |_| Ok(json!(17))));
        assert_eq!(handle.invoke(&[]).unwrap(), json!(17));
        assert_eq!(handle.version(), 2);
    }

    #[test]
    fn test_construct_uses_current_class() {
        let (cell, handle) = handle_for(text_class(1));
        let instance = handle.construct(&[json!(EXPECTED_TEXT)]).unwrap();
        assert_eq!(instance["id"], json!(1));
        assert_eq!(instance["text"], json!(EXPECTED_TEXT));

        cell.replace(text_class(2));
        let instance = handle.construct(&[json!(EXPECTED_TEXT)]).unwrap();
        assert_eq!(instance["id"], json!(2));
    }

    #[test]
    fn test_default_export_unwrapped() {
        let ns = Namespace::new().with(DEFAULT_EXPORT, Export::function("main", |_| Ok(json!(42))));
        let (_, handle) = handle_for(Export::Namespace(ns));
        assert_eq!(handle.invoke(&[]).unwrap(), json!(42));
    }

    #[test]
    fn test_arguments_forwarded() {
        let sum = Export::function("sum", |args| {
            Ok(json!(args.iter().filter_map(Value::as_i64).sum::<i64>()))
        });
        let (_, handle) = handle_for(sum);
        assert_eq!(handle.invoke(&[json!(40), json!(2)]).unwrap(), json!(42));
    }

    #[test]
    fn test_value_not_callable() {
        let (_, handle) = handle_for(Export::Value(json!({ "answer": 42 })));
        let err = handle.invoke(&[]).unwrap_err();
        assert!(matches!(
            err,
            HotError::NotCallable { kind: ExportKind::Value, expected: "function", .. }
        ));
        assert!(matches!(handle.construct(&[]), Err(HotError::NotCallable { .. })));
    }

    #[test]
    fn test_function_not_constructible() {
        let (_, handle) = handle_for(Export::function("answer", |_| Ok(json!(42))));
        let err = handle.construct(&[]).unwrap_err();
        assert!(matches!(
            err,
            HotError::NotCallable { kind: ExportKind::Function, expected: "class", .. }
        ));
    }

    #[test]
    fn test_named_members() {
        let ns = Namespace::new()
            .with("answer", Export::function("answer", |_| Ok(json!(42))))
            .with("MeaningOfLife", text_class(42))
            .with("name", json!("deep thought"));
        let (_, handle) = handle_for(Export::Namespace(ns));

        assert_eq!(handle.call("answer", &[]).unwrap(), json!(42));
        assert_eq!(handle.new_instance("MeaningOfLife", &[]).unwrap()["id"], json!(42));
        assert_eq!(handle.value("name"), Some(json!("deep thought")));
        assert_eq!(handle.keys(), vec!["MeaningOfLife", "answer", "name"]);
        assert!(matches!(
            handle.call("missing", &[]),
            Err(HotError::MissingExport { ref name, .. }) if name == "missing"
        ));
    }

    #[test]
    fn test_call_error_wrapped() {
        let failing = Export::function("fail", |_| anyhow::bail!("boom"));
        let (_, handle) = handle_for(failing);
        let err = handle.invoke(&[]).unwrap_err();
        assert!(matches!(err, HotError::Call { .. }));
        assert!(err.chain().ends_with("boom"));
    }

    #[test]
    fn test_snapshot_does_not_follow_reload() {
        let (cell, handle) = handle_for(Export::Value(json!(1)));
        let snapshot = handle.current();
        cell.replace(Export::Value(json!(2)));

        assert_eq!(snapshot.as_value(), Some(&json!(1)));
        assert_eq!(handle.current().as_value(), Some(&json!(2)));
    }
}
