//! Diagnostic snapshot types
//!
//! A [`Snapshot`] is an explicit record of a failure: the frames of the call
//! chain, root first, each with its locals, plus the exception that ended it.
//! It is built by the caller (or loaded from JSON) and only read afterwards.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::SnapshotError;
use crate::value::Value;

/// Local variables in capture order
pub type Locals = IndexMap<String, Value>;

/// One level of the call chain at failure time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub file: PathBuf,
    pub line: u32,
    pub function: String,
    /// Source text of `line`; read from `file` when absent
    #[serde(default)]
    pub source_line: Option<String>,
    #[serde(default)]
    pub locals: Locals,
}

impl Frame {
    pub fn new(file: impl Into<PathBuf>, line: u32, function: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            function: function.into(),
            source_line: None,
            locals: Locals::new(),
        }
    }

    pub fn with_source_line(mut self, text: impl Into<String>) -> Self {
        self.source_line = Some(text.into());
        self
    }

    /// Add a local; a repeated name replaces the earlier value in place
    pub fn with_local(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.locals.insert(name.into(), value.into());
        self
    }
}

/// The exception that terminated the call chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionInfo {
    pub type_name: String,
    #[serde(default)]
    pub message: String,
}

impl ExceptionInfo {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Describe a Rust error, using its type's short name
    pub fn from_error<E: std::error::Error>(error: &E) -> Self {
        Self::new(short_type_name::<E>(), error.to_string())
    }
}

impl fmt::Display for ExceptionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.type_name)
        } else {
            write!(f, "{}: {}", self.type_name, self.message)
        }
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Frames in root-to-failure order plus the terminating exception
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub frames: Vec<Frame>,
    pub exception: ExceptionInfo,
}

impl Snapshot {
    pub fn new(exception: ExceptionInfo) -> Self {
        Self {
            frames: Vec::new(),
            exception,
        }
    }

    /// Append the next-inner frame
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frames.push(frame);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn to_json_string(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Object;

    #[derive(Debug)]
    struct DivisionByZero;

    impl fmt::Display for DivisionByZero {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "division by zero")
        }
    }

    impl std::error::Error for DivisionByZero {}

    #[test]
    fn test_locals_keep_capture_order() {
        let frame = Frame::new("app.py", 3, "fn1")
            .with_local("b", 0)
            .with_local("a", 1)
            .with_local("c", 2);
        let names: Vec<_> = frame.locals.keys().cloned().collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_exception_display() {
        assert_eq!(
            ExceptionInfo::new("ZeroDivisionError", "division by zero").to_string(),
            "ZeroDivisionError: division by zero"
        );
        assert_eq!(ExceptionInfo::new("StopIteration", "").to_string(), "StopIteration");
    }

    #[test]
    fn test_exception_from_rust_error() {
        let info = ExceptionInfo::from_error(&DivisionByZero);
        assert_eq!(info.type_name, "DivisionByZero");
        assert_eq!(info.message, "division by zero");
    }

    #[test]
    fn test_snapshot_json_roundtrip_preserves_order() {
        let snapshot = Snapshot::new(ExceptionInfo::new("ValueError", "bad"))
            .with_frame(
                Frame::new("/src/app.py", 10, "main")
                    .with_local("z", Value::None)
                    .with_local("a", Object::new("A").with_attribute("x", 10)),
            );

        let json = snapshot.to_json_string().unwrap();
        let parsed = Snapshot::from_json_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn test_snapshot_parses_minimal_frame() {
        let json = r#"{
            "frames": [{"file": "a.py", "line": 1, "function": "<module>"}],
            "exception": {"type_name": "KeyError"}
        }"#;
        let snapshot = Snapshot::from_json_str(json).unwrap();
        assert!(snapshot.frames[0].locals.is_empty());
        assert_eq!(snapshot.frames[0].source_line, None);
        assert_eq!(snapshot.exception.message, "");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Snapshot::load(Path::new("/nonexistent/snapshot.json")).unwrap_err();
        assert!(matches!(err, SnapshotError::Io { .. }));
    }
}
