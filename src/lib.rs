//! fattrace: readable dumps of call-frame locals for failure reports
//!
//! Given a [`Snapshot`] of a failed call chain, this crate prints each frame's
//! location followed by its local variables, one aligned `key = value` line
//! each. Values are summarized first:
//! - long lists and tuples are truncated with a `...<N more>` marker
//! - text is capped
//! - array-like objects collapse to a short `<Type dtype shape ...>` tag
//!
//! ```no_run
//! use fattrace::{format, ExceptionInfo, Frame, RenderOptions, Snapshot};
//!
//! let snapshot = Snapshot::new(ExceptionInfo::new("ZeroDivisionError", "division by zero"))
//!     .with_frame(Frame::new("app.py", 4, "fn1").with_local("a", 1).with_local("b", 0))
//!     .with_frame(Frame::new("app.py", 7, "fn2").with_source_line("return a/b"));
//!
//! format(&snapshot, &RenderOptions::new().exit(false));
//! ```

pub mod config;
pub mod error;
pub mod frame;
pub mod render;
pub mod source;
pub mod summarize;
pub mod value;

pub use error::{ConfigError, ReprError, SnapshotError};
pub use frame::{ExceptionInfo, Frame, Locals, Snapshot};
pub use render::{format, render, ColorChoice, RenderOptions};
pub use summarize::summarize;
pub use value::{Object, Repr, Value};
