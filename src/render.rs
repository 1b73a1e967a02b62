//! Frame rendering
//!
//! Writes a snapshot as a banner, then per frame a header line and one
//! right-aligned `key = value` line per included local, then the exception
//! summary. Value text comes from [`summarize`] followed by `repr`; a value
//! whose repr fails gets an inline error line instead of aborting the dump.

use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ffi::OsString;
use std::io::{self, IsTerminal, Write};

use crate::frame::{Frame, Locals, Snapshot};
use crate::source::{relative_path, SourceCache};
use crate::summarize::{summarize, DEFAULT_THRESHOLD};
use crate::value::Value;

pub const BANNER: &str = "Fancy Traceback (most recent call last):";

/// Types never dumped as values, whatever the caller passes.
pub const IMPLICIT_IGNORED_TYPES: [&str; 3] = ["function", "module", "type"];

/// Name of the receiver variable whose attributes are expanded inline.
pub const RECEIVER: &str = "self";

const RECEIVER_PREFIX: &str = "self.";
const PRIVATE_PREFIX: &str = "__";
const MIN_KEY_WIDTH: usize = 20;
const KEY_PADDING: usize = 10;
const MAX_LINE_LEN: usize = 1000;
const SEPARATOR: &str = " = ";

/// When to emit ANSI colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    /// Color when stderr is a terminal, honoring `NO_COLOR` and `CLICOLOR_FORCE`
    #[default]
    Auto,
    Always,
    Never,
}

/// Rendering options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Exit the process with status 1 after [`format`] finishes
    pub exit: bool,
    /// Sequence elements shown before truncation
    pub threshold: usize,
    /// Expand the attributes of a `self` local inline
    pub include_self: bool,
    /// Variable names to skip
    pub ignore: HashSet<String>,
    /// Type names to skip, in addition to [`IMPLICIT_IGNORED_TYPES`]
    pub ignore_type: HashSet<String>,
    /// Show names starting with `__`
    pub include_private: bool,
    pub color: ColorChoice,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            exit: true,
            threshold: DEFAULT_THRESHOLD,
            include_self: true,
            ignore: HashSet::new(),
            ignore_type: HashSet::new(),
            include_private: false,
            color: ColorChoice::Auto,
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exit(mut self, exit: bool) -> Self {
        self.exit = exit;
        self
    }

    pub fn threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn include_self(mut self, include_self: bool) -> Self {
        self.include_self = include_self;
        self
    }

    pub fn ignore<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn ignore_type<I, S>(mut self, type_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_type.extend(type_names.into_iter().map(Into::into));
        self
    }

    pub fn include_private(mut self, include_private: bool) -> Self {
        self.include_private = include_private;
        self
    }

    pub fn color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }
}

/// Render `snapshot` to stderr.
///
/// Never panics and never returns an error: write failures are logged. When
/// `options.exit` is set the process exits with status 1 afterwards.
pub fn format(snapshot: &Snapshot, options: &RenderOptions) {
    {
        let stderr = io::stderr();
        let mut out = stderr.lock();
        if let Err(e) = render(snapshot, options, &mut out) {
            log::error!("failed to write traceback: {}", e);
        }
    }

    if options.exit {
        std::process::exit(1);
    }
}

/// Render `snapshot` to `out`. Only write errors are returned.
pub fn render<W: Write>(snapshot: &Snapshot, options: &RenderOptions, out: &mut W) -> io::Result<()> {
    FrameRenderer::new(options, out).render(snapshot)
}

/// Decides which locals are shown
struct Filter<'a> {
    include_private: bool,
    ignore: &'a HashSet<String>,
    ignore_type: HashSet<&'a str>,
}

impl<'a> Filter<'a> {
    fn new(options: &'a RenderOptions) -> Self {
        let mut ignore_type: HashSet<&str> = options.ignore_type.iter().map(String::as_str).collect();
        ignore_type.extend(IMPLICIT_IGNORED_TYPES);
        Self {
            include_private: options.include_private,
            ignore: &options.ignore,
            ignore_type,
        }
    }

    fn includes(&self, name: &str, value: &Value) -> bool {
        (self.include_private || !name.starts_with(PRIVATE_PREFIX))
            && !self.ignore.contains(name)
            && !self.ignore_type.contains(value.type_name())
    }
}

/// Color helpers; plain text when disabled.
///
/// While an enabled palette is alive, `colored`'s global override is forced
/// on so output to non-stdout writers is colored too. Dropping the palette
/// clears the override again, including on early error returns.
struct Palette {
    enabled: bool,
}

impl Palette {
    fn new(choice: ColorChoice) -> Self {
        let enabled = match choice {
            ColorChoice::Auto => auto_color_enabled(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        };
        if enabled {
            colored::control::set_override(true);
        }
        Self { enabled }
    }

    fn green(&self, text: &str) -> String {
        if self.enabled {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }

    fn yellow(&self, text: &str) -> String {
        if self.enabled {
            text.yellow().to_string()
        } else {
            text.to_string()
        }
    }

    fn red(&self, text: &str) -> String {
        if self.enabled {
            text.red().to_string()
        } else {
            text.to_string()
        }
    }
}

impl Drop for Palette {
    fn drop(&mut self) {
        if self.enabled {
            colored::control::unset_override();
        }
    }
}

/// `ColorChoice::Auto` for output on stderr
fn auto_color_enabled() -> bool {
    color_from_env(
        std::env::var_os("NO_COLOR"),
        std::env::var_os("CLICOLOR_FORCE"),
        io::stderr().is_terminal(),
    )
}

/// `NO_COLOR` wins, then a non-zero `CLICOLOR_FORCE`, then terminal detection.
fn color_from_env(no_color: Option<OsString>, force: Option<OsString>, is_terminal: bool) -> bool {
    if no_color.is_some_and(|v| !v.is_empty()) {
        return false;
    }
    if force.is_some_and(|v| !v.is_empty() && v != "0") {
        return true;
    }
    is_terminal
}

/// The name shown left of ` = `
#[derive(Clone, Copy)]
enum Label<'a> {
    Local(&'a str),
    Receiver(&'a str),
}

impl Label<'_> {
    fn plain(&self) -> String {
        match self {
            Label::Local(name) => name.to_string(),
            Label::Receiver(attr) => format!("{RECEIVER_PREFIX}{attr}"),
        }
    }
}

struct FrameRenderer<'a, W: Write> {
    options: &'a RenderOptions,
    filter: Filter<'a>,
    palette: Palette,
    sources: SourceCache,
    out: &'a mut W,
}

impl<'a, W: Write> FrameRenderer<'a, W> {
    fn new(options: &'a RenderOptions, out: &'a mut W) -> Self {
        Self {
            options,
            filter: Filter::new(options),
            palette: Palette::new(options.color),
            sources: SourceCache::new(),
            out,
        }
    }

    fn render(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        writeln!(self.out, "{BANNER}")?;

        for frame in &snapshot.frames {
            self.write_header(frame)?;
            self.write_locals(&frame.locals)?;
            writeln!(self.out)?;
        }

        writeln!(self.out)?;
        writeln!(self.out, "{}", snapshot.exception)?;
        self.out.flush()
    }

    fn write_header(&mut self, frame: &Frame) -> io::Result<()> {
        let source_line = match &frame.source_line {
            Some(text) => text.trim().to_string(),
            None => self.sources.line(&frame.file, frame.line),
        };

        writeln!(
            self.out,
            "  {} {} {} {} {} {} : {}",
            self.palette.green("File"),
            relative_path(&frame.file),
            self.palette.green("line"),
            frame.line,
            self.palette.green("function"),
            frame.function,
            source_line
        )
    }

    fn expands_receiver(&self, name: &str) -> bool {
        self.options.include_self && name == RECEIVER
    }

    /// Key column width for one frame's locals
    fn key_width(&self, locals: &Locals) -> usize {
        let mut width = MIN_KEY_WIDTH;

        for (name, value) in locals {
            if !self.filter.includes(name, value) {
                continue;
            }
            width = width.max(name.chars().count());

            if !self.expands_receiver(name) {
                continue;
            }
            match value.attributes() {
                Some(attributes) => {
                    for (attr, attr_value) in attributes {
                        if self.filter.includes(attr, attr_value) {
                            width = width.max(attr.chars().count() + RECEIVER_PREFIX.len());
                        }
                    }
                }
                None => log::warn!(
                    "cannot expand `{}`: a {} has no attributes",
                    name,
                    value.type_name()
                ),
            }
        }

        width + KEY_PADDING
    }

    fn write_locals(&mut self, locals: &Locals) -> io::Result<()> {
        let width = self.key_width(locals);

        for (name, value) in locals {
            if !self.filter.includes(name, value) {
                continue;
            }
            self.write_entry(Label::Local(name), value, width)?;

            if !self.expands_receiver(name) {
                continue;
            }
            if let Some(attributes) = value.attributes() {
                for (attr, attr_value) in attributes {
                    if self.filter.includes(attr, attr_value) {
                        self.write_entry(Label::Receiver(attr), attr_value, width)?;
                    }
                }
            }
        }

        Ok(())
    }

    fn write_entry(&mut self, label: Label<'_>, value: &Value, width: usize) -> io::Result<()> {
        let plain = label.plain();
        let padding = " ".repeat(width.saturating_sub(plain.chars().count()));

        match summarize(value, self.options.threshold).repr() {
            Ok(text) => {
                let key = match label {
                    Label::Local(name) => self.palette.yellow(name),
                    Label::Receiver(attr) => format!(
                        "{}.{}",
                        self.palette.green(RECEIVER),
                        self.palette.yellow(attr)
                    ),
                };
                writeln!(
                    self.out,
                    "{padding}{key}{SEPARATOR}{}",
                    reflow(width + SEPARATOR.len(), &text)
                )
            }
            Err(e) => {
                log::debug!("repr of `{}` failed: {}", plain, e);
                writeln!(
                    self.out,
                    "{padding}{}{SEPARATOR}Error printing <class '{}'> : {}",
                    self.palette.red(&plain),
                    value.type_name(),
                    e
                )
            }
        }
    }
}

/// Cap each line of `text` and indent continuation lines by `indent`.
fn reflow(indent: usize, text: &str) -> String {
    let separator = format!("\n{}", " ".repeat(indent));
    split_lines(text)
        .into_iter()
        .map(|line| match line.char_indices().nth(MAX_LINE_LEN) {
            Some((end, _)) => &line[..end],
            None => line,
        })
        .collect::<Vec<_>>()
        .join(&separator)
}

/// Split on every line boundary Python's `str.splitlines` recognizes,
/// including a lone `\r`; a trailing boundary adds no empty line.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let is_break = matches!(
            c,
            '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
        );
        if !is_break {
            continue;
        }
        lines.push(&text[start..i]);
        start = i + c.len_utf8();
        if c == '\r' {
            if let Some(&(j, '\n')) = chars.peek() {
                chars.next();
                start = j + 1;
            }
        }
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}
