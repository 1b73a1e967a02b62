//! Displayable value model for captured locals
//!
//! A [`Value`] is a snapshot of one runtime value taken at failure time. It
//! knows its runtime type name and how to project itself into Python-style
//! `repr`/`str` text. Objects carry their own captured representation, which
//! may have failed at capture time.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ReprError;

/// Attributes whose presence marks an object as array-like, in tag order.
pub const ARRAY_ATTRIBUTES: [&str; 4] = ["dtype", "shape", "device", "layout"];

/// A captured value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Ordered key/value pairs; keys may be any value
    Dict(Vec<(Value, Value)>),
    Object(Object),
    Function(String),
    Module(String),
    Type(String),
}

/// An instance of a user-defined type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub type_name: String,
    #[serde(default)]
    pub attributes: IndexMap<String, Value>,
    #[serde(default)]
    pub repr: Repr,
}

/// How an object rendered itself when it was captured
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Repr {
    /// No custom representation; shown as `<TypeName object>`
    #[default]
    Default,
    Text(String),
    /// The representation raised; holds the error message
    Fails(String),
}

impl Object {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            attributes: IndexMap::new(),
            repr: Repr::Default,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_repr(mut self, text: impl Into<String>) -> Self {
        self.repr = Repr::Text(text.into());
        self
    }

    pub fn with_failing_repr(mut self, message: impl Into<String>) -> Self {
        self.repr = Repr::Fails(message.into());
        self
    }
}

/// The attributes an array-like object exposes, found by [`Value::array_signature`]
#[derive(Debug, Clone, PartialEq)]
pub struct ArraySignature<'a> {
    pub type_name: &'a str,
    pub attributes: Vec<(&'static str, &'a Value)>,
}

impl Value {
    /// Runtime type name, as used by type-based filtering
    pub fn type_name(&self) -> &str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Object(obj) => obj.type_name.as_str(),
            Value::Function(_) => "function",
            Value::Module(_) => "module",
            Value::Type(_) => "type",
        }
    }

    /// Attribute mapping, when the value has one
    pub fn attributes(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(obj) => Some(&obj.attributes),
            _ => None,
        }
    }

    /// Check for the array capability: any object exposing at least one of
    /// [`ARRAY_ATTRIBUTES`] is array-like.
    pub fn array_signature(&self) -> Option<ArraySignature<'_>> {
        let Value::Object(obj) = self else {
            return None;
        };

        let attributes: Vec<_> = ARRAY_ATTRIBUTES
            .iter()
            .filter_map(|name| obj.attributes.get(*name).map(|v| (*name, v)))
            .collect();

        if attributes.is_empty() {
            None
        } else {
            Some(ArraySignature {
                type_name: &obj.type_name,
                attributes,
            })
        }
    }

    /// Python-style `repr` text
    pub fn repr(&self) -> Result<String, ReprError> {
        let mut out = String::new();
        self.write_repr(&mut out)?;
        Ok(out)
    }

    /// Python-style `str` text: like `repr`, except strings are shown raw
    pub fn str(&self) -> Result<String, ReprError> {
        match self {
            Value::Str(s) => Ok(s.clone()),
            other => other.repr(),
        }
    }

    fn write_repr(&self, out: &mut String) -> Result<(), ReprError> {
        match self {
            Value::None => out.push_str("None"),
            Value::Bool(true) => out.push_str("True"),
            Value::Bool(false) => out.push_str("False"),
            Value::Int(i) => {
                out.push_str(&i.to_string());
            }
            Value::Float(f) => out.push_str(&float_repr(*f)),
            Value::Str(s) => out.push_str(&str_repr(s)),
            Value::Bytes(b) => out.push_str(&bytes_repr(b)),
            Value::List(items) => {
                out.push('[');
                write_items(out, items)?;
                out.push(']');
            }
            Value::Tuple(items) => {
                out.push('(');
                write_items(out, items)?;
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
            Value::Dict(entries) => {
                out.push('{');
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    key.write_repr(out)?;
                    out.push_str(": ");
                    value.write_repr(out)?;
                }
                out.push('}');
            }
            Value::Object(obj) => match &obj.repr {
                Repr::Default => {
                    out.push_str(&format!("<{} object>", obj.type_name));
                }
                Repr::Text(text) => out.push_str(text),
                Repr::Fails(message) => {
                    return Err(ReprError::new(&obj.type_name, message.clone()));
                }
            },
            Value::Function(name) => {
                out.push_str(&format!("<function {name}>"));
            }
            Value::Module(name) => {
                out.push_str(&format!("<module '{name}'>"));
            }
            Value::Type(name) => {
                out.push_str(&format!("<class '{name}'>"));
            }
        }
        Ok(())
    }
}

fn write_items(out: &mut String, items: &[Value]) -> Result<(), ReprError> {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        item.write_repr(out)?;
    }
    Ok(())
}

fn float_repr(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        let text = if f > 0.0 { "inf" } else { "-inf" };
        text.to_string()
    } else if f != 0.0 && (f.abs() >= 1e16 || f.abs() < 1e-4) {
        exponent_repr(f)
    } else if f.fract() == 0.0 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

/// Scientific notation with a signed, at least two-digit exponent: `1e+16`, `1.5e-07`
fn exponent_repr(f: f64) -> String {
    let scientific = format!("{f:e}");
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

/// Quote a string the way Python does: single quotes unless the text
/// contains a single quote and no double quote.
fn str_repr(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn bytes_repr(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 3);
    out.push_str("b'");
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\'' => out.push_str("\\'"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(b as char),
            _ => {
                out.push_str(&format!("\\x{b:02x}"));
            }
        }
    }
    out.push('\'');
    out
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_repr() {
        assert_eq!(Value::None.repr().unwrap(), "None");
        assert_eq!(Value::Bool(true).repr().unwrap(), "True");
        assert_eq!(Value::Int(-3).repr().unwrap(), "-3");
        assert_eq!(Value::Float(1.0).repr().unwrap(), "1.0");
        assert_eq!(Value::Float(0.25).repr().unwrap(), "0.25");
        assert_eq!(Value::Float(f64::NAN).repr().unwrap(), "nan");
    }

    #[test]
    fn test_float_repr_switches_to_exponent_form() {
        assert_eq!(Value::Float(1e16).repr().unwrap(), "1e+16");
        assert_eq!(Value::Float(1e-7).repr().unwrap(), "1e-07");
        assert_eq!(Value::Float(-1.5e-7).repr().unwrap(), "-1.5e-07");
        assert_eq!(Value::Float(2.5e200).repr().unwrap(), "2.5e+200");
        assert_eq!(Value::Float(1e15).repr().unwrap(), "1000000000000000.0");
        assert_eq!(Value::Float(0.0001).repr().unwrap(), "0.0001");
        assert_eq!(Value::Float(0.0).repr().unwrap(), "0.0");
    }

    #[test]
    fn test_string_repr_quoting() {
        assert_eq!(Value::from("abc").repr().unwrap(), "'abc'");
        assert_eq!(Value::from("it's").repr().unwrap(), "\"it's\"");
        assert_eq!(Value::from("a\nb").repr().unwrap(), "'a\\nb'");
        assert_eq!(Value::from("abc").str().unwrap(), "abc");
    }

    #[test]
    fn test_bytes_repr() {
        let value = Value::Bytes(vec![b'h', b'i', 0, b'\'']);
        assert_eq!(value.repr().unwrap(), "b'hi\\x00\\''");
    }

    #[test]
    fn test_container_repr() {
        let list = Value::List(vec![Value::Int(1), Value::from("x")]);
        assert_eq!(list.repr().unwrap(), "[1, 'x']");

        assert_eq!(Value::Tuple(vec![Value::Int(1)]).repr().unwrap(), "(1,)");
        assert_eq!(Value::Tuple(vec![]).repr().unwrap(), "()");

        let dict = Value::Dict(vec![
            (Value::from("a"), Value::Int(1)),
            (Value::Int(2), Value::None),
        ]);
        assert_eq!(dict.repr().unwrap(), "{'a': 1, 2: None}");
    }

    #[test]
    fn test_object_repr() {
        assert_eq!(Value::from(Object::new("A")).repr().unwrap(), "<A object>");
        assert_eq!(
            Value::from(Object::new("M").with_repr("aaa\nbbb")).repr().unwrap(),
            "aaa\nbbb"
        );
        assert_eq!(Value::Module("os".into()).repr().unwrap(), "<module 'os'>");
    }

    #[test]
    fn test_failing_repr_propagates_from_nested_element() {
        let bad = Value::from(Object::new("B").with_failing_repr("division by zero"));
        let list = Value::List(vec![Value::Int(1), bad]);

        let err = list.repr().unwrap_err();
        assert_eq!(err.type_name, "B");
        assert_eq!(err.message, "division by zero");
    }

    #[test]
    fn test_array_signature_detects_any_array_attribute() {
        let tensor = Value::from(
            Object::new("Tensor")
                .with_attribute("shape", Value::Tuple(vec![Value::Int(3), Value::Int(4)]))
                .with_attribute("dtype", "float32")
                .with_attribute("data", Value::List(vec![])),
        );

        let signature = tensor.array_signature().unwrap();
        assert_eq!(signature.type_name, "Tensor");
        let names: Vec<_> = signature.attributes.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["dtype", "shape"]);

        assert!(Value::from(Object::new("Plain")).array_signature().is_none());
        assert!(Value::Int(1).array_signature().is_none());
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Function("f".into()).type_name(), "function");
        assert_eq!(Value::from(Object::new("A")).type_name(), "A");
        assert_eq!(Value::Dict(vec![]).type_name(), "dict");
    }
}
