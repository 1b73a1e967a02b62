//! Value summarization
//!
//! Converts captured values into bounded, display-safe values before they are
//! rendered. Sequences are cut to a threshold with an omitted-count marker,
//! text is capped, and array-like objects collapse into a short tag so their
//! buffers are never walked.

use std::borrow::Cow;

use crate::value::Value;

/// Cap on displayed characters (for text) or bytes (for byte strings).
pub const TEXT_CAP: usize = 500;

/// Default number of sequence elements shown before truncation.
pub const DEFAULT_THRESHOLD: usize = 3;

/// Summarize `value` for display.
///
/// Lists and tuples longer than `threshold` keep their first `threshold`
/// elements followed by a `"...<N more>"` string. Dicts keep every key.
/// Nested containers use the same threshold at every depth.
pub fn summarize(value: &Value, threshold: usize) -> Value {
    match value {
        Value::List(items) => Value::List(summarize_sequence(items, threshold)),
        Value::Tuple(items) => Value::Tuple(summarize_sequence(items, threshold)),
        Value::Dict(entries) => Value::Dict(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), summarize(&collapse_array(value), threshold)))
                .collect(),
        ),
        Value::Str(text) => Value::Str(cap_text(text)),
        Value::Bytes(bytes) => Value::Bytes(bytes[..bytes.len().min(TEXT_CAP)].to_vec()),
        other => collapse_array(other).into_owned(),
    }
}

fn summarize_sequence(items: &[Value], threshold: usize) -> Vec<Value> {
    let mut summarized: Vec<Value> = items
        .iter()
        .take(threshold)
        .map(|item| summarize(&collapse_array(item), threshold))
        .collect();

    if items.len() > threshold {
        summarized.push(Value::Str(omitted_marker(items.len() - threshold)));
    }

    summarized
}

/// The trailing element that stands in for omitted sequence items
pub fn omitted_marker(count: usize) -> String {
    format!("...<{count} more>")
}

fn cap_text(text: &str) -> String {
    match text.char_indices().nth(TEXT_CAP) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

/// Replace an array-like value with its `<TypeName attr ...>` tag.
pub fn collapse_array(value: &Value) -> Cow<'_, Value> {
    let Some(signature) = value.array_signature() else {
        return Cow::Borrowed(value);
    };

    let mut parts = Vec::with_capacity(signature.attributes.len() + 1);
    parts.push(signature.type_name.to_string());
    for (name, attribute) in &signature.attributes {
        match attribute.str() {
            Ok(text) => parts.push(text),
            Err(e) => {
                log::debug!("array attribute `{name}` of {} is unprintable: {e}", signature.type_name);
                parts.push(format!("<unprintable {name}: {e}>"));
            }
        }
    }

    Cow::Owned(Value::Str(format!("<{}>", parts.join(" "))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Object;

    fn ints(n: i64) -> Vec<Value> {
        (0..n).map(Value::Int).collect()
    }

    fn tensor() -> Value {
        Value::from(
            Object::new("Tensor")
                .with_attribute("shape", Value::Tuple(vec![Value::Int(2), Value::Int(3)]))
                .with_attribute("dtype", "float32")
                .with_attribute("device", "cpu"),
        )
    }

    #[test]
    fn test_long_list_is_truncated_with_marker() {
        let summarized = summarize(&Value::List(ints(10)), 3);
        assert_eq!(
            summarized,
            Value::List(vec![
                Value::Int(0),
                Value::Int(1),
                Value::Int(2),
                Value::from("...<7 more>"),
            ])
        );
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let summarized = summarize(&Value::List(ints(3)), 3);
        assert_eq!(summarized, Value::List(ints(3)));
    }

    #[test]
    fn test_sequence_length_property() {
        for len in 0..8 {
            for threshold in 0..5 {
                let Value::Tuple(items) = summarize(&Value::Tuple(ints(len)), threshold) else {
                    panic!("tuple stays a tuple");
                };
                let len = len as usize;
                if len > threshold {
                    assert_eq!(items.len(), threshold + 1);
                    assert_eq!(items[threshold], Value::Str(omitted_marker(len - threshold)));
                } else {
                    assert_eq!(items.len(), len);
                }
            }
        }
    }

    #[test]
    fn test_nested_containers_use_same_threshold() {
        let nested = Value::List(vec![Value::List(ints(5)), Value::List(ints(1))]);
        let summarized = summarize(&nested, 2);
        assert_eq!(
            summarized.repr().unwrap(),
            "[[0, 1, '...<3 more>'], [0]]"
        );
    }

    #[test]
    fn test_dict_keeps_every_key_in_order() {
        let entries: Vec<(Value, Value)> = (0..10)
            .map(|i| (Value::from(format!("k{i}")), Value::List(ints(6))))
            .collect();
        let Value::Dict(summarized) = summarize(&Value::Dict(entries.clone()), 2) else {
            panic!("dict stays a dict");
        };

        let keys: Vec<_> = summarized.iter().map(|(k, _)| k.clone()).collect();
        let expected: Vec<_> = entries.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, expected);
        assert_eq!(summarized[0].1.repr().unwrap(), "[0, 1, '...<4 more>']");
    }

    #[test]
    fn test_text_and_bytes_are_capped_silently() {
        let long = "é".repeat(800);
        let Value::Str(text) = summarize(&Value::Str(long), 3) else {
            panic!("text stays text");
        };
        assert_eq!(text.chars().count(), TEXT_CAP);

        let Value::Str(short) = summarize(&Value::from("short"), 3) else {
            panic!("text stays text");
        };
        assert_eq!(short, "short");

        let Value::Bytes(bytes) = summarize(&Value::Bytes(vec![7; 600]), 3) else {
            panic!("bytes stay bytes");
        };
        assert_eq!(bytes.len(), TEXT_CAP);
    }

    #[test]
    fn test_array_like_values_collapse_to_tag() {
        assert_eq!(
            summarize(&tensor(), 3),
            Value::from("<Tensor float32 (2, 3) cpu>")
        );

        let list = Value::List(vec![tensor(), Value::Int(1)]);
        assert_eq!(
            summarize(&list, 3).repr().unwrap(),
            "['<Tensor float32 (2, 3) cpu>', 1]"
        );
    }

    #[test]
    fn test_unprintable_array_attribute_becomes_note() {
        let odd = Value::from(
            Object::new("Weird")
                .with_attribute("shape", Object::new("Shape").with_failing_repr("boom")),
        );
        assert_eq!(
            summarize(&odd, 3),
            Value::from("<Weird <unprintable shape: boom>>")
        );
    }

    #[test]
    fn test_other_values_pass_through() {
        let obj = Value::from(Object::new("A").with_attribute("x", 10));
        assert_eq!(summarize(&obj, 3), obj);
        assert_eq!(summarize(&Value::Float(1.5), 3), Value::Float(1.5));
    }
}
