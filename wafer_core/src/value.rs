// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property value types and attribute coercion.
//!
//! Property values are [`serde_json::Value`]s. An absent value (`None`) is a
//! property that was never given one, distinct from an explicit `null`.

use serde_json::{Number, Value};

use crate::Error;

/// The declared type of a property, which drives attribute coercion.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PropType {
    /// Attribute text is the value.
    #[default]
    String,
    /// Attribute text is parsed as a number.
    Number,
    /// Attribute presence means `true`.
    Boolean,
    /// Attribute text is JSON.
    Object,
    /// Attribute text is JSON.
    Array,
}

/// What reflecting a value does to its attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Reflection {
    Remove,
    Set(String),
}

/// Builds a number value, normalizing integral floats to integers.
///
/// Non-finite numbers have no JSON form and become `null`.
///
/// ```rust
/// use serde_json::json;
/// use wafer_core::number;
///
/// assert_eq!(number(3.0), json!(3));
/// assert_eq!(number(1.5), json!(1.5));
/// assert_eq!(number(f64::NAN), json!(null));
/// ```
#[must_use]
pub fn number(value: f64) -> Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "integral and within the exactly representable range"
        )]
        return Value::from(value as i64);
    }
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

/// Normalizes every number inside a value with [`number`].
///
/// Values are normalized on the way in so that `3` and `3.0` compare equal.
#[must_use]
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Number(n) if !n.is_i64() && !n.is_u64() => n.as_f64().map_or(Value::Null, number),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, normalize(value)))
                .collect(),
        ),
        other => other,
    }
}

/// Renders a value as attribute or text content.
///
/// Strings are used as is, an absent value or `null` is empty, booleans and
/// numbers take their usual spelling, arrays join their items with `,`, and
/// objects are written as JSON.
///
/// ```rust
/// use serde_json::json;
/// use wafer_core::to_text;
///
/// assert_eq!(to_text(Some(&json!("hi"))), "hi");
/// assert_eq!(to_text(Some(&json!(2.0))), "2");
/// assert_eq!(to_text(Some(&json!([1, null, [2, 3]]))), "1,,2,3");
/// assert_eq!(to_text(None), "");
/// ```
#[must_use]
pub fn to_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => number_text(n),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| to_text(Some(item)))
            .collect::<Vec<_>>()
            .join(","),
        Some(object @ Value::Object(_)) => object.to_string(),
    }
}

fn number_text(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Parses number text the way a script `Number(text)` conversion would.
fn parse_number(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::from(0);
    }
    let radix = [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)]
        .into_iter()
        .find_map(|(prefix, radix)| trimmed.strip_prefix(prefix).map(|digits| (digits, radix)));
    if let Some((digits, radix)) = radix {
        return u64::from_str_radix(digits, radix).map_or(Value::Null, Value::from);
    }
    // `inf`/`nan` spellings are not numbers in attribute text.
    if trimmed
        .trim_start_matches(['+', '-'])
        .starts_with(|c: char| c.is_ascii_alphabetic() && c != 'I')
    {
        return Value::Null;
    }
    match trimmed {
        "Infinity" | "+Infinity" | "-Infinity" => Value::Null,
        _ => trimmed.parse::<f64>().map_or(Value::Null, number),
    }
}

impl PropType {
    /// Converts attribute text into a property value.
    ///
    /// `None` means the attribute is absent: Boolean properties become
    /// `false`, everything else `null`.
    pub fn from_attribute(self, name: &str, text: Option<&str>) -> Result<Value, Error> {
        let Some(text) = text else {
            return Ok(match self {
                Self::Boolean => Value::Bool(false),
                _ => Value::Null,
            });
        };
        Ok(match self {
            Self::String => Value::String(text.to_owned()),
            Self::Number => parse_number(text),
            Self::Boolean => Value::Bool(true),
            Self::Object | Self::Array => {
                normalize(serde_json::from_str(text).map_err(|source| Error::Json {
                    name: name.to_owned(),
                    source,
                })?)
            }
        })
    }

    /// Decides what reflecting `value` does to the attribute.
    pub(crate) fn reflect(self, value: Option<&Value>) -> Reflection {
        match (self, value) {
            (_, None | Some(Value::Null)) | (Self::Boolean, Some(Value::Bool(false))) => {
                Reflection::Remove
            }
            (Self::Boolean, Some(_)) => Reflection::Set(String::new()),
            (Self::Object | Self::Array, Some(value)) => Reflection::Set(value.to_string()),
            (Self::String | Self::Number, value) => Reflection::Set(to_text(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn attribute_text_to_values() {
        assert_eq!(PropType::String.from_attribute("a", Some("x")).unwrap(), json!("x"));
        assert_eq!(PropType::Number.from_attribute("a", Some(" 12 ")).unwrap(), json!(12));
        assert_eq!(PropType::Number.from_attribute("a", Some("1.25")).unwrap(), json!(1.25));
        assert_eq!(PropType::Number.from_attribute("a", Some("")).unwrap(), json!(0));
        assert_eq!(PropType::Number.from_attribute("a", Some("0x10")).unwrap(), json!(16));
        assert_eq!(PropType::Number.from_attribute("a", Some("abc")).unwrap(), json!(null));
        assert_eq!(PropType::Number.from_attribute("a", Some("nan")).unwrap(), json!(null));
        assert_eq!(PropType::Boolean.from_attribute("a", Some("")).unwrap(), json!(true));
        assert_eq!(PropType::Boolean.from_attribute("a", Some("false")).unwrap(), json!(true));
        assert_eq!(
            PropType::Array.from_attribute("a", Some("[1,2.0]")).unwrap(),
            json!([1, 2])
        );
        assert_eq!(
            PropType::Object.from_attribute("a", Some(r#"{"k":"v"}"#)).unwrap(),
            json!({"k": "v"})
        );
    }

    #[test]
    fn absent_attribute_values() {
        assert_eq!(PropType::Boolean.from_attribute("a", None).unwrap(), json!(false));
        assert_eq!(PropType::Number.from_attribute("a", None).unwrap(), json!(null));
        assert_eq!(PropType::Object.from_attribute("a", None).unwrap(), json!(null));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = PropType::Array.from_attribute("items", Some("[1,")).unwrap_err();
        assert!(matches!(err, Error::Json { ref name, .. } if name == "items"));
    }

    #[test]
    fn reflection_rules() {
        assert_eq!(PropType::Boolean.reflect(Some(&json!(true))), Reflection::Set(String::new()));
        assert_eq!(PropType::Boolean.reflect(Some(&json!(false))), Reflection::Remove);
        assert_eq!(PropType::Boolean.reflect(Some(&json!(null))), Reflection::Remove);
        assert_eq!(PropType::String.reflect(Some(&json!(null))), Reflection::Remove);
        assert_eq!(PropType::String.reflect(None), Reflection::Remove);
        assert_eq!(PropType::Number.reflect(Some(&json!(3))), Reflection::Set("3".into()));
        assert_eq!(
            PropType::Array.reflect(Some(&json!([1, 2, 3]))),
            Reflection::Set("[1,2,3]".into())
        );
        assert_eq!(
            PropType::Object.reflect(Some(&json!({"a": [true]}))),
            Reflection::Set(r#"{"a":[true]}"#.into())
        );
    }

    #[test]
    fn reflected_values_read_back_equal() {
        let cases = [
            (PropType::String, json!("hello world")),
            (PropType::Number, json!(42.5)),
            (PropType::Boolean, json!(true)),
            (PropType::Object, json!({"nested": {"list": [1, "two"]}})),
            (PropType::Array, json!([1, 2, 3])),
        ];
        for (ty, value) in cases {
            let Reflection::Set(text) = ty.reflect(Some(&value)) else {
                panic!("{ty:?} should set its attribute");
            };
            assert_eq!(ty.from_attribute("p", Some(&text)).unwrap(), value, "{ty:?}");
        }
    }

    #[test]
    fn normalization_makes_numbers_comparable() {
        assert_eq!(normalize(json!([1.0, {"a": 2.0}])), json!([1, {"a": 2}]));
        assert_eq!(to_text(Some(&json!(0.5))), "0.5");
        assert_eq!(to_text(Some(&json!(true))), "true");
        assert_eq!(to_text(Some(&json!({"a": 1}))), r#"{"a":1}"#);
    }
}
