//! Field values accepted by the encoder.
//!
//! [`FieldValue`] is a closed set of shapes; the encoder dispatches on the
//! variant, so the priority between shapes is decided by the tag rather than
//! by probing the value at runtime.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value;

use crate::Result;

/// Insertion-ordered mapping of field names to values.
pub type Fields = IndexMap<String, FieldValue>;

/// A value to encode into a query string or a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Binary content; only multipart forms can carry it.
    File(FileField),
    /// Point in time, encoded as ISO 8601.
    Date(DateTime<Utc>),
    /// JSON transport form of a custom type, re-encoded after parsing.
    Serializable(String),
    /// Ordered elements, encoded as `name[index]`.
    Sequence(Vec<FieldValue>),
    /// Nested mapping, encoded as `name[key]`.
    Mapping(Fields),
    /// Leaf value.
    Scalar(Scalar),
}

impl FieldValue {
    /// Capture the JSON transport form of any serializable value.
    ///
    /// # Example
    ///
    /// ```
    /// use courier_core::FieldValue;
    ///
    /// #[derive(serde::Serialize)]
    /// struct Range { from: u32, to: u32 }
    ///
    /// let value = FieldValue::serializable(&Range { from: 1, to: 5 }).expect("serialize");
    /// assert_eq!(value, FieldValue::Serializable(r#"{"from":1,"to":5}"#.to_string()));
    /// ```
    pub fn serializable<T: serde::Serialize>(value: &T) -> Result<Self> {
        Ok(Self::Serializable(serde_json::to_string(value)?))
    }

    /// The `null` scalar.
    #[must_use]
    pub const fn null() -> Self {
        Self::Scalar(Scalar::Null)
    }
}

/// Leaf values, stringified the way browsers stringify form fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// `null`.
    Null,
    /// `true` / `false`.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) if value.is_nan() => f.write_str("NaN"),
            Self::Float(value) if value.is_infinite() => {
                f.write_str(if value.is_sign_positive() {
                    "Infinity"
                } else {
                    "-Infinity"
                })
            }
            Self::Float(value) => write_float(f, *value),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// Shortest round-trip digits, switching to exponent notation outside
/// `[1e-6, 1e21)` with an explicit `+` on positive exponents.
fn write_float(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value.classify() == std::num::FpCategory::Zero {
        return f.write_str("0");
    }
    let magnitude = value.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return write!(f, "{value}");
    }

    let formatted = format!("{value:e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            write!(f, "{mantissa}e+{exponent}")
        }
        _ => f.write_str(&formatted),
    }
}

/// A file attached to a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileField {
    filename: String,
    content_type: Option<String>,
    data: Bytes,
}

impl FileField {
    /// Create a file from its name and content.
    #[must_use]
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            data: data.into(),
        }
    }

    /// Set an explicit content type instead of guessing from the extension.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// File name.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Explicit content type, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// File content.
    #[must_use]
    pub const fn data(&self) -> &Bytes {
        &self.data
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<Scalar> for FieldValue {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Scalar(Scalar::Text(value.to_string()))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Scalar(Scalar::Text(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Scalar(Scalar::Bool(value))
    }
}

macro_rules! from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    Self::Scalar(Scalar::Int(i64::from(value)))
                }
            }
        )*
    };
}

from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Scalar(Scalar::Float(value))
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}

impl From<FileField> for FieldValue {
    fn from(value: FileField) -> Self {
        Self::File(value)
    }
}

impl From<Fields> for FieldValue {
    fn from(value: Fields) -> Self {
        Self::Mapping(value)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(values: Vec<T>) -> Self {
        Self::Sequence(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Self::null, Into::into)
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::null(),
            Value::Bool(value) => value.into(),
            Value::Number(number) => number.as_i64().map_or_else(
                || Self::Scalar(Scalar::Float(number.as_f64().unwrap_or(f64::NAN))),
                |value| Self::Scalar(Scalar::Int(value)),
            ),
            Value::String(value) => value.into(),
            Value::Array(values) => Self::Sequence(values.into_iter().map(Self::from).collect()),
            Value::Object(entries) => Self::Mapping(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

/// Build a [`Fields`] mapping from `key => value` pairs.
///
/// # Example
///
/// ```
/// use courier_core::fields;
///
/// let query = fields! { "q" => "rust", "page" => 2 };
/// assert_eq!(query.len(), 2);
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::Fields::new();
        $(
            fields.insert(::std::string::String::from($key), $crate::FieldValue::from($value));
        )+
        fields
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_display_matches_form_stringification() {
        assert_eq!(Scalar::Null.to_string(), "null");
        assert_eq!(Scalar::Bool(false).to_string(), "false");
        assert_eq!(Scalar::Int(-42).to_string(), "-42");
        assert_eq!(Scalar::Float(1.5).to_string(), "1.5");
        assert_eq!(Scalar::Float(2.0).to_string(), "2");
        assert_eq!(Scalar::Float(f64::NAN).to_string(), "NaN");
        assert_eq!(Scalar::Float(-0.0).to_string(), "0");
        assert_eq!(Scalar::Float(1e20).to_string(), "100000000000000000000");
        assert_eq!(Scalar::Float(1e21).to_string(), "1e+21");
        assert_eq!(Scalar::Float(-2.5e30).to_string(), "-2.5e+30");
        assert_eq!(Scalar::Float(0.000_001).to_string(), "0.000001");
        assert_eq!(Scalar::Float(1e-7).to_string(), "1e-7");
        assert_eq!(Scalar::Float(1.5e-7).to_string(), "1.5e-7");
        assert_eq!(Scalar::Float(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(Scalar::Float(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Scalar::Text("a b".to_string()).to_string(), "a b");
    }

    #[test]
    fn from_json_value_keeps_key_order() {
        let value = FieldValue::from(json!({"z": 1, "a": [true, null], "m": 0.5}));

        let FieldValue::Mapping(fields) = value else {
            panic!("expected a mapping");
        };
        let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "a", "m"]);
        assert_eq!(fields.get("z"), Some(&FieldValue::from(1)));
        assert_eq!(
            fields.get("a"),
            Some(&FieldValue::Sequence(vec![true.into(), FieldValue::null()]))
        );
        assert_eq!(fields.get("m"), Some(&FieldValue::from(0.5)));
    }

    #[test]
    fn option_maps_to_null() {
        assert_eq!(FieldValue::from(None::<u32>), FieldValue::null());
        assert_eq!(FieldValue::from(Some("x")), FieldValue::from("x"));
    }

    #[test]
    fn fields_macro_preserves_order() {
        let fields = fields! { "b" => 1, "a" => "two", "c" => vec![1, 2] };
        let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(keys, ["b", "a", "c"]);
    }

    #[test]
    fn file_field_accessors() {
        let file = FileField::new("avatar.png", vec![1, 2, 3]).with_content_type("image/x-custom");
        assert_eq!(file.filename(), "avatar.png");
        assert_eq!(file.content_type(), Some("image/x-custom"));
        assert_eq!(file.data().as_ref(), &[1, 2, 3]);
    }
}
