//! Flattening of nested [`Fields`] into query strings and multipart forms.
//!
//! Nested values are addressed with bracket paths: `user[address][city]`,
//! `tags[0]`. Keys are percent-encoded when they are emitted (top-level keys
//! and nested mapping keys alike), values only when the query string is
//! joined.
//!
//! # Example
//!
//! ```
//! use courier_core::{fields, to_query_string};
//!
//! let query = to_query_string(&fields! {
//!     "q" => "rust lang",
//!     "filter" => fields! { "tags" => vec!["http", "async"] },
//! })
//! .expect("encode");
//!
//! assert_eq!(query, "q=rust%20lang&filter[tags][0]=http&filter[tags][1]=async");
//! ```

use chrono::SecondsFormat;
use indexmap::IndexMap;
use indexmap::map::Iter;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;
use tracing::trace;

use crate::{FieldValue, Fields, FileField, Form, Part, Result, from_json};

/// Characters left as-is by [`encode_component`]: `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a single URI component.
#[must_use]
pub fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, COMPONENT).to_string()
}

/// Target of an encoding pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodeMode {
    /// URL query string; files cannot be represented and are dropped.
    QueryString,
    /// Multipart form; files are attached as-is.
    FormData,
}

/// A flattened leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedValue {
    /// Stringified value.
    Text(String),
    /// File, only produced in [`EncodeMode::FormData`].
    File(FileField),
}

impl EncodedValue {
    /// Text content, `None` for files.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::File(_) => None,
        }
    }
}

/// Flat, insertion-ordered map from field path to leaf.
///
/// Writing a path twice keeps the first position and the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedFields {
    entries: IndexMap<String, EncodedValue>,
}

impl EncodedFields {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the leaf at `path`.
    pub fn insert(&mut self, path: impl Into<String>, value: EncodedValue) {
        self.entries.insert(path.into(), value);
    }

    /// Leaf at `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&EncodedValue> {
        self.entries.get(path)
    }

    /// Number of leaves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over (path, leaf) in insertion order.
    pub fn iter(&self) -> Iter<'_, String, EncodedValue> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a EncodedFields {
    type Item = (&'a String, &'a EncodedValue);
    type IntoIter = Iter<'a, String, EncodedValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Add the entries derived from `value` under `name` to `fields`.
///
/// Dispatch order: file, date, serializable, sequence, mapping, scalar.
///
/// # Errors
///
/// Returns an error if a [`FieldValue::Serializable`] holds invalid JSON.
pub fn encode(
    fields: &mut EncodedFields,
    name: &str,
    value: &FieldValue,
    mode: EncodeMode,
) -> Result<()> {
    match value {
        FieldValue::File(file) => match mode {
            EncodeMode::FormData => fields.insert(name, EncodedValue::File(file.clone())),
            EncodeMode::QueryString => {
                trace!(field = name, "file field dropped from query string");
            }
        },
        FieldValue::Date(date) => {
            let text = date.to_rfc3339_opts(SecondsFormat::Millis, true);
            fields.insert(name, EncodedValue::Text(text));
        }
        FieldValue::Serializable(transport) => {
            let plain: Value = from_json(transport.as_bytes())?;
            encode(fields, name, &FieldValue::from(plain), mode)?;
        }
        FieldValue::Sequence(values) => {
            for (index, value) in values.iter().enumerate() {
                encode(fields, &format!("{name}[{index}]"), value, mode)?;
            }
        }
        FieldValue::Mapping(entries) => {
            for (key, value) in entries {
                let path = format!("{name}[{}]", encode_component(key));
                encode(fields, &path, value, mode)?;
            }
        }
        FieldValue::Scalar(scalar) => fields.insert(name, EncodedValue::Text(scalar.to_string())),
    }
    Ok(())
}

/// Flatten every top-level entry of `data`.
pub fn encode_fields(data: &Fields, mode: EncodeMode) -> Result<EncodedFields> {
    let mut fields = EncodedFields::new();
    for (key, value) in data {
        encode(&mut fields, &encode_component(key), value, mode)?;
    }
    Ok(fields)
}

/// Encode `data` as a URL query string (without the leading `?`).
///
/// File values are omitted.
pub fn to_query_string(data: &Fields) -> Result<String> {
    let fields = encode_fields(data, EncodeMode::QueryString)?;
    let pairs: Vec<String> = fields
        .iter()
        .filter_map(|(path, value)| {
            value
                .as_text()
                .map(|text| format!("{path}={}", encode_component(text)))
        })
        .collect();
    Ok(pairs.join("&"))
}

/// Encode `data` as a multipart form; values are kept raw and files are
/// attached as file parts.
pub fn to_form_data(data: &Fields) -> Result<Form> {
    let fields = encode_fields(data, EncodeMode::FormData)?;
    let mut form = Form::new();
    for (path, value) in &fields {
        let part = match value {
            EncodedValue::Text(text) => Part::text(path.as_str(), text.as_str()),
            EncodedValue::File(file) => Part::file(path.as_str(), file),
        };
        form.push(part);
    }
    Ok(form)
}
