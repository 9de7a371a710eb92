//! JSON text codec.
//!
//! Reading collapses every number to [`Value::Numeric`]: JSON text has no
//! integer widths, so a tree holding `Int32(7)` comes back as `Numeric(7.0)`.
//! Writing is lossy in the other direction too. `Undefined` is written as
//! `null`, byte arrays as arrays of numbers, non-finite floats as `null`, and
//! an array-flagged map with keys outside its dense prefix as an object.
mod escape;
mod reader;
mod writer;

pub(crate) use writer::write_value;

use crate::{Value, error::ParseError, options::JsonOptions};

/// Parses one JSON document with the given options.
///
/// # Errors
///
/// [`ParseError`] with the offset of the first offending byte. No partial
/// tree is returned.
pub fn from_str_with_options(src: &str, options: JsonOptions) -> Result<Value, ParseError> {
    let result = reader::Reader::new(src, options).parse_document();
    if let Err(e) = &result {
        log::debug!("json: rejected document: {e}");
    }
    result
}

/// Serializes `value`, pretty-printed if `options.pretty` is set.
#[must_use]
pub fn to_string_with_options(value: &Value, options: JsonOptions) -> String {
    let mut out = String::new();
    // Writing into a `String` cannot fail.
    let _ = write_value(value, &mut out, options.pretty, 0);
    out
}

impl Value {
    /// Parses a JSON document with default options.
    ///
    /// # Errors
    ///
    /// [`ParseError`] if the text is not a single well-formed JSON value.
    ///
    /// # Examples
    ///
    /// ```
    /// use iodict::Value;
    ///
    /// let v = Value::from_json(r#"{"a":1,"b":[true,null,"x"]}"#).unwrap();
    /// assert_eq!(v["a"], Value::Numeric(1.0));
    /// assert!(v["b"].is_array());
    /// assert_eq!(v["b"].map_dense_size(), 3);
    /// ```
    pub fn from_json(src: &str) -> Result<Value, ParseError> {
        from_str_with_options(src, JsonOptions::default())
    }

    /// Compact JSON text; the same as `to_string()`.
    #[must_use]
    pub fn to_json(&self) -> String {
        to_string_with_options(self, JsonOptions::default())
    }

    /// JSON text indented by two spaces per level.
    #[must_use]
    pub fn to_json_pretty(&self) -> String {
        to_string_with_options(
            self,
            JsonOptions {
                pretty: true,
                ..Default::default()
            },
        )
    }
}
