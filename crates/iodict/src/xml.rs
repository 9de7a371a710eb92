//! One-way XML rendering of a [`Value`] tree, meant for inspection and for
//! feeding tools that only speak XML.
//!
//! Every node becomes an element named after its key with a `type` attribute
//! holding the [`ValueType`](crate::ValueType) name. The root is `<root>`.
//! Array elements are `<item index="n">`. Keys that are not usable as element
//! names are written as `<entry key="...">`. Byte arrays are rendered as
//! uppercase hex.
use core::fmt::{self, Write};

use crate::{Map, Value};

const HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Renders `value` as an indented XML document.
#[must_use]
pub fn to_string(value: &Value) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    // Writing into a `String` cannot fail.
    let _ = write_element(&mut out, &Tag::Named("root"), value, 0);
    out.push('\n');
    out
}

impl Value {
    /// See [`xml::to_string`](to_string).
    ///
    /// ```
    /// use iodict::Value;
    ///
    /// let mut v = Value::default();
    /// v["greeting"] = "a < b".into();
    /// assert!(v.to_xml().contains(r#"<greeting type="string">a &lt; b</greeting>"#));
    /// ```
    #[must_use]
    pub fn to_xml(&self) -> String {
        to_string(self)
    }
}

enum Tag<'a> {
    Named(&'a str),
    Item(usize),
    Entry(&'a str),
}

impl<'a> Tag<'a> {
    fn for_key(key: &'a str) -> Self {
        if is_xml_name(key) {
            Self::Named(key)
        } else {
            Self::Entry(key)
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Item(_) => "item",
            Self::Entry(_) => "entry",
        }
    }

    fn write_open<W: Write>(&self, out: &mut W) -> fmt::Result {
        write!(out, "<{}", self.name())?;
        match self {
            Self::Named(_) => Ok(()),
            Self::Item(index) => write!(out, r#" index="{index}""#),
            Self::Entry(key) => {
                out.write_str(r#" key=""#)?;
                write_escaped(out, key)?;
                out.write_char('"')
            }
        }
    }
}

/// Element names must start with a letter or underscore, continue with
/// letters, digits, `-`, `_` or `.`, and must not start with `xml`.
fn is_xml_name(key: &str) -> bool {
    let mut chars = key.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !key.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("xml"))
}

fn write_escaped<W: Write>(out: &mut W, text: &str) -> fmt::Result {
    for c in text.chars() {
        match c {
            '&' => out.write_str("&amp;")?,
            '<' => out.write_str("&lt;")?,
            '>' => out.write_str("&gt;")?,
            '"' => out.write_str("&quot;")?,
            '\'' => out.write_str("&apos;")?,
            _ => out.write_char(c)?,
        }
    }
    Ok(())
}

fn indent<W: Write>(out: &mut W, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        out.write_str("  ")?;
    }
    Ok(())
}

fn write_element<W: Write>(out: &mut W, tag: &Tag<'_>, value: &Value, depth: usize) -> fmt::Result {
    indent(out, depth)?;
    tag.write_open(out)?;
    write!(out, r#" type="{}""#, value.value_type())?;

    let text = match value {
        Value::Null | Value::Undefined => return out.write_str("/>"),
        Value::Map(map) => return write_children(out, tag, map, depth),
        Value::String(s) => s.clone(),
        Value::ByteArray(bytes) => bytes.iter().map(|b| format!("{b:02X}")).collect(),
        scalar => scalar.get_as_string(),
    };
    if text.is_empty() {
        return out.write_str("/>");
    }
    out.write_char('>')?;
    write_escaped(out, &text)?;
    write!(out, "</{}>", tag.name())
}

fn write_children<W: Write>(out: &mut W, tag: &Tag<'_>, map: &Map, depth: usize) -> fmt::Result {
    let as_array = map.is_array() && map.is_dense();
    if as_array {
        out.write_str(r#" array="true""#)?;
    }
    if map.is_empty() {
        return out.write_str("/>");
    }
    out.write_char('>')?;
    if as_array {
        for (index, child) in map.array_values().enumerate() {
            out.write_char('\n')?;
            write_element(out, &Tag::Item(index), child, depth + 1)?;
        }
    } else {
        for (key, child) in map {
            out.write_char('\n')?;
            write_element(out, &Tag::for_key(key), child, depth + 1)?;
        }
    }
    out.write_char('\n')?;
    indent(out, depth)?;
    write!(out, "</{}>", tag.name())
}
