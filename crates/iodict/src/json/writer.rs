use core::fmt::{self, Write};

use super::escape::write_escaped_string;
use crate::{Map, Value};

fn newline<W: Write>(out: &mut W, pretty: bool, depth: usize) -> fmt::Result {
    if pretty {
        out.write_char('\n')?;
        for _ in 0..depth {
            out.write_str("  ")?;
        }
    }
    Ok(())
}

fn write_float<W: Write>(f: f64, out: &mut W) -> fmt::Result {
    if f.is_finite() {
        // `Display` for f64 prints the shortest digits that round-trip.
        write!(out, "{f}")
    } else {
        out.write_str("null")
    }
}

fn write_string<W: Write>(s: &str, out: &mut W) -> fmt::Result {
    out.write_char('"')?;
    write_escaped_string(s, out)?;
    out.write_char('"')
}

/// Writes the sequence form of `items`, or `[]`.
fn write_sequence<'a, W, I>(items: I, out: &mut W, pretty: bool, depth: usize) -> fmt::Result
where
    W: Write,
    I: ExactSizeIterator<Item = &'a Value>,
{
    if items.len() == 0 {
        return out.write_str("[]");
    }
    out.write_char('[')?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            out.write_char(',')?;
        }
        newline(out, pretty, depth + 1)?;
        write_value(item, out, pretty, depth + 1)?;
    }
    newline(out, pretty, depth)?;
    out.write_char(']')
}

fn write_map<W: Write>(map: &Map, out: &mut W, pretty: bool, depth: usize) -> fmt::Result {
    if map.is_array() && map.is_dense() {
        let items: Vec<&Value> = map.array_values().collect();
        return write_sequence(items.into_iter(), out, pretty, depth);
    }
    if map.is_empty() {
        return out.write_str("{}");
    }
    out.write_char('{')?;
    for (i, (key, value)) in map.iter().enumerate() {
        if i > 0 {
            out.write_char(',')?;
        }
        newline(out, pretty, depth + 1)?;
        write_string(key, out)?;
        out.write_str(if pretty { ": " } else { ":" })?;
        write_value(value, out, pretty, depth + 1)?;
    }
    newline(out, pretty, depth)?;
    out.write_char('}')
}

/// Serializes `value` as JSON. `depth` is the indentation level of `value`
/// itself and only matters when `pretty` is set.
pub(crate) fn write_value<W: Write>(value: &Value, out: &mut W, pretty: bool, depth: usize) -> fmt::Result {
    match value {
        Value::Null | Value::Undefined => out.write_str("null"),
        Value::Bool(b) => out.write_str(if *b { "true" } else { "false" }),
        Value::Int8(v) => write!(out, "{v}"),
        Value::Int16(v) => write!(out, "{v}"),
        Value::Int32(v) => write!(out, "{v}"),
        Value::Int64(v) => write!(out, "{v}"),
        Value::UInt8(v) => write!(out, "{v}"),
        Value::UInt16(v) => write!(out, "{v}"),
        Value::UInt32(v) => write!(out, "{v}"),
        Value::UInt64(v) => write!(out, "{v}"),
        Value::Numeric(f) | Value::Double(f) => write_float(*f, out),
        Value::String(s) => write_string(s, out),
        Value::ByteArray(bytes) => {
            let items: Vec<Value> = bytes.iter().copied().map(Value::UInt8).collect();
            write_sequence(items.iter(), out, pretty, depth)
        }
        Value::Map(map) => write_map(map, out, pretty, depth),
    }
}
