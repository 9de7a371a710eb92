//! Compact, self-describing binary encoding of a [`Value`] tree.
//!
//! Every node is one tag byte (the [`ValueType`] discriminant) followed by its
//! payload. Multi-byte integers are big-endian.
//!
//! | tag                 | payload                                           |
//! |---------------------|---------------------------------------------------|
//! | null, undefined     | none                                              |
//! | bool                | one byte, 0 or 1                                  |
//! | int8 .. uint64      | the integer in its own width                      |
//! | numeric, double     | IEEE-754 binary64                                 |
//! | string, bytearray   | `u32` length, raw bytes                           |
//! | map                 | flags byte (bit 0: array), `u32` count, children  |
//!
//! Each map child is a `u32`-length key followed by the encoded child.
//! [`Value::to_binary`] prefixes the tree with [`BINARY_FORMAT_VERSION`];
//! [`encode_value`] and [`decode_value`] work on bare trees.
use log::debug;

use crate::{
    ByteBuffer, Map, Value, ValueType,
    error::{CorruptData, Error, Result},
    options::BinaryOptions,
};

/// Leading byte written by [`Value::to_binary`].
pub const BINARY_FORMAT_VERSION: u8 = 1;

const MAP_FLAG_ARRAY: u8 = 0x01;

/// Smallest encoding of one map child: an empty key and a payload-less tag.
const MIN_CHILD_LEN: usize = 5;

/// Appends the encoding of `value` to `out`, refusing trees the default
/// decoder would reject for their depth.
///
/// # Errors
///
/// See [`encode_value_with_options`].
pub fn encode_value(value: &Value, out: &mut ByteBuffer) -> Result<()> {
    encode_value_with_options(value, out, &BinaryOptions::default())
}

/// Appends the encoding of `value` to `out`.
///
/// # Errors
///
/// [`Error::StringTooLong`] if a string, key or byte array exceeds
/// `u32::MAX` bytes, [`Error::DepthLimitExceeded`] if maps nest deeper than
/// `options.max_depth`, or [`Error::AllocationFailure`]. In every case `out`
/// holds exactly what it held before the call.
pub fn encode_value_with_options(value: &Value, out: &mut ByteBuffer, options: &BinaryOptions) -> Result<()> {
    // Growth may compact the buffer, so remember the window length rather
    // than the write offset.
    let window = out.available();
    let result = encode_node(value, out, 0, options.max_depth);
    if result.is_err() {
        out.truncate(out.consumed() + window);
    }
    result
}

fn store_len(out: &mut ByteBuffer, len: usize) -> Result<()> {
    let len = u32::try_from(len).map_err(|_| Error::StringTooLong(len))?;
    out.store_u32_be(len)
}

fn store_prefixed(out: &mut ByteBuffer, bytes: &[u8]) -> Result<()> {
    store_len(out, bytes.len())?;
    out.store_bytes(bytes)
}

fn encode_node(value: &Value, out: &mut ByteBuffer, depth: usize, max_depth: usize) -> Result<()> {
    out.store_u8(value.value_type().tag())?;
    match value {
        Value::Null | Value::Undefined => Ok(()),
        Value::Bool(b) => out.store_bool(*b),
        Value::Int8(v) => out.store_i8(*v),
        Value::Int16(v) => out.store_i16_be(*v),
        Value::Int32(v) => out.store_i32_be(*v),
        Value::Int64(v) => out.store_i64_be(*v),
        Value::UInt8(v) => out.store_u8(*v),
        Value::UInt16(v) => out.store_u16_be(*v),
        Value::UInt32(v) => out.store_u32_be(*v),
        Value::UInt64(v) => out.store_u64_be(*v),
        Value::Numeric(f) | Value::Double(f) => out.store_f64_be(*f),
        Value::String(s) => store_prefixed(out, s.as_bytes()),
        Value::ByteArray(bytes) => store_prefixed(out, bytes),
        Value::Map(map) => {
            let depth = depth + 1;
            if depth > max_depth {
                return Err(Error::DepthLimitExceeded(max_depth));
            }
            out.store_u8(if map.is_array() { MAP_FLAG_ARRAY } else { 0 })?;
            store_len(out, map.len())?;
            for (key, child) in map {
                store_prefixed(out, key.as_bytes())?;
                encode_node(child, out, depth, max_depth)?;
            }
            Ok(())
        }
    }
}

/// Decodes one bare tree from the read cursor of `input`.
///
/// # Errors
///
/// [`Error::CorruptData`] for anything that is not a complete, well-formed
/// encoding. The read cursor is restored to where it was on entry and no
/// partial tree is returned.
pub fn decode_value(input: &mut ByteBuffer, options: &BinaryOptions) -> Result<Value> {
    let start = input.consumed();
    let result = Decoder {
        input: &mut *input,
        options,
    }
    .node(0);
    if let Err(e) = &result {
        let consumed = input.consumed();
        input.rewind(consumed - start);
        debug!("binary: rejected payload at offset {start}: {e}");
    }
    result
}

struct Decoder<'a> {
    input: &'a mut ByteBuffer,
    options: &'a BinaryOptions,
}

impl Decoder<'_> {
    fn node(&mut self, depth: usize) -> Result<Value> {
        let tag = self.input.consume_u8().map_err(truncated)?;
        let Some(ty) = ValueType::from_tag(tag) else {
            return Err(CorruptData::UnknownTag(tag).into());
        };
        let value = match ty {
            ValueType::Null => Value::Null,
            ValueType::Undefined => Value::Undefined,
            ValueType::Bool => Value::Bool(self.input.consume_bool().map_err(truncated)?),
            ValueType::Int8 => Value::Int8(self.input.consume_i8().map_err(truncated)?),
            ValueType::Int16 => Value::Int16(self.input.consume_i16_be().map_err(truncated)?),
            ValueType::Int32 => Value::Int32(self.input.consume_i32_be().map_err(truncated)?),
            ValueType::Int64 => Value::Int64(self.input.consume_i64_be().map_err(truncated)?),
            ValueType::UInt8 => Value::UInt8(self.input.consume_u8().map_err(truncated)?),
            ValueType::UInt16 => Value::UInt16(self.input.consume_u16_be().map_err(truncated)?),
            ValueType::UInt32 => Value::UInt32(self.input.consume_u32_be().map_err(truncated)?),
            ValueType::UInt64 => Value::UInt64(self.input.consume_u64_be().map_err(truncated)?),
            ValueType::Numeric => Value::Numeric(self.input.consume_f64_be().map_err(truncated)?),
            ValueType::Double => Value::Double(self.input.consume_f64_be().map_err(truncated)?),
            ValueType::String => Value::String(self.string()?),
            ValueType::ByteArray => Value::ByteArray(self.bytes()?.to_vec()),
            ValueType::Map => Value::Map(self.map(depth + 1)?),
        };
        Ok(value)
    }

    /// Reads a `u32` length and checks that many bytes remain.
    fn length(&mut self, unit: usize) -> Result<usize> {
        let declared = usize::try_from(self.input.consume_u32_be().map_err(truncated)?).unwrap_or(usize::MAX);
        let available = self.input.available();
        if declared.saturating_mul(unit) > available {
            return Err(CorruptData::LengthOutOfBounds { declared, available }.into());
        }
        Ok(declared)
    }

    fn bytes(&mut self) -> Result<&[u8]> {
        let len = self.length(1)?;
        self.input.consume_bytes(len).map_err(truncated)
    }

    fn string(&mut self) -> Result<String> {
        let bytes = self.bytes()?;
        match core::str::from_utf8(bytes) {
            Ok(s) => Ok(s.to_owned()),
            Err(_) => Err(CorruptData::InvalidUtf8.into()),
        }
    }

    fn map(&mut self, depth: usize) -> Result<Map> {
        if depth > self.options.max_depth {
            return Err(CorruptData::DepthLimitExceeded(self.options.max_depth).into());
        }
        let flags = self.input.consume_u8().map_err(truncated)?;
        if flags & !MAP_FLAG_ARRAY != 0 {
            return Err(CorruptData::UnknownMapFlags(flags).into());
        }
        let count = self.length(MIN_CHILD_LEN)?;
        let mut map = Map::with_capacity(count);
        map.set_array(flags & MAP_FLAG_ARRAY != 0);
        for _ in 0..count {
            let key = self.string()?;
            let child = self.node(depth)?;
            map.insert(key, child);
        }
        Ok(map)
    }
}

fn truncated(e: Error) -> Error {
    match e {
        Error::Underflow {
            requested,
            available,
        } => CorruptData::Truncated {
            needed: requested,
            available,
        }
        .into(),
        other => other,
    }
}

impl Value {
    /// Writes [`BINARY_FORMAT_VERSION`] followed by the encoded tree.
    ///
    /// # Errors
    ///
    /// As [`encode_value`]; on failure `out` is left as it was.
    ///
    /// # Examples
    ///
    /// ```
    /// use iodict::{ByteBuffer, Value};
    ///
    /// let mut tree = Value::default();
    /// tree["id"] = 7u32.into();
    /// tree["tags"].push_to_array("a".into());
    ///
    /// let mut buf = ByteBuffer::new();
    /// tree.to_binary(&mut buf).unwrap();
    /// assert_eq!(Value::from_binary(&mut buf).unwrap(), tree);
    /// assert!(!buf.has_bytes_to_read());
    /// ```
    pub fn to_binary(&self, out: &mut ByteBuffer) -> Result<()> {
        self.to_binary_with_options(out, &BinaryOptions::default())
    }

    /// [`to_binary`](Self::to_binary) with an explicit depth limit.
    ///
    /// # Errors
    ///
    /// See [`encode_value_with_options`]; `out` is left as it was.
    pub fn to_binary_with_options(&self, out: &mut ByteBuffer, options: &BinaryOptions) -> Result<()> {
        let window = out.available();
        out.store_u8(BINARY_FORMAT_VERSION)?;
        encode_value_with_options(self, out, options).inspect_err(|_| out.truncate(out.consumed() + window))
    }

    /// Reads a versioned tree written by [`to_binary`](Self::to_binary).
    ///
    /// # Errors
    ///
    /// [`Error::CorruptData`]; the read cursor is left where it was.
    pub fn from_binary(input: &mut ByteBuffer) -> Result<Value> {
        Self::from_binary_with_options(input, &BinaryOptions::default())
    }

    /// [`from_binary`](Self::from_binary) with explicit decoder limits.
    ///
    /// # Errors
    ///
    /// [`Error::CorruptData`]; the read cursor is left where it was.
    pub fn from_binary_with_options(input: &mut ByteBuffer, options: &BinaryOptions) -> Result<Value> {
        let version = input.consume_u8().map_err(truncated)?;
        if version != BINARY_FORMAT_VERSION {
            input.rewind(1);
            debug!("binary: unsupported format version {version}");
            return Err(CorruptData::UnsupportedVersion(version).into());
        }
        decode_value(input, options).inspect_err(|_| {
            input.rewind(1);
        })
    }
}
