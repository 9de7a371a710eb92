//! The dynamically-typed value tree.
//!
//! This module defines the [`Value`] enum, its [`ValueType`] tags, the
//! permissive `get_as_*` coercions and the strict `as_*`/`TryFrom`
//! accessors. The codecs live in [`binary`](crate::binary),
//! [`json`](crate::json) and [`xml`](crate::xml).
use core::{
    fmt,
    ops::{Index, IndexMut},
    str::FromStr,
};

use crate::{
    Map,
    error::{Error, ParseError},
};

/// Type tag of a [`Value`]. The discriminants are the tag bytes of the binary
/// format and never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueType {
    Null = 0,
    Undefined = 1,
    Bool = 2,
    Int8 = 3,
    Int16 = 4,
    Int32 = 5,
    Int64 = 6,
    UInt8 = 7,
    UInt16 = 8,
    UInt32 = 9,
    UInt64 = 10,
    Numeric = 11,
    Double = 12,
    String = 13,
    Map = 14,
    ByteArray = 15,
}

impl ValueType {
    const ALL: [ValueType; 16] = [
        Self::Null,
        Self::Undefined,
        Self::Bool,
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::UInt8,
        Self::UInt16,
        Self::UInt32,
        Self::UInt64,
        Self::Numeric,
        Self::Double,
        Self::String,
        Self::Map,
        Self::ByteArray,
    ];

    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(usize::from(tag)).copied()
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Undefined => "undefined",
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Numeric => "numeric",
            Self::Double => "double",
            Self::String => "string",
            Self::Map => "map",
            Self::ByteArray => "bytearray",
        }
    }

    /// Integer tags plus `Numeric` and `Double`.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::UInt8
                | Self::UInt16
                | Self::UInt32
                | Self::UInt64
                | Self::Numeric
                | Self::Double
        )
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A node of the tree.
///
/// Maps own their children, and cloning a value deep-copies everything
/// below it.
///
/// # Examples
///
/// ```
/// use iodict::Value;
///
/// let mut v = Value::default();
/// v["name"] = "probe".into();
/// v["samples"].push_to_array(3u8.into());
/// v["samples"].push_to_array(4u8.into());
/// assert_eq!(v.to_json(), r#"{"name":"probe","samples":[3,4]}"#);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    Null,
    #[default]
    Undefined,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    /// A number of unspecified width, as produced by the JSON reader.
    Numeric(f64),
    Double(f64),
    String(String),
    Map(Map),
    ByteArray(Vec<u8>),
}

static UNDEFINED: Value = Value::Undefined;

macro_rules! from_scalar {
    ($( $ty:ty => $variant:ident ),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

from_scalar! {
    bool => Bool,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f64 => Double,
    String => String,
    Map => Map,
    Vec<u8> => ByteArray,
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Double(f64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Self::ByteArray(v.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    /// Builds an array.
    fn from(v: Vec<Value>) -> Self {
        Self::Map(Map::from(v))
    }
}

/// Intermediate form used by the permissive coercions.
enum Scalar {
    Int(i128),
    Float(f64),
}

fn parse_scalar(s: &str) -> Option<Scalar> {
    let s = s.trim();
    s.parse::<i128>()
        .map(Scalar::Int)
        .ok()
        .or_else(|| s.parse::<f64>().ok().map(Scalar::Float))
}

macro_rules! coercions {
    ($( $name:ident -> $ty:ty ),* $(,)?) => {
        $(
            #[doc = concat!("Best-effort conversion to `", stringify!($ty), "`; yields 0 when there is no meaningful number.")]
            #[must_use]
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            pub fn $name(&self) -> $ty {
                match self.scalar() {
                    Some(Scalar::Int(i)) => i as $ty,
                    Some(Scalar::Float(f)) => f as $ty,
                    None => 0,
                }
            }
        )*
    };
}

impl Value {
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Null => ValueType::Null,
            Self::Undefined => ValueType::Undefined,
            Self::Bool(_) => ValueType::Bool,
            Self::Int8(_) => ValueType::Int8,
            Self::Int16(_) => ValueType::Int16,
            Self::Int32(_) => ValueType::Int32,
            Self::Int64(_) => ValueType::Int64,
            Self::UInt8(_) => ValueType::UInt8,
            Self::UInt16(_) => ValueType::UInt16,
            Self::UInt32(_) => ValueType::UInt32,
            Self::UInt64(_) => ValueType::UInt64,
            Self::Numeric(_) => ValueType::Numeric,
            Self::Double(_) => ValueType::Double,
            Self::String(_) => ValueType::String,
            Self::Map(_) => ValueType::Map,
            Self::ByteArray(_) => ValueType::ByteArray,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    #[must_use]
    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Bool(_))
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.value_type().is_numeric()
    }

    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    #[must_use]
    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    /// Whether this is a map flagged as an array.
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Map(m) if m.is_array())
    }

    #[must_use]
    pub fn is_byte_array(&self) -> bool {
        matches!(self, Self::ByteArray(_))
    }

    /// Sets or clears the array flag. Setting it on a non-map replaces the
    /// value with an empty array.
    pub fn set_array(&mut self, array: bool) {
        match self {
            Self::Map(m) => m.set_array(array),
            _ if array => *self = Self::Map(Map::new_array()),
            _ => {}
        }
    }

    /// Converts between a string and a byte array. Returns whether the value
    /// now has the requested form; bytes that are not UTF-8 stay bytes.
    pub fn set_byte_array(&mut self, bytes: bool) -> bool {
        match (core::mem::take(self), bytes) {
            (Self::String(s), true) => *self = Self::ByteArray(s.into_bytes()),
            (Self::ByteArray(b), false) => {
                *self = match String::from_utf8(b) {
                    Ok(s) => Self::String(s),
                    Err(e) => Self::ByteArray(e.into_bytes()),
                }
            }
            (other, _) => *self = other,
        }
        self.is_byte_array() == bytes
    }

    /// Releases the payload and makes the value `Undefined`.
    pub fn reset(&mut self) {
        *self = Self::Undefined;
    }

    pub fn reset_to_null(&mut self) {
        *self = Self::Null;
    }

    // --------------------------------------------------------------------
    // Permissive coercions
    // --------------------------------------------------------------------

    #[allow(clippy::cast_precision_loss)]
    fn scalar(&self) -> Option<Scalar> {
        Some(match self {
            Self::Bool(b) => Scalar::Int(i128::from(*b)),
            Self::Int8(v) => Scalar::Int(i128::from(*v)),
            Self::Int16(v) => Scalar::Int(i128::from(*v)),
            Self::Int32(v) => Scalar::Int(i128::from(*v)),
            Self::Int64(v) => Scalar::Int(i128::from(*v)),
            Self::UInt8(v) => Scalar::Int(i128::from(*v)),
            Self::UInt16(v) => Scalar::Int(i128::from(*v)),
            Self::UInt32(v) => Scalar::Int(i128::from(*v)),
            Self::UInt64(v) => Scalar::Int(i128::from(*v)),
            Self::Numeric(f) | Self::Double(f) => Scalar::Float(*f),
            Self::String(s) => return parse_scalar(s),
            Self::Null | Self::Undefined | Self::Map(_) | Self::ByteArray(_) => return None,
        })
    }

    coercions! {
        get_as_u8 -> u8,
        get_as_u16 -> u16,
        get_as_u32 -> u32,
        get_as_u64 -> u64,
        get_as_i8 -> i8,
        get_as_i16 -> i16,
        get_as_i32 -> i32,
        get_as_i64 -> i64,
    }

    /// Best-effort conversion to `f64`; yields 0.0 when there is no
    /// meaningful number.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn get_as_f64(&self) -> f64 {
        match self.scalar() {
            Some(Scalar::Int(i)) => i as f64,
            Some(Scalar::Float(f)) => f,
            None => 0.0,
        }
    }

    /// Best-effort truthiness: non-zero numbers, `"true"`, and numeric
    /// strings that are non-zero are `true`.
    #[must_use]
    pub fn get_as_bool(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::String(s) if s.trim().eq_ignore_ascii_case("true") => true,
            _ => match self.scalar() {
                Some(Scalar::Int(i)) => i != 0,
                Some(Scalar::Float(f)) => f != 0.0,
                None => false,
            },
        }
    }

    /// Best-effort textual form. Strings are returned as-is, scalars in their
    /// JSON spelling, byte arrays decoded lossily; everything else is empty.
    #[must_use]
    pub fn get_as_string(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::ByteArray(b) => String::from_utf8_lossy(b).into_owned(),
            Self::Null | Self::Undefined | Self::Map(_) => String::new(),
            scalar => scalar.to_json(),
        }
    }

    // --------------------------------------------------------------------
    // Strict accessors
    // --------------------------------------------------------------------

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Any integer tag whose value fits in `i64`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self.scalar()? {
            Scalar::Int(i) if !self.is_string() && !self.is_bool() => i64::try_from(i).ok(),
            _ => None,
        }
    }

    /// Any integer tag whose value fits in `u64`.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self.scalar()? {
            Scalar::Int(i) if !self.is_string() && !self.is_bool() => u64::try_from(i).ok(),
            _ => None,
        }
    }

    /// Any numeric tag, widened to `f64`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        if self.is_numeric() {
            Some(self.get_as_f64())
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::ByteArray(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut Map> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    // --------------------------------------------------------------------
    // Map operations
    // --------------------------------------------------------------------

    /// Makes this value a map (an array map if `array`) unless it already is
    /// one, and returns it.
    fn ensure_map(&mut self, array: bool) -> &mut Map {
        loop {
            match self {
                Self::Map(m) => return m,
                _ => *self = Self::Map(if array { Map::new_array() } else { Map::new() }),
            }
        }
    }

    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.as_map().is_some_and(|m| m.contains_key(key))
    }

    pub fn remove_key(&mut self, key: &str) -> Option<Value> {
        self.as_map_mut()?.remove(key)
    }

    /// See [`Map::remove_at`].
    pub fn remove_at(&mut self, index: usize) -> Option<Value> {
        self.as_map_mut()?.remove_at(index)
    }

    /// Number of map entries; 0 for anything that is not a map.
    #[must_use]
    pub fn map_size(&self) -> usize {
        self.as_map().map_or(0, Map::len)
    }

    /// Length of the contiguous array prefix; 0 for anything that is not a map.
    #[must_use]
    pub fn map_dense_size(&self) -> usize {
        self.as_map().map_or(0, Map::dense_len)
    }

    /// Appends at the next dense index, turning a non-map into an empty array
    /// first.
    pub fn push_to_array(&mut self, value: Value) {
        self.ensure_map(true).push(value);
    }

    /// Children in insertion order; empty for anything that is not a map.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.as_map()
            .into_iter()
            .flat_map(Map::iter)
            .map(|(k, v)| (k.as_str(), v))
    }
}

impl PartialEq<ValueType> for Value {
    fn eq(&self, other: &ValueType) -> bool {
        self.value_type() == *other
    }
}

impl Index<&str> for Value {
    type Output = Value;

    /// Returns the child under `key`, or `Undefined` if there is none.
    fn index(&self, key: &str) -> &Value {
        self.as_map().and_then(|m| m.get(key)).unwrap_or(&UNDEFINED)
    }
}

impl Index<usize> for Value {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        self.as_map().and_then(|m| m.get_index(index)).unwrap_or(&UNDEFINED)
    }
}

impl IndexMut<&str> for Value {
    /// Looks up or creates the child under `key`, turning a non-map receiver
    /// into an empty map first.
    fn index_mut(&mut self, key: &str) -> &mut Value {
        self.ensure_map(false).entry_or_undefined(key)
    }
}

impl IndexMut<usize> for Value {
    /// Looks up or creates the element at `index`, turning a non-map receiver
    /// into an empty array first.
    fn index_mut(&mut self, index: usize) -> &mut Value {
        self.ensure_map(true).entry_or_undefined(&index.to_string())
    }
}

macro_rules! strict_int {
    ($( $ty:ty => $via:ident ),* $(,)?) => {
        $(
            impl TryFrom<&Value> for $ty {
                type Error = Error;

                fn try_from(value: &Value) -> Result<Self, Error> {
                    value
                        .$via()
                        .and_then(|v| <$ty>::try_from(v).ok())
                        .ok_or(Error::TypeMismatch {
                            expected: stringify!($ty),
                            found: value.value_type(),
                        })
                }
            }
        )*
    };
}

strict_int! {
    i8 => as_i64,
    i16 => as_i64,
    i32 => as_i64,
    i64 => as_i64,
    u8 => as_u64,
    u16 => as_u64,
    u32 => as_u64,
    u64 => as_u64,
}

impl TryFrom<&Value> for f64 {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self, Error> {
        value.as_f64().ok_or(Error::TypeMismatch {
            expected: "f64",
            found: value.value_type(),
        })
    }
}

impl TryFrom<&Value> for bool {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self, Error> {
        value.as_bool().ok_or(Error::TypeMismatch {
            expected: "bool",
            found: value.value_type(),
        })
    }
}

impl TryFrom<&Value> for String {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self, Error> {
        value.as_str().map(str::to_owned).ok_or(Error::TypeMismatch {
            expected: "string",
            found: value.value_type(),
        })
    }
}

impl fmt::Display for Value {
    /// Compact JSON.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::json::write_value(self, f, false, 0)
    }
}

impl FromStr for Value {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, ParseError> {
        Self::from_json(s)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{Value, ValueType};
    use crate::{Error, Map};

    #[test]
    fn tags_round_trip() {
        for tag in 0..16u8 {
            assert_eq!(ValueType::from_tag(tag).map(ValueType::tag), Some(tag));
        }
        assert_eq!(ValueType::from_tag(16), None);
        assert_eq!(ValueType::Map.to_string(), "map");
    }

    #[test]
    fn default_is_undefined() {
        let v = Value::default();
        assert!(v.is_undefined());
        assert_eq!(v, ValueType::Undefined);
    }

    #[test]
    fn index_mut_materializes_children() {
        let mut v = Value::from(5i32);
        v["a"]["b"] = Value::from(true);
        assert!(v.is_map());
        assert!(!v.is_array());
        assert_eq!(v["a"]["b"], Value::Bool(true));
        assert!(v["a"]["missing"].is_undefined());
        assert_eq!(v.map_size(), 1);
    }

    #[test]
    fn positional_index_builds_an_array() {
        let mut v = Value::Null;
        v[0] = "zero".into();
        v[1] = "one".into();
        assert!(v.is_array());
        assert_eq!(v.map_dense_size(), 2);
        assert_eq!(v[1], Value::from("one"));
        assert_eq!(v[7], Value::Undefined);
    }

    #[test]
    fn push_remove_and_sizes() {
        let mut v = Value::default();
        for i in 0..4u16 {
            v.push_to_array(i.into());
        }
        v["label"] = "tail".into();
        assert_eq!(v.map_size(), 5);
        assert_eq!(v.map_dense_size(), 4);
        assert_eq!(v.remove_at(0), Some(Value::UInt16(0)));
        assert_eq!(v.map_dense_size(), 3);
        assert_eq!(v[0], Value::UInt16(1));
        assert!(v.has_key("label"));
        assert_eq!(v.remove_key("label"), Some(Value::from("tail")));
        assert!(!v.has_key("label"));
        assert_eq!(Value::Null.remove_key("x"), None);
    }

    #[test]
    fn scalars_become_containers_on_write() {
        let mut v = Value::from(3.5);
        v.push_to_array("x".into());
        assert!(v.is_array());
        assert_eq!(v.map_dense_size(), 1);

        let mut v = Value::Bool(true);
        v["k"] = 1u8.into();
        assert!(v.is_map());
        assert!(!v.is_array());
        assert_eq!(v["k"], Value::UInt8(1));

        v.push_to_array(2u8.into());
        assert_eq!(v.map_size(), 2);
        assert_eq!(v[0], Value::UInt8(2));
    }

    #[rstest]
    #[case(Value::Int8(-3), -3, 253)]
    #[case(Value::UInt64(300), 300, 44)]
    #[case(Value::Double(7.9), 7, 7)]
    #[case(Value::Bool(true), 1, 1)]
    #[case(Value::from(" 42 "), 42, 42)]
    #[case(Value::from("2.5"), 2, 2)]
    #[case(Value::from("nope"), 0, 0)]
    #[case(Value::Map(Map::new()), 0, 0)]
    #[case(Value::Null, 0, 0)]
    fn permissive_integer_coercions(#[case] v: Value, #[case] as_i32: i32, #[case] as_u8: u8) {
        assert_eq!(v.get_as_i32(), as_i32);
        assert_eq!(v.get_as_u8(), as_u8);
    }

    #[test]
    fn permissive_string_and_bool_coercions() {
        assert_eq!(Value::Int32(-7).get_as_string(), "-7");
        assert_eq!(Value::Double(0.5).get_as_string(), "0.5");
        assert_eq!(Value::Bool(false).get_as_string(), "false");
        assert_eq!(Value::Map(Map::new()).get_as_string(), "");
        assert!(Value::from("TRUE").get_as_bool());
        assert!(Value::from("3").get_as_bool());
        assert!(!Value::from("0").get_as_bool());
        assert!(!Value::Undefined.get_as_bool());
        assert!((Value::UInt32(9).get_as_f64() - 9.0).abs() < f64::EPSILON);
    }

    #[test]
    fn strict_accessors_reject_other_types() {
        assert_eq!(i32::try_from(&Value::Int64(12)).unwrap(), 12);
        assert_eq!(u8::try_from(&Value::Int8(5)).unwrap(), 5);
        assert!(matches!(
            u8::try_from(&Value::Int16(-1)),
            Err(Error::TypeMismatch { expected: "u8", found: ValueType::Int16 })
        ));
        assert!(matches!(
            i64::try_from(&Value::from("12")),
            Err(Error::TypeMismatch { found: ValueType::String, .. })
        ));
        assert_eq!(String::try_from(&Value::from("s")).unwrap(), "s");
        assert!(bool::try_from(&Value::UInt8(1)).is_err());
        assert!(f64::try_from(&Value::Null).is_err());
        assert_eq!(Value::Numeric(2.0).as_i64(), None);
    }

    #[test]
    fn byte_array_conversion() {
        let mut v = Value::from("hi");
        assert!(v.set_byte_array(true));
        assert_eq!(v.as_bytes(), Some(&b"hi"[..]));
        assert!(v.set_byte_array(false));
        assert_eq!(v.as_str(), Some("hi"));

        let mut raw = Value::from(vec![0xFFu8, 0xFE]);
        assert!(!raw.set_byte_array(false));
        assert!(raw.is_byte_array());
    }

    #[test]
    fn clones_are_deep() {
        let mut original = Value::default();
        original["list"].push_to_array("a".into());
        let mut copy = original.clone();
        copy["list"].push_to_array("b".into());
        assert_eq!(original["list"].map_size(), 1);
        assert_eq!(copy["list"].map_size(), 2);
    }

    #[test]
    fn equality_is_tag_strict() {
        assert_ne!(Value::Int32(1), Value::Int64(1));
        assert_ne!(Value::Numeric(1.0), Value::Double(1.0));
        assert_eq!(Value::from(vec![Value::Null]), Value::from(vec![Value::Null]));
    }

    #[test]
    fn set_array_and_reset() {
        let mut v = Value::from(1u8);
        v.set_array(false);
        assert_eq!(v, Value::UInt8(1));
        v.set_array(true);
        assert!(v.is_array());
        v.reset_to_null();
        assert!(v.is_null());
        v.reset();
        assert!(v.is_undefined());
    }
}
