// `Serialize`/`Deserialize` for `Value`, compiled for tests and behind the
// optional `serde` feature so that normal builds carry no serde dependency.
//
// Serializing keeps integer widths and writes dense arrays as sequences, byte
// arrays as bytes and `Null`/`Undefined` as unit. Deserializing picks the
// widest tag of each kind: signed integers become `Int64`, unsigned ones
// `UInt64` and floats `Double`.
use core::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, SeqAccess, Visitor},
    ser::{SerializeMap, SerializeSeq},
};

use crate::{Map, Value};

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null | Value::Undefined => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int8(v) => serializer.serialize_i8(*v),
            Value::Int16(v) => serializer.serialize_i16(*v),
            Value::Int32(v) => serializer.serialize_i32(*v),
            Value::Int64(v) => serializer.serialize_i64(*v),
            Value::UInt8(v) => serializer.serialize_u8(*v),
            Value::UInt16(v) => serializer.serialize_u16(*v),
            Value::UInt32(v) => serializer.serialize_u32(*v),
            Value::UInt64(v) => serializer.serialize_u64(*v),
            Value::Numeric(f) | Value::Double(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::ByteArray(bytes) => serializer.serialize_bytes(bytes),
            Value::Map(map) => map.serialize(serializer),
        }
    }
}

impl Serialize for Map {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_array() && self.is_dense() {
            let mut seq = serializer.serialize_seq(Some(self.len()))?;
            for item in self.array_values() {
                seq.serialize_element(item)?;
            }
            seq.end()
        } else {
            let mut map = serializer.serialize_map(Some(self.len()))?;
            for (key, value) in self {
                map.serialize_entry(key, value)?;
            }
            map.end()
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any self-describing value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Int64(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Value, E> {
        Ok(Value::UInt64(v))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Double(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_string<E>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_bytes<E>(self, v: &[u8]) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Value, E> {
        Ok(Value::ByteArray(v))
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<Value>()? {
            items.push(item);
        }
        Ok(Value::from(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut map = Map::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            map.insert(key, value);
        }
        Ok(Value::Map(map))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Map, Value};

    #[test]
    fn serializes_like_the_json_writer() {
        let mut v = Value::default();
        v["name"] = "probe".into();
        v["small"] = Value::Int8(-4);
        v["big"] = Value::UInt64(u64::MAX);
        v["ratio"] = Value::Double(0.25);
        v["tags"].push_to_array("a".into());
        v["tags"].push_to_array(Value::Undefined);
        v["raw"] = vec![1u8, 2].into();
        v["empty"] = Value::Map(Map::new());

        assert_eq!(serde_json::to_string(&v).unwrap(), v.to_json());
    }

    #[test]
    fn sparse_arrays_serialize_as_maps() {
        let mut v = Value::default();
        v.push_to_array(true.into());
        v["3"] = false.into();
        assert_eq!(serde_json::to_string(&v).unwrap(), r#"{"0":true,"3":false}"#);
    }

    #[test]
    fn deserializes_with_widest_tags() {
        let v: Value = serde_json::from_str(r#"{"a":1,"b":[true,null,"x"],"c":-2,"d":1.5}"#).unwrap();
        assert_eq!(v["a"], Value::UInt64(1));
        assert_eq!(v["c"], Value::Int64(-2));
        assert_eq!(v["d"], Value::Double(1.5));
        assert!(v["b"].is_array());
        assert_eq!(v["b"].map_dense_size(), 3);
        assert_eq!(v["b"][1], Value::Null);
        assert_eq!(v["b"][2], Value::from("x"));
        let keys: Vec<&str> = v.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a", "b", "c", "d"]);
    }
}
