use quickcheck::QuickCheck;
use quickcheck_macros::quickcheck;

use super::arbitrary::JsonNative;
use crate::{ByteBuffer, Value};

fn tests() -> u64 {
    if is_ci::cached() { 10_000 } else { 1_000 }
}

/// Property: every tree survives the binary codec unchanged, and decoding
/// consumes exactly what encoding produced.
#[test]
fn binary_roundtrip_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(value: Value, prefix: Vec<u8>) -> bool {
        let mut buf = ByteBuffer::new();
        buf.store_bytes(&prefix).unwrap();
        buf.skip(prefix.len()).unwrap();
        value.to_binary(&mut buf).unwrap();
        let written = buf.available();
        let back = Value::from_binary(&mut buf).unwrap();
        back == value && !buf.has_bytes_to_read() && written > 0
    }

    QuickCheck::new()
        .tests(tests())
        .quickcheck(prop as fn(Value, Vec<u8>) -> bool);
}

/// Property: trees built only from JSON-native tags survive JSON text, both
/// compact and pretty-printed.
#[test]
fn json_roundtrip_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(value: JsonNative) -> bool {
        let compact = Value::from_json(&value.0.to_json());
        let pretty = Value::from_json(&value.0.to_json_pretty());
        compact.as_ref() == Ok(&value.0) && pretty.as_ref() == Ok(&value.0)
    }

    QuickCheck::new()
        .tests(tests())
        .quickcheck(prop as fn(JsonNative) -> bool);
}

/// `serde_json` without `float_roundtrip` may land one ulp away.
fn close(a: f64, b: f64) -> bool {
    let diff = (a - b).abs();
    diff <= a.abs().max(b.abs()) * 1e-14 || diff < f64::MIN_POSITIVE
}

fn same_shape(theirs: &serde_json::Value, ours: &Value) -> bool {
    match (theirs, ours) {
        (serde_json::Value::Null, v) => v.is_null(),
        (serde_json::Value::Bool(a), Value::Bool(b)) => a == b,
        (serde_json::Value::Number(a), v) => match (a.as_f64(), v.as_f64()) {
            (Some(a), Some(b)) => close(a, b),
            _ => false,
        },
        (serde_json::Value::String(a), Value::String(b)) => a == b,
        (serde_json::Value::Array(items), v) => {
            v.is_array()
                && v.map_size() == items.len()
                && items.iter().enumerate().all(|(i, item)| same_shape(item, &v[i]))
        }
        (serde_json::Value::Object(entries), Value::Map(map)) => {
            !map.is_array()
                && map.len() == entries.len()
                && entries.iter().all(|(k, item)| map.get(k).is_some_and(|v| same_shape(item, v)))
        }
        _ => false,
    }
}

/// Property: `serde_json` accepts the JSON text we write and reads the same
/// structure from it as we do.
#[quickcheck]
fn json_output_agrees_with_serde_json(value: Value) -> bool {
    let text = value.to_json();
    let Ok(theirs) = serde_json::from_str::<serde_json::Value>(&text) else {
        return false;
    };
    Value::from_json(&text).is_ok_and(|ours| same_shape(&theirs, &ours))
}

/// Pushing `n` elements always yields a JSON array that reads back as a dense
/// array of `n` elements.
#[quickcheck]
fn pushed_elements_read_back_as_dense_array(n: u8) -> bool {
    let mut v = Value::from(Vec::<Value>::new());
    for i in 0..n {
        v.push_to_array(Value::UInt8(i));
    }
    let text = v.to_json();
    let back = Value::from_json(&text).unwrap();
    text.starts_with('[') && back.is_array() && back.map_dense_size() == usize::from(n)
}
