use quickcheck::{Arbitrary, Gen};

use crate::{Map, Value};

#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct FiniteFloat(pub f64);

impl Arbitrary for FiniteFloat {
    fn arbitrary(g: &mut Gen) -> Self {
        let mut value = f64::arbitrary(g);
        while !value.is_finite() {
            value = f64::arbitrary(g);
        }

        Self(value)
    }
}

fn gen_map(g: &mut Gen, depth: usize, leaf: fn(&mut Gen, usize) -> Value) -> Value {
    let len = usize::arbitrary(g) % 4;
    if bool::arbitrary(g) {
        Value::from((0..len).map(|_| leaf(g, depth - 1)).collect::<Vec<_>>())
    } else {
        let mut map = Map::new();
        for _ in 0..len {
            map.insert(String::arbitrary(g), leaf(g, depth - 1));
        }
        Value::Map(map)
    }
}

/// Any tree, using every tag.
impl Arbitrary for Value {
    fn arbitrary(g: &mut Gen) -> Self {
        fn gen_val(g: &mut Gen, depth: usize) -> Value {
            let choices = if depth == 0 { 15 } else { 17 };
            match usize::arbitrary(g) % choices {
                0 => Value::Null,
                1 => Value::Undefined,
                2 => Value::Bool(bool::arbitrary(g)),
                3 => Value::Int8(i8::arbitrary(g)),
                4 => Value::Int16(i16::arbitrary(g)),
                5 => Value::Int32(i32::arbitrary(g)),
                6 => Value::Int64(i64::arbitrary(g)),
                7 => Value::UInt8(u8::arbitrary(g)),
                8 => Value::UInt16(u16::arbitrary(g)),
                9 => Value::UInt32(u32::arbitrary(g)),
                10 => Value::UInt64(u64::arbitrary(g)),
                11 => Value::Numeric(FiniteFloat::arbitrary(g).0),
                12 => Value::Double(FiniteFloat::arbitrary(g).0),
                13 => Value::String(String::arbitrary(g)),
                14 => Value::ByteArray(Vec::arbitrary(g)),
                _ => gen_map(g, depth, gen_val),
            }
        }

        let depth = usize::arbitrary(g) % 3;
        gen_val(g, depth)
    }
}

/// A tree that only uses the tags JSON text reads back: `Null`, `Bool`,
/// `Numeric`, `String` and maps.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct JsonNative(pub Value);

impl Arbitrary for JsonNative {
    fn arbitrary(g: &mut Gen) -> Self {
        fn gen_val(g: &mut Gen, depth: usize) -> Value {
            let choices = if depth == 0 { 4 } else { 6 };
            match usize::arbitrary(g) % choices {
                0 => Value::Null,
                1 => Value::Bool(bool::arbitrary(g)),
                2 => Value::Numeric(FiniteFloat::arbitrary(g).0),
                3 => Value::String(String::arbitrary(g)),
                _ => gen_map(g, depth, gen_val),
            }
        }

        let depth = usize::arbitrary(g) % 3;
        Self(gen_val(g, depth))
    }
}
