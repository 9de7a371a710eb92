#![no_main]
use iodict::{BinaryOptions, ByteBuffer, binary};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut input = ByteBuffer::from(data);
    let options = BinaryOptions { max_depth: 64 };

    match binary::decode_value(&mut input, &options) {
        Ok(value) => {
            let mut first = ByteBuffer::new();
            binary::encode_value(&value, &mut first).unwrap();
            // Duplicate keys collapse on decode and NaN never equals itself, so
            // compare encodings rather than trees.
            let again = binary::decode_value(&mut first.clone(), &options).unwrap();
            let mut second = ByteBuffer::new();
            binary::encode_value(&again, &mut second).unwrap();
            assert_eq!(first.as_slice(), second.as_slice());
        }
        Err(_) => assert_eq!(input.consumed(), 0),
    }
});
