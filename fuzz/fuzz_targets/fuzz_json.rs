#![no_main]
use arbitrary::Arbitrary;
use iodict::{JsonOptions, Value, json};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    text: &'a str,
    unicode_whitespace: bool,
}

fuzz_target!(|input: Input<'_>| {
    let options = JsonOptions {
        allow_unicode_whitespace: input.unicode_whitespace,
        ..Default::default()
    };
    let ours = json::from_str_with_options(input.text, options);

    // Anything serde_json accepts (within its own recursion limit) we accept too.
    if serde_json::from_str::<serde_json::Value>(input.text).is_ok() {
        assert!(ours.is_ok(), "rejected valid JSON {:?}: {:?}", input.text, ours);
    }

    if let Ok(value) = ours {
        let compact = value.to_json();
        assert_eq!(Value::from_json(&compact).as_ref(), Ok(&value), "{compact}");
        let pretty = value.to_json_pretty();
        assert_eq!(Value::from_json(&pretty).as_ref(), Ok(&value), "{pretty}");
    }
});
