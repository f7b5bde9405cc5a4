//! Property tests for values, calls and text round trips.

use dynreflect::{INLINE_CAPACITY, Registry, Value, fits_inline, handlers::Hex};
use proptest::prelude::*;

fn registry() -> Registry {
    Registry::builder()
        .with_primitives()
        .register_type_named::<Vec<u8>>("bytes")
        .function("sum", |a: i32, b: i32| a.wrapping_add(b))
        .function("append", |bytes: &mut Vec<u8>, byte: u8| bytes.push(byte))
        .serializer::<u64, Hex>("hex")
        .build()
}

proptest! {
    /// Values keep their payload through clones and moves, and only
    /// oversized payloads leave the inline buffer.
    #[test]
    fn prop_value_keeps_payload(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let mut value = Value::new(bytes.clone());
        prop_assert!(!value.is_heap());
        let copy = value.clone();
        prop_assert_eq!(copy.downcast_ref::<Vec<u8>>(), Some(&bytes));

        let moved = value.take();
        prop_assert!(!value.has_value());
        prop_assert_eq!(moved.downcast::<Vec<u8>>().ok(), Some(bytes));
    }

    #[test]
    fn prop_arrays_follow_inline_capacity(fill in any::<u8>()) {
        prop_assert!(!Value::new([fill; INLINE_CAPACITY]).is_heap());
        prop_assert!(Value::new([fill; INLINE_CAPACITY + 1]).is_heap());
        prop_assert!(fits_inline::<[u8; INLINE_CAPACITY]>());
    }

    #[test]
    fn prop_checked_calls_match_native(a in any::<i32>(), b in any::<i32>()) {
        let registry = registry();
        let mut args = [registry.wrap(a), registry.wrap(b)];
        let sum = registry.call_function("sum", &mut args).unwrap();
        prop_assert_eq!(sum.downcast::<i32>().ok(), Some(a.wrapping_add(b)));
    }

    /// An out-parameter observes exactly the writes the native call makes.
    #[test]
    fn prop_out_parameter_matches_native(
        mut bytes in proptest::collection::vec(any::<u8>(), 0..16),
        byte in any::<u8>(),
    ) {
        let registry = registry();
        let mut args = [registry.wrap(bytes.clone()), registry.wrap(byte)];
        registry.call_function("append", &mut args).unwrap();
        bytes.push(byte);
        prop_assert_eq!(args[0].downcast_ref::<Vec<u8>>(), Some(&bytes));
    }

    #[test]
    fn prop_integers_round_trip(number in any::<i64>()) {
        let registry = registry();
        let ty = registry.type_index_of::<i64>().unwrap();
        let text = registry.wrap(number).serialize("default").unwrap();
        let parsed = registry.deserialize(ty, "default", &text).unwrap();
        prop_assert_eq!(parsed.downcast_ref::<i64>(), Some(&number));
    }

    /// Single characters come back unchanged, whitespace included.
    #[test]
    fn prop_chars_round_trip(character in any::<char>()) {
        let registry = registry();
        let ty = registry.type_index_of::<char>().unwrap();
        let text = registry.wrap(character).serialize("default").unwrap();
        prop_assert_eq!(text.chars().count(), 1);
        let parsed = registry.deserialize(ty, "default", &text).unwrap();
        prop_assert_eq!(parsed.downcast_ref::<char>(), Some(&character));
    }

    #[test]
    fn prop_hex_round_trip(number in any::<u64>()) {
        let registry = registry();
        let ty = registry.type_index_of::<u64>().unwrap();
        let text = registry.wrap(number).serialize("hex").unwrap();
        prop_assert!(text.starts_with("0x"));
        let parsed = registry.deserialize(ty, "hex", &text).unwrap();
        prop_assert_eq!(parsed.downcast_ref::<u64>(), Some(&number));
        let parsed = registry.deserialize(ty, "hex", &text[2..]).unwrap();
        prop_assert_eq!(parsed.downcast_ref::<u64>(), Some(&number));
    }

    #[test]
    fn prop_floats_round_trip(number in proptest::num::f64::NORMAL) {
        let registry = registry();
        let ty = registry.type_index_of::<f64>().unwrap();
        let text = registry.wrap(number).to_string();
        let parsed = registry.deserialize(ty, "default", &text).unwrap();
        prop_assert_eq!(parsed.downcast_ref::<f64>(), Some(&number));
    }

    /// Strings are stored verbatim, surrounding whitespace included.
    #[test]
    fn prop_strings_round_trip(text in ".*") {
        let registry = registry();
        let ty = registry.type_index_of::<String>().unwrap();
        let rendered = registry.wrap(text.clone()).serialize("default").unwrap();
        prop_assert_eq!(&rendered, &text);
        let parsed = registry.deserialize(ty, "default", &rendered).unwrap();
        prop_assert_eq!(parsed.downcast_ref::<String>(), Some(&text));
    }
}
