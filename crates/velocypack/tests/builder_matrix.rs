use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use velocypack::{BuildValue, Builder, BuilderOptions, ErrorKind, Slice, VPackError, ValueType};

const LOREM: &str = "Lorem ipsum dolor sit amet, consectetuer adipiscing elit. Aenean commodo ligula eget dolor. Aenean massa. Cum sociis natoque penatibus et magnis dis parturient montes, nascetur ridiculus mus. Donec quam felis, ultricies nec, pellentesque eu, pretium quis, sem. Nulla consequat massa quis enim. Donec pede justo, fringilla vel, aliquet nec, vulputate eget, arcu. In enim justo, rhoncus ut, imperdiet a, venenatis vitae, justo. Nullam dictum felis eu pede mollis pretium. Integer tincidunt. Cras dapibus. Vivamus elementum semper nisi. Aenean vulputate eleifend tellus.";

fn encode<'v>(value: impl Into<BuildValue<'v>>) -> Vec<u8> {
    let mut builder = Builder::new();
    builder.add(value).unwrap();
    builder.finish().unwrap().to_vec()
}

#[test]
fn scalar_wire_matrix() {
    assert_eq!(encode(BuildValue::Null), [0x18]);
    assert_eq!(encode(true), [0x1a]);
    assert_eq!(encode(false), [0x19]);
    assert_eq!(encode(BuildValue::MinKey), [0x1e]);
    assert_eq!(encode(BuildValue::MaxKey), [0x1f]);

    let double = encode(1.5f64);
    assert_eq!(double[0], 0x1b);
    assert_eq!(&double[1..], &1.5f64.to_le_bytes());

    assert_eq!(encode(""), [0x40]);
    assert_eq!(encode("abc"), [0x43, b'a', b'b', b'c']);
    assert_eq!(encode("x".repeat(126).as_str())[0], 0xbe);
    let long = encode("x".repeat(127).as_str());
    assert_eq!(long[0], 0xbf);
    assert_eq!(&long[1..9], &127u64.to_le_bytes());
    assert_eq!(long.len(), 1 + 8 + 127);
}

#[test]
fn integer_wire_matrix() {
    let cases: Vec<(BuildValue<'static>, Vec<u8>)> = vec![
        (0i32.into(), vec![0x30]),
        (9i32.into(), vec![0x39]),
        (10i32.into(), vec![0x20, 0x0a]),
        (10u32.into(), vec![0x28, 0x0a]),
        ((-1i32).into(), vec![0x3f]),
        ((-6i32).into(), vec![0x3a]),
        ((-7i32).into(), vec![0x20, 0xf9]),
        (300i64.into(), vec![0x21, 0x2c, 0x01]),
        (i32::MAX.into(), vec![0x23, 0xff, 0xff, 0xff, 0x7f]),
        (
            i64::MIN.into(),
            vec![0x27, 0, 0, 0, 0, 0, 0, 0, 0x80],
        ),
        (
            u64::MAX.into(),
            vec![0x2f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff],
        ),
    ];
    for (value, expected) in cases {
        assert_eq!(encode(value), expected, "value {value:?}");
    }
}

#[test]
fn integer_roundtrip_matrix() {
    for value in [0i64, 9, -6, 10, -7, 127, -128, 255, 65_535, i32::MAX as i64, i64::MIN, i64::MAX] {
        let bytes = encode(value);
        let vpack = velocypack::VPack::from_bytes(bytes);
        assert_eq!(vpack.slice().as_i64(), Ok(value), "value {value}");
    }
    let vpack = velocypack::VPack::from_bytes(encode(u64::MAX));
    assert_eq!(vpack.slice().as_u64(), Ok(u64::MAX));
    assert_eq!(vpack.slice().as_i64().map_err(|e| e.kind()), Err(ErrorKind::TypeMismatch));
}

#[test]
fn fixed_width_integers_when_compaction_is_off() {
    let mut builder =
        Builder::new().with_options(BuilderOptions::default().compact_integers(false));
    builder.add(1i32).unwrap();
    assert_eq!(builder.as_bytes(), [0x23, 0x01, 0x00, 0x00, 0x00]);
    assert_eq!(builder.slice().as_i32(), Ok(1));
}

#[test]
fn binary_value() {
    let expected: [u8; 9] = [49, 50, 51, 52, 53, 54, 55, 56, 57];
    let mut builder = Builder::new();
    builder.add(&expected[..]).unwrap();
    let slice = builder.slice();
    assert!(slice.is_binary());
    assert_eq!(slice.binary_length(), Ok(9));
    assert_eq!(slice.as_binary(), Ok(&expected[..]));
    assert_eq!(slice.byte_size(), Ok(1 + 4 + 9));
}

#[test]
fn non_ascii_string() {
    let text = "·ÃÂ";
    let mut builder = Builder::new();
    builder.add(text).unwrap();
    assert_eq!(builder.slice().as_str(), Ok(text));
    assert_eq!(builder.slice().length(), Ok(text.len()));
}

#[test]
fn empty_containers() {
    let mut builder = Builder::new();
    builder.open_array().unwrap();
    builder.close().unwrap();
    let array = builder.finish().unwrap();
    assert_eq!(array.as_bytes(), [0x01]);
    assert_eq!(array.slice().length(), Ok(0));
    assert_eq!(
        array.slice().value_at(0),
        Err(VPackError::IndexOutOfRange { index: 0, length: 0 })
    );

    let mut builder = Builder::new();
    builder.open_object().unwrap();
    builder.close().unwrap();
    let object = builder.finish().unwrap();
    assert_eq!(object.as_bytes(), [0x0a]);
    assert_eq!(object.slice().length(), Ok(0));
    assert!(object.slice().get("missing").unwrap().is_none());
}

#[test]
fn builder_misuse_matrix() {
    let mut builder = Builder::new();
    assert_eq!(builder.add_keyed("a", 1), Err(VPackError::NeedOpenObject));
    assert_eq!(builder.close(), Err(VPackError::NeedOpenCompound));

    builder.open_array().unwrap();
    assert_eq!(builder.add_keyed("a", 1), Err(VPackError::NeedOpenObject));
    assert_eq!(builder.add_key("a"), Err(VPackError::NeedOpenObject));
    builder.close().unwrap();
    assert_eq!(builder.close(), Err(VPackError::NeedOpenCompound));

    let mut builder = Builder::new();
    builder.open_object().unwrap();
    assert_eq!(
        builder.add(1u8),
        Err(VPackError::KeyMustBeString {
            found: ValueType::UInt
        })
    );
    builder.add_key("a").unwrap();
    assert_eq!(builder.add_key("b"), Err(VPackError::KeyAlreadyWritten));
    assert_eq!(builder.close(), Err(VPackError::DanglingKey));
    builder.add(1u8).unwrap();
    builder.close().unwrap();
    assert!(builder.is_closed());

    let mut builder = Builder::new();
    builder.open_array().unwrap();
    builder.open_object().unwrap();
    assert_eq!(
        builder.finish().map(|v| v.to_vec()),
        Err(VPackError::UnclosedCompound { depth: 2 })
    );
}

#[test]
fn failed_add_leaves_builder_usable() {
    let mut builder = Builder::new();
    builder.open_array().unwrap();
    builder.add(1u8).unwrap();
    let before = builder.len();
    assert_eq!(
        builder.add(i128::MAX),
        Err(VPackError::Unsupported("integer wider than 64 bits"))
    );
    assert_eq!(builder.len(), before);
    builder.add(2u8).unwrap();
    builder.close().unwrap();
    let vpack = builder.finish().unwrap();
    assert_eq!(vpack.slice().length(), Ok(2));
    assert_eq!(vpack.slice().value_at(1).and_then(|s| s.as_u8()), Ok(2));
}

#[test]
fn string_as_object_key() {
    let mut builder = Builder::new();
    builder.open_object().unwrap();
    builder.add("name").unwrap();
    builder.add("value").unwrap();
    builder.close().unwrap();
    let vpack = builder.finish().unwrap();
    assert_eq!(vpack.slice().get("name").and_then(|s| s.as_str()), Ok("value"));
}

#[test]
fn array_layout_matrix() {
    // Items of identical size need no index table.
    let mut builder = Builder::new();
    builder.open_array().unwrap();
    for i in 1..=3u8 {
        builder.add(i).unwrap();
    }
    builder.close().unwrap();
    assert_eq!(builder.as_bytes(), [0x02, 0x05, 0x31, 0x32, 0x33]);

    let mut builder = Builder::new();
    builder.open_array().unwrap();
    builder.add(1u8).unwrap();
    builder.add(300u16).unwrap();
    builder.close().unwrap();
    let vpack = builder.finish().unwrap();
    let slice = vpack.slice();
    assert_eq!(slice.head(), 0x06);
    assert_eq!(slice.length(), Ok(2));
    assert_eq!(slice.value_at(0).and_then(|s| s.as_u16()), Ok(1));
    assert_eq!(slice.value_at(1).and_then(|s| s.as_u16()), Ok(300));
}

#[test]
fn compact_array_roundtrip() {
    let mut builder = Builder::new();
    builder.open_compact_array().unwrap();
    for value in [1i64, 16, 3] {
        builder.add(value).unwrap();
    }
    builder.close().unwrap();
    let vpack = builder.finish().unwrap();
    let slice = vpack.slice();
    assert_eq!(slice.head(), 0x13);
    assert!(slice.is_compact());
    assert_eq!(slice.length(), Ok(3));
    let values: Vec<i64> = slice
        .iter_array()
        .unwrap()
        .map(|item| item.as_i64().unwrap())
        .collect();
    assert_eq!(values, [1, 16, 3]);
    assert_eq!(slice.value_at(2).and_then(|s| s.as_i64()), Ok(3));
}

#[test]
fn offset_width_escalates_with_size() {
    let cases = [(100, true, 0x07u8), (100, false, 0x03), (200, true, 0x08), (200, false, 0x04)];
    for (count, numbered, expected) in cases {
        let mut builder = Builder::new();
        builder.open_array().unwrap();
        for i in 0..count {
            if numbered {
                builder.add(format!("{i}{LOREM}").as_str()).unwrap();
            } else {
                builder.add(LOREM).unwrap();
            }
        }
        builder.close().unwrap();
        let vpack = builder.finish().unwrap();
        let slice = vpack.slice();
        assert_eq!(slice.head(), expected, "{count} items, numbered: {numbered}");
        assert!(slice.is_array());
        assert_eq!(slice.length(), Ok(count));
        assert_eq!(slice.byte_size(), Ok(vpack.len()));
        let last = slice.value_at(count - 1).and_then(|s| s.as_str()).unwrap();
        assert!(last.ends_with("tellus."));
        if numbered {
            assert!(last.starts_with(&format!("{}Lorem", count - 1)));
        }
    }
}

#[test]
fn nested_arrays() {
    let mut builder = Builder::new();
    builder.open_array().unwrap();
    for _ in 0..2 {
        builder.open_array().unwrap();
        for _ in 0..2 {
            builder.open_array().unwrap();
            for value in 1..=3i64 {
                builder.add(value).unwrap();
            }
            builder.close().unwrap();
        }
        builder.close().unwrap();
    }
    builder.close().unwrap();
    let vpack = builder.finish().unwrap();
    let outer = vpack.slice();
    assert_eq!(outer.length(), Ok(2));
    for i in 0..2 {
        let middle = outer.value_at(i).unwrap();
        assert!(middle.is_array());
        assert_eq!(middle.length(), Ok(2));
        for j in 0..2 {
            let inner = middle.value_at(j).unwrap();
            assert_eq!(inner.length(), Ok(3));
            for k in 0..3 {
                assert_eq!(inner.value_at(k).and_then(|s| s.as_i64()), Ok(k as i64 + 1));
            }
        }
    }
}

#[test]
fn nested_objects() {
    let mut builder = Builder::new();
    builder.open_object().unwrap();
    builder.add_keyed("a", BuildValue::Object).unwrap();
    builder.add_keyed("b", BuildValue::Object).unwrap();
    builder.add_keyed("c", "leaf").unwrap();
    builder.add_keyed("d", 4u8).unwrap();
    builder.close().unwrap();
    builder.add_keyed("e", true).unwrap();
    builder.close().unwrap();
    builder.add_keyed("f", BuildValue::Null).unwrap();
    builder.close().unwrap();
    let vpack = builder.finish().unwrap();
    let root = vpack.slice();
    assert_eq!(root.length(), Ok(2));
    assert_eq!(root.get("a").and_then(|s| s.length()), Ok(2));
    assert_eq!(root.get_path(&["a", "b", "c"]).and_then(|s| s.as_str()), Ok("leaf"));
    assert_eq!(root.get_path(&["a", "b", "d"]).and_then(|s| s.as_u8()), Ok(4));
    assert_eq!(root.get_path(&["a", "e"]).and_then(|s| s.as_bool()), Ok(true));
    assert!(root.get("f").unwrap().is_null());
    assert!(root.get_path(&["a", "x", "y"]).unwrap().is_none());
    assert!(root.get_path(&["f", "y"]).unwrap().is_none());
}

fn nested_string_objects(size: usize) -> velocypack::VPack {
    let mut builder = Builder::new();
    builder.open_object().unwrap();
    for i in 0..size {
        builder.add_keyed(&i.to_string(), BuildValue::Object).unwrap();
        for j in 0..size {
            builder.add_keyed(&j.to_string(), "test").unwrap();
        }
        builder.close().unwrap();
    }
    builder.close().unwrap();
    builder.finish().unwrap()
}

#[test]
fn object_offset_widths() {
    for (size, head) in [(5usize, 0x0bu8), (10, 0x0c)] {
        let vpack = nested_string_objects(size);
        let root = vpack.slice();
        assert_eq!(root.head(), head, "size {size}");
        assert_eq!(root.length(), Ok(size));
        for i in 0..size {
            let attr = root.get(&i.to_string()).unwrap();
            assert!(attr.is_object());
            for j in 0..size {
                let child = attr.get(&j.to_string()).unwrap();
                assert_eq!(child.as_str(), Ok("test"));
            }
        }
    }
}

#[test]
fn keys_sorted_on_close() {
    let mut builder = Builder::new();
    builder.open_object().unwrap();
    for i in (0..=9).rev() {
        builder.add_keyed(&i.to_string(), "test").unwrap();
    }
    builder.close().unwrap();
    let vpack = builder.finish().unwrap();
    let slice = vpack.slice();
    assert_eq!(slice.length(), Ok(10));
    for i in 0..10 {
        assert_eq!(slice.key_at(i).and_then(|k| k.as_str()), Ok(i.to_string().as_str()));
    }
}

#[test]
fn shuffled_keys_match_string_sort() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut keys: Vec<String> = (0..40).map(|i| format!("key-{i}")).collect();
    keys.push("_key".to_owned());
    keys.push("_id".to_owned());
    keys.shuffle(&mut rng);

    let mut builder = Builder::new();
    builder.open_object().unwrap();
    for (position, key) in keys.iter().enumerate() {
        builder.add_keyed(key, position as u64).unwrap();
    }
    builder.close().unwrap();
    let vpack = builder.finish().unwrap();
    let slice = vpack.slice();

    let mut sorted = keys.clone();
    sorted.sort();
    let actual: Vec<&str> = (0..sorted.len())
        .map(|i| slice.key_at(i).and_then(|k| k.as_str()).unwrap())
        .collect();
    assert_eq!(actual, sorted);
    for (position, key) in keys.iter().enumerate() {
        assert_eq!(slice.get(key).and_then(|v| v.as_u64()), Ok(position as u64));
    }
}

#[test]
fn translated_key_is_smaller() {
    let build = |key: &str| {
        let mut builder = Builder::new();
        builder.open_object().unwrap();
        builder.add_keyed(key, "a").unwrap();
        builder.close().unwrap();
        builder.finish().unwrap()
    };
    let translated = build("_key");
    let plain = build("_kay");
    assert!(translated.byte_size().unwrap() < plain.byte_size().unwrap());
    assert_eq!(translated.slice().get("_key").and_then(|s| s.as_str()), Ok("a"));
    assert_eq!(
        translated.slice().key_at(0).and_then(|k| k.as_str()),
        Ok("_key")
    );
}

#[test]
fn unindexed_options() {
    let options = BuilderOptions::default()
        .unindexed_arrays(true)
        .unindexed_objects(true);
    let mut builder = Builder::new().with_options(options);
    builder.open_object().unwrap();
    builder.add_keyed("list", BuildValue::Array).unwrap();
    builder.add(1u8).unwrap();
    builder.add("two").unwrap();
    builder.close().unwrap();
    builder.add_keyed("flag", false).unwrap();
    builder.close().unwrap();
    let vpack = builder.finish().unwrap();
    let root = vpack.slice();
    assert_eq!(root.head(), 0x14);
    assert_eq!(root.length(), Ok(2));
    let list = root.get("list").unwrap();
    assert_eq!(list.head(), 0x13);
    assert_eq!(list.value_at(1).and_then(|s| s.as_str()), Ok("two"));
    assert_eq!(root.get("flag").and_then(|s| s.as_bool()), Ok(false));
    assert!(root.get("nope").unwrap().is_none());
}

#[test]
fn embeds_encoded_values() {
    let mut inner = Builder::new();
    inner.add("test").unwrap();
    let inner = inner.finish().unwrap();

    let mut builder = Builder::new();
    builder.open_object().unwrap();
    builder.add_keyed("s", &inner).unwrap();
    builder.close().unwrap();
    let vpack = builder.finish().unwrap();
    assert_eq!(vpack.slice().length(), Ok(1));
    assert_eq!(vpack.slice().get("s").and_then(|s| s.as_str()), Ok("test"));

    let mut object = Builder::new();
    object.open_object().unwrap();
    object.add_keyed("s", "test").unwrap();
    object.close().unwrap();
    let object = object.finish().unwrap();

    let mut builder = Builder::new();
    builder.open_array().unwrap();
    for _ in 0..10 {
        builder.add_slice(object.slice()).unwrap();
    }
    builder.close().unwrap();
    let vpack = builder.finish().unwrap();
    let slice = vpack.slice();
    assert_eq!(slice.length(), Ok(10));
    for i in 0..10 {
        let item = slice.value_at(i).unwrap();
        assert_eq!(item.length(), Ok(1));
        assert_eq!(item.get("s").and_then(|s| s.as_str()), Ok("test"));
    }
}

#[test]
fn none_slice_is_rejected_inside_containers() {
    let mut builder = Builder::new();
    builder.open_array().unwrap();
    assert_eq!(
        builder.add(Slice::none()).map_err(|e| e.kind()),
        Err(ErrorKind::Unsupported)
    );
    builder.add(1u8).unwrap();
    builder.add(2u8).unwrap();
    builder.close().unwrap();
    let vpack = builder.finish().unwrap();
    let slice = vpack.slice();
    assert_eq!(slice.length(), Ok(2));
    assert_eq!(slice.value_at(1).and_then(|v| v.as_u8()), Ok(2));

    let mut source = Builder::new();
    source.open_object().unwrap();
    source.add_keyed("present", 1u8).unwrap();
    source.close().unwrap();
    let source = source.finish().unwrap();
    let missing = source.slice().get("missing").unwrap();

    let mut builder = Builder::new();
    builder.open_object().unwrap();
    assert_eq!(
        builder.add_keyed("gone", missing),
        Err(VPackError::Unsupported("none value"))
    );
    builder.add_keyed("x", "x").unwrap();
    builder.add_keyed("two", 2u8).unwrap();
    builder.close().unwrap();
    let vpack = builder.finish().unwrap();
    let slice = vpack.slice();
    assert_eq!(slice.length(), Ok(2));
    assert!(slice.get("gone").unwrap().is_none());
    assert_eq!(slice.get("x").and_then(|v| v.as_str()), Ok("x"));
    let heads: Vec<u8> = slice.iter_object().unwrap().map(|(_, v)| v.head()).collect();
    assert_eq!(heads, [0x41, 0x32]);
}

#[test]
fn dates_and_durations() {
    let date = chrono::DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
    let mut builder = Builder::new();
    builder.open_array().unwrap();
    builder.add(date).unwrap();
    builder.add(chrono::TimeDelta::microseconds(1_500)).unwrap();
    builder.close().unwrap();
    let vpack = builder.finish().unwrap();
    let slice = vpack.slice();
    let first = slice.value_at(0).unwrap();
    assert_eq!(first.value_type(), ValueType::UtcDate);
    assert_eq!(first.as_utc_millis(), Ok(1_700_000_000_123));
    assert_eq!(first.as_date_time(), Ok(date));
    assert_eq!(
        slice.value_at(1).and_then(|s| s.as_duration()),
        Ok(chrono::TimeDelta::microseconds(1_500))
    );
}

#[test]
fn optional_values() {
    let mut builder = Builder::new();
    builder.open_array().unwrap();
    builder.add(Some(3u8)).unwrap();
    builder.add(None::<u8>).unwrap();
    builder.close().unwrap();
    let vpack = builder.finish().unwrap();
    let slice = vpack.slice();
    assert_eq!(slice.value_at(0).unwrap().nullable().map(|s| s.as_u8()), Some(Ok(3)));
    assert!(slice.value_at(1).unwrap().nullable().is_none());
}

#[test]
fn clear_resets_state() {
    let mut builder = Builder::new();
    builder.open_object().unwrap();
    builder.add_key("dangling").unwrap();
    builder.clear();
    assert!(builder.is_empty());
    assert!(builder.is_closed());
    builder.add(5u8).unwrap();
    assert_eq!(builder.as_bytes(), [0x35]);
}
