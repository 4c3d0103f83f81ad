use fracpack::{standard_types, Codec, FracpackError, InputStream, Schema, SchemaDef, Value};
use serde_json::json;

fn schema() -> Schema {
    let def: SchemaDef = serde_json::from_value(json!({
        "u8": {"Int": {"bits": 8, "isSigned": false}},
        "u16": {"Int": {"bits": 16, "isSigned": false}},
        "u32": {"Int": {"bits": 32, "isSigned": false}},
        "i32": {"Int": {"bits": 32, "isSigned": true}},
        "bool": {"Custom": {"type": {"Int": {"bits": 1, "isSigned": false}}, "id": "bool"}},
        "string": {"Custom": {"type": {"List": "u8"}, "id": "string"}},
        "point": {"Object": {"i": "i32", "b": "bool"}},
        "opt_i32": {"Option": "i32"},
        "list_u16": {"List": "u16"},
        "list_str": {"List": "string"},
        "opt_list": {"Option": {"List": "u8"}},
        "wrap": {"Object": {"a": {"Option": "i32"}, "b": {"Option": "i32"}}},
        "holder": {"Object": {"s": "string"}},
        "v": {"Variant": {"A": "u8", "B": "string"}},
        "fp": {"FracPack": "u32"},
        "pair": {"Struct": {"x": "u16", "y": "u8"}},
        "arr": {"Array": {"type": "u16", "len": 3}},
        "tup": {"Tuple": ["u8", {"Option": "u8"}]},
        "arr_opt": {"Array": {"type": {"Option": "u8"}, "len": 3}},
        "list_opt_list": {"List": {"Option": {"List": "u8"}}},
    }))
    .unwrap();
    Schema::load(&def, &standard_types()).unwrap()
}

fn bytes(hex: &str) -> Vec<u8> {
    hex::decode(hex.replace(' ', "")).unwrap()
}

#[test]
fn scalar_and_object_vectors() {
    let s = schema();

    assert_eq!(s.pack("u32", &Value::UInteger(10)).unwrap(), bytes("0A000000"));

    let point = Value::object([("i", Value::Integer(6)), ("b", Value::Bool(true))]);
    let packed = s.pack("point", &point).unwrap();
    assert_eq!(packed, bytes("0500 06000000 01"));
    assert_eq!(s.unpack("point", &packed).unwrap(), point);
}

#[test]
fn option_vectors() {
    let s = schema();

    let none = s.pack("opt_i32", &Value::Null).unwrap();
    assert_eq!(none, bytes("01000000"));
    assert_eq!(s.unpack("opt_i32", &none).unwrap(), Value::Null);

    let some = s.pack("opt_i32", &Value::Integer(-1)).unwrap();
    assert_eq!(some, bytes("04000000 FFFFFFFF"));
    assert_eq!(s.unpack("opt_i32", &some).unwrap(), Value::Integer(-1));
}

#[test]
fn option_elements_use_slots() {
    let s = schema();

    let arr = Value::Array(vec![Value::UInteger(7), Value::Null, Value::UInteger(9)]);
    let packed = s.pack("arr_opt", &arr).unwrap();
    assert_eq!(packed, bytes("0c000000 01000000 05000000 07 09"));
    assert_eq!(s.unpack("arr_opt", &packed).unwrap(), arr);

    let list = Value::Array(vec![
        Value::Null,
        Value::Array(vec![]),
        Value::Array(vec![Value::UInteger(1)]),
    ]);
    let packed = s.pack("list_opt_list", &list).unwrap();
    assert_eq!(
        packed,
        bytes("0c000000 01000000 00000000 04000000 01000000 01")
    );
    assert_eq!(s.unpack("list_opt_list", &packed).unwrap(), list);
}

#[test]
fn list_vectors() {
    let s = schema();

    let list = Value::Array(vec![Value::UInteger(1), Value::UInteger(2)]);
    let packed = s.pack("list_u16", &list).unwrap();
    assert_eq!(packed, bytes("04000000 0100 0200"));
    assert_eq!(s.unpack("list_u16", &packed).unwrap(), list);

    assert_eq!(
        s.unpack("list_u16", &bytes("03000000 010203")),
        Err(FracpackError::BadSize)
    );
    assert_eq!(
        s.unpack("list_u16", &bytes("08000000 0100")),
        Err(FracpackError::OutOfBounds)
    );
}

#[test]
fn empty_containers_use_offset_zero() {
    let s = schema();

    let strings = Value::Array(vec![Value::from("a"), Value::from("")]);
    let packed = s.pack("list_str", &strings).unwrap();
    assert_eq!(packed, bytes("08000000 08000000 00000000 01000000 61"));
    assert_eq!(s.unpack("list_str", &packed).unwrap(), strings);

    let holder = Value::object([("s", Value::from(""))]);
    let packed = s.pack("holder", &holder).unwrap();
    assert_eq!(packed, bytes("0400 00000000"));
    assert_eq!(s.unpack("holder", &packed).unwrap(), holder);

    let empty = Value::Array(vec![]);
    let packed = s.pack("opt_list", &empty).unwrap();
    assert_eq!(packed, bytes("00000000"));
    assert_eq!(s.unpack("opt_list", &packed).unwrap(), empty);
    assert_eq!(s.pack("opt_list", &Value::Null).unwrap(), bytes("01000000"));
}

#[test]
fn non_zero_offset_to_empty_container_is_rejected() {
    let s = schema();
    // second slot points at an explicit zero-length string
    let data = bytes("08000000 08000000 09000000 01000000 61 00000000");
    assert_eq!(
        s.unpack("list_str", &data),
        Err(FracpackError::BadEmptyEncoding)
    );
}

#[test]
fn offsets_must_follow_the_cursor() {
    let s = schema();
    assert_eq!(
        s.unpack("holder", &bytes("0400 08000000 00000000 01000000")),
        Err(FracpackError::BadOffset)
    );
    assert_eq!(
        s.unpack("holder", &bytes("0400 01000000")),
        Err(FracpackError::BadOffset)
    );
}

#[test]
fn trailing_absent_options_are_trimmed() {
    let s = schema();

    let neither = Value::object([("a", Value::Null), ("b", Value::Null)]);
    let packed = s.pack("wrap", &neither).unwrap();
    assert_eq!(packed, bytes("0000"));
    assert_eq!(s.unpack("wrap", &packed).unwrap(), neither);

    let first = Value::object([("a", Value::Integer(5)), ("b", Value::Null)]);
    let packed = s.pack("wrap", &first).unwrap();
    assert_eq!(packed, bytes("0400 04000000 05000000"));
    assert_eq!(s.unpack("wrap", &packed).unwrap(), first);

    let second = Value::object([("a", Value::Null), ("b", Value::Integer(7))]);
    let packed = s.pack("wrap", &second).unwrap();
    assert_eq!(packed, bytes("0800 01000000 04000000 07000000"));
    assert_eq!(s.unpack("wrap", &packed).unwrap(), second);

    // missing keys count as absent
    assert_eq!(s.pack("wrap", &Value::object::<&str, _>([])).unwrap(), bytes("0000"));
}

#[test]
fn last_present_option_must_not_be_null() {
    let s = schema();
    assert_eq!(
        s.unpack("wrap", &bytes("0400 01000000")),
        Err(FracpackError::LastOptionalMustNotBeEmpty)
    );
}

#[test]
fn variant_vectors() {
    let s = schema();

    let a = Value::variant("A", Value::UInteger(7));
    let packed = s.pack("v", &a).unwrap();
    assert_eq!(packed, bytes("00 01000000 07"));
    assert_eq!(s.unpack("v", &packed).unwrap(), a);

    let b = Value::variant("B", Value::from("hi"));
    let packed = s.pack("v", &b).unwrap();
    assert_eq!(packed, bytes("01 06000000 02000000 6869"));
    assert_eq!(s.unpack("v", &packed).unwrap(), b);

    // surplus payload bytes are skipped
    assert_eq!(s.unpack("v", &bytes("00 03000000 07AABB")).unwrap(), a);

    assert_eq!(
        s.unpack("v", &bytes("02 00000000")),
        Err(FracpackError::UnknownAlternative(2))
    );
    assert_eq!(
        s.pack("v", &Value::variant("C", Value::Null)),
        Err(FracpackError::UnknownAlternativeName("C".into()))
    );
}

#[test]
fn fracpack_vectors() {
    let s = schema();

    let packed = s.pack("fp", &Value::UInteger(10)).unwrap();
    assert_eq!(packed, bytes("04000000 0A000000"));
    assert_eq!(s.unpack("fp", &packed).unwrap(), Value::UInteger(10));

    assert_eq!(
        s.unpack("fp", &bytes("05000000 0A000000 FF")),
        Err(FracpackError::ExtraData)
    );
    assert_eq!(
        s.unpack("fp", &bytes("08000000 0A000000")),
        Err(FracpackError::OutOfBounds)
    );
}

#[test]
fn failed_window_restores_the_stream() {
    let s = schema();
    let codec = Codec::new(&s);
    let ty = s.require("fp").unwrap();
    let data = bytes("08000000 0A000000 00000000");

    let mut input = InputStream::new(&data);
    assert_eq!(codec.unpack_from(&mut input, ty), Err(FracpackError::ExtraData));
    assert_eq!(input.position(), 4);
    assert_eq!(input.remaining(), 8);
    assert!(input.known_pos());

    let data = bytes("02000000 0A00 FFFF");
    let mut input = InputStream::new(&data);
    input.set_unknown_pos();
    assert_eq!(codec.unpack_from(&mut input, ty), Err(FracpackError::OutOfBounds));
    assert_eq!(input.remaining(), 4);
    assert!(!input.known_pos());
}

#[test]
fn struct_array_and_tuple_vectors() {
    let s = schema();

    let pair = Value::object([("x", Value::UInteger(1)), ("y", Value::UInteger(2))]);
    let packed = s.pack("pair", &pair).unwrap();
    assert_eq!(packed, bytes("0100 02"));
    assert_eq!(s.unpack("pair", &packed).unwrap(), pair);

    let arr = Value::Array(vec![1u16.into(), 2u16.into(), 3u16.into()]);
    let packed = s.pack("arr", &arr).unwrap();
    assert_eq!(packed, bytes("0100 0200 0300"));
    assert_eq!(s.unpack("arr", &packed).unwrap(), arr);
    assert_eq!(
        s.pack("arr", &Value::Array(vec![1u16.into()])),
        Err(FracpackError::BadSize)
    );

    let short = Value::Array(vec![Value::UInteger(5), Value::Null]);
    let packed = s.pack("tup", &short).unwrap();
    assert_eq!(packed, bytes("0100 05"));
    assert_eq!(s.unpack("tup", &packed).unwrap(), short);

    let full = Value::Array(vec![Value::UInteger(5), Value::UInteger(6)]);
    let packed = s.pack("tup", &full).unwrap();
    assert_eq!(packed, bytes("0500 05 04000000 06"));
    assert_eq!(s.unpack("tup", &packed).unwrap(), full);
}

#[test]
fn malformed_input_matrix() {
    let s = schema();

    assert_eq!(
        s.unpack("u32", &bytes("0A00000000")),
        Err(FracpackError::ExtraData)
    );
    assert_eq!(s.unpack("u32", &bytes("0A0000")), Err(FracpackError::OutOfBounds));
    assert_eq!(
        s.pack("point", &Value::object([("i", Value::Integer(6))])),
        Err(FracpackError::MissingField("b".into()))
    );
    assert_eq!(
        s.unpack("point", &bytes("0400 06000000")),
        Err(FracpackError::MissingField("b".into()))
    );
    assert_eq!(
        s.pack("u16", &Value::UInteger(70_000)),
        Err(FracpackError::IntegerOutOfRange {
            bits: 16,
            signed: false
        })
    );
    assert!(matches!(
        s.pack("list_u16", &Value::from("nope")),
        Err(FracpackError::TypeMismatch { .. })
    ));
}
