use fracpack::{standard_types, Schema, SchemaDef, TypeDef, Value};
use proptest::prelude::*;

fn schema() -> Schema {
    let def = SchemaDef::new()
        .with("i32", TypeDef::i32())
        .with("u12", TypeDef::int(12, false))
        .with("f64", TypeDef::f64())
        .with(
            "record",
            TypeDef::object([
                ("id", TypeDef::u32()),
                ("delta", TypeDef::option(TypeDef::i16())),
                ("label", TypeDef::option(TypeDef::string())),
                ("tags", TypeDef::option(TypeDef::list(TypeDef::string()))),
            ]),
        )
        .with(
            "shape",
            TypeDef::variant([
                ("Point", TypeDef::tuple([TypeDef::i32(), TypeDef::i32()])),
                ("Name", TypeDef::string()),
                ("Blob", TypeDef::hex(TypeDef::list(TypeDef::u8()))),
            ]),
        )
        .with("nested", TypeDef::fracpack(TypeDef::named("record")));
    Schema::load(&def, &standard_types()).unwrap()
}

fn record_strategy() -> impl Strategy<Value = Value> {
    (
        any::<u32>(),
        proptest::option::of(any::<i16>()),
        proptest::option::of(".{0,12}"),
        proptest::option::of(proptest::collection::vec(".{0,6}", 0..5)),
    )
        .prop_map(|(id, delta, label, tags)| {
            Value::object([
                ("id", Value::from(id)),
                ("delta", Value::from(delta)),
                ("label", Value::from(label)),
                (
                    "tags",
                    tags.map_or(Value::Null, |t| {
                        Value::Array(t.into_iter().map(Value::from).collect())
                    }),
                ),
            ])
        })
}

fn shape_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        (any::<i32>(), any::<i32>()).prop_map(|(x, y)| {
            Value::variant("Point", Value::Array(vec![x.into(), y.into()]))
        }),
        ".{0,16}".prop_map(|s| Value::variant("Name", Value::from(s))),
        proptest::collection::vec(any::<u8>(), 0..32)
            .prop_map(|b| Value::variant("Blob", Value::Bytes(b))),
    ]
}

/// Decoding and re-encoding reproduces the bytes exactly.
fn assert_canonical(schema: &Schema, name: &str, value: &Value) -> Result<(), TestCaseError> {
    let packed = schema.pack(name, value).unwrap();
    let decoded = schema.unpack(name, &packed).unwrap();
    prop_assert_eq!(&decoded, value);
    prop_assert_eq!(schema.pack(name, &decoded).unwrap(), packed);
    Ok(())
}

proptest! {
    #[test]
    fn ints_roundtrip(v in any::<i32>(), u in 0u64..4096) {
        let s = schema();
        assert_canonical(&s, "i32", &Value::Integer(v as i64))?;
        assert_canonical(&s, "u12", &Value::UInteger(u))?;
    }

    #[test]
    fn floats_roundtrip(f in any::<f64>().prop_filter("nan never equals itself", |f| !f.is_nan())) {
        assert_canonical(&schema(), "f64", &Value::Float(f))?;
    }

    #[test]
    fn records_roundtrip(value in record_strategy()) {
        let s = schema();
        assert_canonical(&s, "record", &value)?;
        assert_canonical(&s, "nested", &value)?;
    }

    #[test]
    fn trimmed_header_never_ends_in_null(value in record_strategy()) {
        let s = schema();
        let packed = s.pack("record", &value).unwrap();
        let header = u16::from_le_bytes([packed[0], packed[1]]) as usize;
        prop_assert!(header >= 4);
        prop_assert_eq!((header - 4) % 4, 0);
        if header > 4 {
            let last = &packed[2 + header - 4..2 + header];
            prop_assert_ne!(last, &[1u8, 0, 0, 0][..]);
        }
    }

    #[test]
    fn variants_roundtrip(value in shape_strategy()) {
        assert_canonical(&schema(), "shape", &value)?;
    }
}
