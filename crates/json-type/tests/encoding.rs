//! Encoder behavior: field order, optional omission, constant folding, and
//! round-trips across the text and binary formats.

use json_type::{EncodingFormat, TypeBuilder, TypeNode};
use serde_json::{json, Value};

const FORMATS: [EncodingFormat; 3] = [
    EncodingFormat::Json,
    EncodingFormat::Cbor,
    EncodingFormat::MsgPack,
];

fn t() -> TypeBuilder {
    TypeBuilder::new()
}

fn text(ty: &TypeNode, value: Value) -> String {
    ty.encode_json_text(&value).unwrap()
}

fn assert_roundtrips(ty: &TypeNode, value: Value) {
    for format in FORMATS {
        let bytes = ty.encode(format, &value).unwrap();
        let decoded = format.decode(&bytes).unwrap();
        assert_eq!(decoded, value, "{format} roundtrip of {value:?}");
    }
    // The text encoder and the byte-oriented JSON encoder must agree.
    let bytes = ty.encode(EncodingFormat::Json, &value).unwrap();
    assert_eq!(String::from_utf8(bytes).unwrap(), text(ty, value));
}

// ── the end-to-end example ──────────────────────────────────────────────────

#[test]
fn object_with_optional_tags() {
    let ty = t().obj(vec![
        t().field("id", t().str()),
        t().field_opt("tags", t().arr(t().str())),
    ]);
    assert_eq!(
        text(&ty, json!({"id": "abc", "tags": ["x", "y"]})),
        r#"{"id":"abc","tags":["x","y"]}"#
    );
    // The optional key is omitted entirely: no trailing comma, no `tags`.
    assert_eq!(text(&ty, json!({"id": "abc"})), r#"{"id":"abc"}"#);

    for format in FORMATS {
        let bytes = ty.encode(format, &json!({"id": "abc"})).unwrap();
        let decoded = format.decode(&bytes).unwrap();
        assert_eq!(decoded, json!({"id": "abc"}));
        assert!(decoded.get("tags").is_none());
    }
}

// ── field order ─────────────────────────────────────────────────────────────

#[test]
fn fields_encode_in_declaration_order() {
    let ty = t().obj(vec![
        t().field("a", t().num()),
        t().field("b", t().num()),
        t().field("c", t().num()),
    ]);
    // Input key order differs from the declared order.
    let value: Value = serde_json::from_str(r#"{"c":3,"a":1,"b":2}"#).unwrap();
    assert_eq!(text(&ty, value.clone()), r#"{"a":1,"b":2,"c":3}"#);
    let bytes = ty.encode(EncodingFormat::MsgPack, &value).unwrap();
    let decoded = EncodingFormat::MsgPack.decode(&bytes).unwrap();
    let keys: Vec<&String> = decoded.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["a", "b", "c"]);
}

#[test]
fn declaration_order_interleaves_required_and_optional() {
    let ty = t().obj(vec![
        t().field("a", t().num()),
        t().field_opt("b", t().num()),
        t().field("c", t().num()),
    ]);
    assert_eq!(
        text(&ty, json!({"a": 1, "b": 2, "c": 3})),
        r#"{"a":1,"b":2,"c":3}"#
    );
    assert_eq!(text(&ty, json!({"a": 1, "c": 3})), r#"{"a":1,"c":3}"#);
}

// ── trailing separator elision ──────────────────────────────────────────────

#[test]
fn all_optional_object_can_encode_empty() {
    let ty = t().obj(vec![
        t().field_opt("a", t().num()),
        t().field_opt("b", t().num()),
    ]);
    assert_eq!(text(&ty, json!({})), "{}");
    assert_eq!(text(&ty, json!({"b": 2})), r#"{"b":2}"#);
    for format in FORMATS {
        let bytes = ty.encode(format, &json!({})).unwrap();
        assert_eq!(format.decode(&bytes).unwrap(), json!({}));
    }
}

// ── constant folding ────────────────────────────────────────────────────────

#[test]
fn constant_subtrees_encode_correctly() {
    // A fully constant object folds into a single pre-rendered blob; the
    // output must be indistinguishable from the dynamic path.
    let ty = t().obj(vec![
        t().field("version", t().con(2)),
        t().field("kind", t().con("snapshot")),
    ]);
    let value = json!({"version": 2, "kind": "snapshot"});
    assert_eq!(text(&ty, value.clone()), r#"{"version":2,"kind":"snapshot"}"#);
    assert_roundtrips(&ty, value);
}

#[test]
fn mixed_constant_and_dynamic_fields() {
    let ty = t().obj(vec![
        t().field("v", t().con(1)),
        t().field("data", t().str()),
        t().field("flag", t().con(true)),
    ]);
    let value = json!({"v": 1, "data": "payload", "flag": true});
    assert_eq!(
        text(&ty, value.clone()),
        r#"{"v":1,"data":"payload","flag":true}"#
    );
    assert_roundtrips(&ty, value);
}

// ── per-kind round-trips ────────────────────────────────────────────────────

#[test]
fn scalar_roundtrips() {
    assert_roundtrips(&t().bool(), json!(true));
    assert_roundtrips(&t().bool(), json!(false));
    assert_roundtrips(&t().num(), json!(0));
    assert_roundtrips(&t().num(), json!(-123));
    assert_roundtrips(&t().num(), json!(123456789));
    assert_roundtrips(&t().num(), json!(2.5));
    assert_roundtrips(&t().str(), json!(""));
    assert_roundtrips(&t().str(), json!("hello"));
    assert_roundtrips(&t().str(), json!("esc \" \\ \n done"));
    assert_roundtrips(&t().str(), json!("unicode π 🙂"));
    assert_roundtrips(&t().con(json!({"fixed": [1, 2]})), json!({"fixed": [1, 2]}));
    assert_roundtrips(&t().nil(), json!(null));
}

#[test]
fn sized_number_formats_roundtrip() {
    use json_type::schema::NumFormat;
    use json_type::type_def::NumType;
    let u8_ty = TypeNode::Num(NumType::new().format(NumFormat::U8));
    assert_roundtrips(&u8_ty, json!(255));
    let i32_ty = TypeNode::Num(NumType::new().format(NumFormat::I32));
    assert_roundtrips(&i32_ty, json!(-70000));
    let f64_ty = TypeNode::Num(NumType::new().format(NumFormat::F64));
    assert_roundtrips(&f64_ty, json!(2.75));
}

#[test]
fn container_roundtrips() {
    assert_roundtrips(&t().arr(t().num()), json!([]));
    assert_roundtrips(&t().arr(t().num()), json!([1, 2, 3]));
    assert_roundtrips(&t().tup(vec![t().num(), t().str(), t().bool()]), json!([7, "x", false]));
    assert_roundtrips(&t().map(t().num()), json!({}));
    assert_roundtrips(&t().map(t().num()), json!({"a": 1, "b": 2}));
    let nested = t().obj(vec![
        t().field("meta", t().obj(vec![t().field("id", t().str())])),
        t().field("rows", t().arr(t().tup(vec![t().num(), t().str()]))),
    ]);
    assert_roundtrips(
        &nested,
        json!({"meta": {"id": "m1"}, "rows": [[1, "a"], [2, "b"]]}),
    );
}

#[test]
fn any_roundtrips() {
    let ty = t().any();
    assert_roundtrips(&ty, json!({"free": ["form", 1, true, null]}));
}

// ── bin ─────────────────────────────────────────────────────────────────────

#[test]
fn bin_roundtrips_in_binary_formats() {
    let ty = t().bin(t().any());
    let value = json!([1, 2, 3, 255, 0]);
    for format in [EncodingFormat::Cbor, EncodingFormat::MsgPack] {
        let bytes = ty.encode(format, &value).unwrap();
        assert_eq!(format.decode(&bytes).unwrap(), value);
    }
}

#[test]
fn bin_renders_as_data_uri_in_json() {
    let ty = t().bin(t().any());
    assert_eq!(
        text(&ty, json!([1, 2, 3])),
        r#""data:application/octet-stream;base64,AQID""#
    );
}

// ── unknown field carry-through ─────────────────────────────────────────────

#[test]
fn unknown_fields_are_carried_through_when_enabled() {
    use json_type::type_def::{FieldType, ObjType};
    let ty = TypeNode::Obj(
        ObjType::new(vec![FieldType::new("a", t().num())])
            .unknown_fields()
            .encode_unknown_fields(),
    );
    let value = json!({"a": 1, "extra": true, "more": [1]});
    assert_eq!(text(&ty, value.clone()), r#"{"a":1,"extra":true,"more":[1]}"#);
    for format in FORMATS {
        let bytes = ty.encode(format, &value).unwrap();
        assert_eq!(format.decode(&bytes).unwrap(), value);
    }
}

#[test]
fn unknown_fields_are_dropped_when_carry_through_is_off() {
    use json_type::type_def::{FieldType, ObjType};
    let ty = TypeNode::Obj(ObjType::new(vec![FieldType::new("a", t().num())]).unknown_fields());
    // Unknown keys are tolerated on validate but not emitted on encode;
    // the shape stays fixed, so this object still folds statically.
    assert_eq!(text(&ty, json!({"a": 1, "extra": true})), r#"{"a":1}"#);
}

// ── unions ──────────────────────────────────────────────────────────────────

#[test]
fn union_dispatch_selects_the_matching_alternative() {
    let ty = t().or(vec![t().con("x"), t().con("y"), t().str()]);
    assert_eq!(text(&ty, json!("x")), r#""x""#);
    assert_eq!(text(&ty, json!("y")), r#""y""#);
    assert_eq!(text(&ty, json!("z")), r#""z""#);
    assert_roundtrips(&ty, json!("z"));
}

#[test]
fn union_of_shapes_dispatches_on_runtime_kind() {
    let ty = t().or(vec![
        t().obj(vec![t().field("a", t().num())]),
        t().arr(t().num()),
        t().num(),
    ]);
    assert_roundtrips(&ty, json!({"a": 5}));
    assert_roundtrips(&ty, json!([1, 2]));
    assert_roundtrips(&ty, json!(9));
}

#[test]
fn tagged_union_dispatches_on_field_constant() {
    let add = t().obj(vec![
        t().field("op", t().con("add")),
        t().field("value", t().num()),
    ]);
    let del = t().obj(vec![
        t().field("op", t().con("del")),
        t().field("path", t().str()),
    ]);
    let ty = t().or(vec![add, del]);
    assert_eq!(
        text(&ty, json!({"op": "add", "value": 4})),
        r#"{"op":"add","value":4}"#
    );
    assert_eq!(
        text(&ty, json!({"op": "del", "path": "/x"})),
        r#"{"op":"del","path":"/x"}"#
    );
    assert_roundtrips(&ty, json!({"op": "del", "path": "/x"}));
}

// ── fn kinds ────────────────────────────────────────────────────────────────

#[test]
fn function_contracts_encode_as_null() {
    let ty = t().fn_(t().str(), t().num());
    assert_eq!(text(&ty, json!("ignored")), "null");
}

// ── caching ─────────────────────────────────────────────────────────────────

#[test]
fn encoders_are_memoized_per_format() {
    use std::sync::Arc;
    let ty = t().obj(vec![t().field("a", t().num())]);
    let first = ty.encoder(EncodingFormat::Cbor).unwrap();
    let second = ty.encoder(EncodingFormat::Cbor).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    let msgpack = ty.encoder(EncodingFormat::MsgPack).unwrap();
    assert!(!Arc::ptr_eq(&first, &msgpack));
}
