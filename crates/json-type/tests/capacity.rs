//! Capacity estimator soundness: the estimate is never smaller than the
//! encoded size, in any format.

use json_type::{EncodingFormat, Random, TypeBuilder, TypeNode};
use proptest::prelude::*;
use serde_json::{json, Value};

const FORMATS: [EncodingFormat; 3] = [
    EncodingFormat::Json,
    EncodingFormat::Cbor,
    EncodingFormat::MsgPack,
];

fn t() -> TypeBuilder {
    TypeBuilder::new()
}

fn assert_sound(ty: &TypeNode, value: &Value) {
    let estimate = ty.capacity_estimator().unwrap()(value);
    for format in FORMATS {
        let bytes = ty.encode(format, value).unwrap();
        assert!(
            bytes.len() <= estimate,
            "{format}: encoded {} bytes > estimate {estimate} for {value:?}",
            bytes.len(),
        );
    }
    let text = ty.encode_json_text(value).unwrap();
    assert!(
        text.len() <= estimate,
        "text: encoded {} bytes > estimate {estimate} for {value:?}",
        text.len(),
    );
}

#[test]
fn scalar_estimates_are_sound() {
    assert_sound(&t().bool(), &json!(true));
    assert_sound(&t().num(), &json!(-123456789));
    assert_sound(&t().num(), &json!(1.25e-7));
    assert_sound(&t().str(), &json!(""));
    assert_sound(&t().str(), &json!("hello world"));
    assert_sound(&t().str(), &json!("esc \" \\ π 🙂"));
    assert_sound(&t().nil(), &json!(null));
    assert_sound(&t().con(json!({"a": [1, 2, 3]})), &json!({"a": [1, 2, 3]}));
}

#[test]
fn bin_estimate_covers_the_data_uri_form() {
    let ty = t().bin(t().any());
    assert_sound(&ty, &json!([]));
    assert_sound(&ty, &json!([1, 2, 3, 4, 5, 6, 7, 8, 9, 10]));
}

#[test]
fn container_estimates_are_sound() {
    assert_sound(&t().arr(t().num()), &json!([1, 2, 3, 4.5]));
    assert_sound(&t().arr(t().bool()), &json!([true, false, true]));
    assert_sound(
        &t().tup(vec![t().num(), t().str(), t().bool()]),
        &json!([1, "two", false]),
    );
    assert_sound(&t().map(t().str()), &json!({"a": "x", "bb": "yy"}));
    let ty = t().obj(vec![
        t().field("id", t().str()),
        t().field_opt("tags", t().arr(t().str())),
    ]);
    assert_sound(&ty, &json!({"id": "abc", "tags": ["x", "y"]}));
    assert_sound(&ty, &json!({"id": "abc"}));
}

#[test]
fn union_estimates_follow_the_dispatched_alternative() {
    let ty = t().or(vec![t().num(), t().str()]);
    assert_sound(&ty, &json!(5));
    assert_sound(&ty, &json!("a longer string value"));
}

fn rich_schema() -> TypeNode {
    let t = t();
    t.obj(vec![
        t.field("id", t.str()),
        t.field("version", t.con(3)),
        t.field("active", t.bool()),
        t.field("score", t.num()),
        t.field_opt("tags", t.arr(t.str())),
        t.field_opt("attrs", t.map(t.num())),
        t.field("pair", t.tup(vec![t.num(), t.str()])),
        t.field_opt("payload", t.bin(t.any())),
        t.field("kind", t.or(vec![t.con("a"), t.con("b"), t.str()])),
    ])
}

proptest! {
    #[test]
    fn fuzzed_values_never_exceed_the_estimate(seed in any::<u64>()) {
        let ty = rich_schema();
        let value = Random::with_seed(seed).gen(&ty);
        assert_sound(&ty, &value);
    }

    #[test]
    fn fuzzed_values_validate_in_every_mode(seed in any::<u64>()) {
        use json_type::ErrorMode;
        let ty = rich_schema();
        let value = Random::with_seed(seed).gen(&ty);
        for mode in [ErrorMode::Boolean, ErrorMode::String, ErrorMode::Object] {
            let validate = ty.validator(mode).unwrap();
            prop_assert!(validate(&value).is_ok(), "mode {mode:?} rejected {value:?}");
        }
    }
}
