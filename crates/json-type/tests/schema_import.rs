//! Schema trees as the interchange format: JSON round-trips, import into
//! type nodes, and export back.

use json_type::{EncodingFormat, ErrorMode, Schema, TypeBuilder, TypeSystem};
use serde_json::{json, Value};

#[test]
fn schema_json_round_trips() {
    let schema_json = json!({
        "kind": "obj",
        "title": "User",
        "fields": [
            {"key": "id", "type": {"kind": "str", "min": 1}},
            {"key": "age", "type": {"kind": "num", "format": "u8"}, "optional": true},
            {"key": "tags", "type": {"kind": "arr", "type": {"kind": "str"}}, "optional": true}
        ]
    });
    let schema: Schema = serde_json::from_value(schema_json.clone()).unwrap();
    assert_eq!(schema.kind(), "obj");
    assert_eq!(serde_json::to_value(&schema).unwrap(), schema_json);
}

#[test]
fn imported_schema_compiles_like_a_built_one() {
    let schema_json = json!({
        "kind": "obj",
        "fields": [
            {"key": "id", "type": {"kind": "str"}},
            {"key": "tags", "type": {"kind": "arr", "type": {"kind": "str"}}, "optional": true}
        ]
    });
    let schema: Schema = serde_json::from_value(schema_json).unwrap();
    let ty = TypeBuilder::new().import(&schema);

    assert!(ty
        .validate(&json!({"id": "abc"}), ErrorMode::Boolean)
        .unwrap()
        .is_ok());
    assert_eq!(
        ty.encode_json_text(&json!({"id": "abc", "tags": ["x", "y"]}))
            .unwrap(),
        r#"{"id":"abc","tags":["x","y"]}"#
    );
}

#[test]
fn import_then_export_preserves_the_tree() {
    let t = TypeBuilder::new();
    let ty = t
        .obj(vec![
            t.field("op", t.con("set")),
            t.field("value", t.or(vec![t.num(), t.str()])),
            t.field_opt("meta", t.map(t.any())),
        ])
        .with_title("Op");
    let exported = ty.get_schema();
    let reimported = TypeBuilder::new().import(&exported);
    assert_eq!(
        serde_json::to_value(reimported.get_schema()).unwrap(),
        serde_json::to_value(exported).unwrap()
    );
}

#[test]
fn validator_names_survive_the_round_trip() {
    let schema_json = json!({"kind": "str", "validator": ["no-spaces"]});
    let schema: Schema = serde_json::from_value(schema_json.clone()).unwrap();
    assert_eq!(serde_json::to_value(&schema).unwrap(), schema_json);

    let single: Schema = serde_json::from_value(json!({"kind": "str", "validator": "id"})).unwrap();
    assert_eq!(single.base().validator, vec!["id"]);
}

#[test]
fn system_exports_and_imports_alias_maps() {
    let system = TypeSystem::new();
    let t = system.builder();
    system.alias("Id", t.str());
    system.alias("User", t.obj(vec![t.field("id", t.ref_("Id"))]));

    let exported = system.export_types();
    assert_eq!(exported.len(), 2);

    let restored = TypeSystem::new();
    restored.import_types(exported);
    let user = restored.unalias("User").unwrap().ty;
    assert!(user
        .validate(&json!({"id": "u1"}), ErrorMode::Boolean)
        .unwrap()
        .is_ok());
    let bytes = user.encode(EncodingFormat::Cbor, &json!({"id": "u1"})).unwrap();
    assert_eq!(
        EncodingFormat::Cbor.decode(&bytes).unwrap(),
        json!({"id": "u1"})
    );
}

#[test]
fn fn_contracts_are_carried_structurally() {
    let schema_json = json!({
        "kind": "fn",
        "req": {"kind": "str"},
        "res": {"kind": "num"}
    });
    let schema: Schema = serde_json::from_value(schema_json.clone()).unwrap();
    assert_eq!(schema.kind(), "fn");
    assert_eq!(serde_json::to_value(&schema).unwrap(), schema_json);

    let streaming: Schema =
        serde_json::from_value(json!({"kind": "fn$", "req": {"kind": "any"}, "res": {"kind": "any"}}))
            .unwrap();
    assert_eq!(streaming.kind(), "fn$");
}

#[test]
fn explicit_discriminator_is_carried_structurally() {
    let schema_json = json!({
        "kind": "or",
        "types": [{"kind": "num"}, {"kind": "str"}],
        "discriminator": ["type", "str"]
    });
    let schema: Schema = serde_json::from_value(schema_json.clone()).unwrap();
    assert_eq!(serde_json::to_value(&schema).unwrap(), schema_json);

    let ty = TypeBuilder::new().import(&schema);
    let exported: Value = serde_json::to_value(ty.get_schema()).unwrap();
    assert_eq!(exported["discriminator"], json!(["type", "str"]));
}

#[test]
fn from_value_infers_a_usable_shape() {
    let t = TypeBuilder::new();
    let example = json!({"name": "a", "count": 1, "items": [1, 2]});
    let ty = t.from_value(&example);
    assert!(ty.validate(&example, ErrorMode::Boolean).unwrap().is_ok());
    assert_eq!(
        ty.encode_json_text(&example).unwrap(),
        r#"{"name":"a","count":1,"items":[1,2]}"#
    );
}
