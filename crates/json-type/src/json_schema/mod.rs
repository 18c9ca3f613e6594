//! Export to a JSON-Schema-like structure.

use serde_json::{json, Map, Value};

use crate::type_def::TypeNode;

/// Maps a type to a JSON-Schema-like description.
pub fn to_json_schema(node: &TypeNode) -> Value {
    let mut out = match node {
        TypeNode::Any(_) | TypeNode::Fn(_) | TypeNode::FnRx(_) => json!({}),
        TypeNode::Con(t) => json!({"const": t.value}),
        TypeNode::Bool(_) => json!({"type": "boolean"}),
        TypeNode::Num(t) => {
            let is_int = t.format.map(|f| f.is_integer()).unwrap_or(false);
            let mut schema = json!({"type": if is_int { "integer" } else { "number" }});
            set(&mut schema, "exclusiveMinimum", t.gt.map(|v| json!(v)));
            set(&mut schema, "minimum", t.gte.map(|v| json!(v)));
            set(&mut schema, "exclusiveMaximum", t.lt.map(|v| json!(v)));
            set(&mut schema, "maximum", t.lte.map(|v| json!(v)));
            schema
        }
        TypeNode::Str(t) => {
            let mut schema = json!({"type": "string"});
            set(&mut schema, "minLength", t.min.map(|v| json!(v)));
            set(&mut schema, "maxLength", t.max.map(|v| json!(v)));
            schema
        }
        TypeNode::Bin(_) => json!({"type": "binary"}),
        TypeNode::Arr(t) => {
            let mut schema = json!({"type": "array", "items": to_json_schema(&t.type_)});
            set(&mut schema, "minItems", t.min.map(|v| json!(v)));
            set(&mut schema, "maxItems", t.max.map(|v| json!(v)));
            schema
        }
        TypeNode::Tup(t) => json!({
            "type": "array",
            "prefixItems": t.types.iter().map(to_json_schema).collect::<Vec<_>>(),
            "items": false,
            "minItems": t.types.len(),
            "maxItems": t.types.len(),
        }),
        TypeNode::Obj(t) => {
            let mut properties = Map::new();
            let mut required: Vec<Value> = Vec::new();
            for field in &t.fields {
                properties.insert(field.key.clone(), to_json_schema(&field.ty));
                if !field.optional {
                    required.push(json!(field.key));
                }
            }
            let mut schema = json!({"type": "object", "properties": properties});
            if !required.is_empty() {
                schema["required"] = json!(required);
            }
            if !t.unknown_fields {
                schema["additionalProperties"] = json!(false);
            }
            schema
        }
        TypeNode::Map(t) => json!({
            "type": "object",
            "additionalProperties": to_json_schema(&t.value),
        }),
        TypeNode::Ref(t) => json!({"$ref": format!("#/$defs/{}", t.ref_)}),
        TypeNode::Or(t) => json!({
            "anyOf": t.types.iter().map(to_json_schema).collect::<Vec<_>>(),
        }),
    };
    let base = node.base();
    set(&mut out, "title", base.title.as_ref().map(|v| json!(v)));
    set(
        &mut out,
        "description",
        base.description.as_ref().map(|v| json!(v)),
    );
    if !base.examples.is_empty() {
        out["examples"] = json!(base.examples);
    }
    out
}

fn set(schema: &mut Value, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        schema[key] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_def::{NumType, TypeBuilder};

    #[test]
    fn object_export_shape() {
        let t = TypeBuilder::new();
        let ty = t.obj(vec![
            t.field("id", t.str()),
            t.field_opt("tags", t.arr(t.str())),
        ]);
        let schema = to_json_schema(&ty);
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["id"]["type"], "string");
        assert_eq!(schema["properties"]["tags"]["type"], "array");
        assert_eq!(schema["required"], json!(["id"]));
        assert_eq!(schema["additionalProperties"], json!(false));
    }

    #[test]
    fn num_bounds_export() {
        let ty = TypeNode::Num(NumType::new().gte(0.0).lt(10.0));
        let schema = to_json_schema(&ty);
        assert_eq!(schema["type"], "number");
        assert_eq!(schema["minimum"], json!(0.0));
        assert_eq!(schema["exclusiveMaximum"], json!(10.0));
    }
}
