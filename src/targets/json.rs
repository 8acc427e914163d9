//! plain json serialization of the compiled document

use super::TargetContext;
use crate::error::Result;
use crate::ir::{Fragment, Operation};
use crate::schema::{TypeDef, TypeKind, TypeRef};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonArtifact<'a> {
    operations: Vec<&'a Operation>,
    fragments: Vec<&'a Fragment>,
    types_used: Vec<TypeDetails<'a>>,
}

#[derive(Debug, Serialize)]
struct TypeDetails<'a> {
    kind: TypeKind,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    values: Vec<ValueDetails<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<InputFieldDetails<'a>>,
}

#[derive(Debug, Serialize)]
struct ValueDetails<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct InputFieldDetails<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    type_ref: &'a TypeRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

impl<'a> From<&'a TypeDef> for TypeDetails<'a> {
    fn from(ty: &'a TypeDef) -> Self {
        Self {
            kind: ty.kind,
            name: &ty.name,
            description: ty.description.as_deref(),
            values: ty
                .values
                .iter()
                .map(|value| ValueDetails {
                    name: &value.name,
                    description: value.description.as_deref(),
                })
                .collect(),
            fields: ty
                .input_fields
                .iter()
                .map(|field| InputFieldDetails {
                    name: &field.name,
                    type_ref: &field.value_type,
                    description: field.description.as_deref(),
                })
                .collect(),
        }
    }
}

/// pretty-printed json with two-space indentation
pub(crate) fn serialize_to_json(context: TargetContext<'_>) -> Result<String> {
    let ir = context.ir;
    let artifact = JsonArtifact {
        operations: ir.operations.values().collect(),
        fragments: ir.fragments.values().collect(),
        types_used: ir
            .types_used
            .iter()
            .filter_map(|name| ir.schema.type_named(name))
            .map(TypeDetails::from)
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&artifact)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compilation::compile_to_ir;
    use crate::config::CodegenOptions;
    use crate::document::parse_document;
    use crate::schema::Schema;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    #[test]
    fn test_serializes_operations_fragments_and_types() {
        let schema = Schema::parse(indoc! {r#"
            type Query { hero(episode: Episode): Character }
            "a film"
            enum Episode { NEWHOPE JEDI }
            type Character { name: String! appearsIn: [Episode]! }
        "#})
        .unwrap();
        let doc = parse_document(
            indoc! {r#"
                query Hero($episode: Episode) { hero(episode: $episode) { ...Details } }
                fragment Details on Character { name appearsIn }
            "#},
            None,
        )
        .unwrap();
        let options = CodegenOptions::default();
        let ir = compile_to_ir(&schema, &doc, &options).unwrap();

        let output = serialize_to_json(TargetContext {
            ir: &ir,
            options: &options,
            synthesized: false,
        })
        .unwrap();
        assert!(output.starts_with("{\n  \"operations\": ["));

        let value: Value = serde_json::from_str(&output).unwrap();
        let operation = &value["operations"][0];
        assert_eq!(operation["operationName"], "Hero");
        assert_eq!(operation["operationType"], "query");
        assert_eq!(operation["variables"], json!([{ "name": "episode", "type": "Episode" }]));
        assert_eq!(operation["fragmentsReferenced"], json!(["Details"]));

        let hero = &operation["fields"][0];
        assert_eq!(hero["responseName"], "hero");
        assert_eq!(hero["type"], "Character");
        assert_eq!(hero["fragmentSpreads"], json!(["Details"]));
        assert_eq!(hero["fields"][1]["type"], "[Episode]!");

        assert_eq!(value["fragments"][0]["typeCondition"], "Character");
        assert_eq!(
            value["typesUsed"],
            json!([{
                "kind": "enum",
                "name": "Episode",
                "description": "a film",
                "values": [{ "name": "NEWHOPE" }, { "name": "JEDI" }],
            }])
        );
    }
}
