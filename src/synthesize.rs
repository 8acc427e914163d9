//! default operation synthesis
//!
//! when no query documents are supplied, one operation is generated per
//! root field of every root operation type, selecting everything reachable
//! below it. an object type already being expanded on the current branch is
//! not expanded again: the revisiting field selects only `__typename`.

use crate::document::{concat_documents, parse_document, Document};
use crate::error::Result;
use crate::resolve::{named_type_string, operation_root_type, OperationKind};
use crate::schema::{FieldDef, Schema, TypeKind};
use crate::typename::{with_typename_field_added_where_needed, TYPENAME_FIELD};
use indexmap::IndexSet;
use std::collections::HashSet;

/// build a document of default operations from the schema alone
pub fn create_document_from_server_schema(schema: &Schema) -> Result<Document> {
    let mut documents = Vec::new();
    let mut used_names = HashSet::new();

    for kind in OperationKind::ALL {
        let Ok(root) = operation_root_type(schema, kind) else {
            continue;
        };
        for field in &root.fields {
            let mut name = field.name.clone();
            if !used_names.insert(name.clone()) {
                name = format!("{}{}", field.name, kind.type_suffix());
                used_names.insert(name.clone());
            }
            let source = client_operation_from_field(schema, kind, &name, field)?;
            tracing::trace!(%source, "synthesized operation");
            documents.push(parse_document(&source, None)?);
        }
    }

    tracing::debug!(operations = documents.len(), "synthesized default operations");
    with_typename_field_added_where_needed(schema, &concat_documents(documents))
}

/// `<kind> <name>(<args>){<field>(<bindings>){<fields>}}`
pub(crate) fn client_operation_from_field(
    schema: &Schema,
    kind: OperationKind,
    operation_name: &str,
    field: &FieldDef,
) -> Result<String> {
    let mut arg_defs = Vec::new();
    let mut param_defs = Vec::new();
    for arg in &field.arguments {
        arg_defs.push(format!(
            "${}:{}",
            arg.name,
            named_type_string(&arg.value_type, false)?
        ));
        param_defs.push(format!("{}:${}", arg.name, arg.name));
    }

    let mut visited = IndexSet::new();
    let fields = expand_fields(schema, field.field_type.base_name(), &mut visited);

    let mut out = format!("{kind} {operation_name}");
    if !arg_defs.is_empty() {
        out.push_str(&format!("({})", arg_defs.join(",")));
    }
    out.push('{');
    out.push_str(&field.name);
    if !param_defs.is_empty() {
        out.push_str(&format!("({})", param_defs.join(",")));
    }
    if !fields.is_empty() {
        out.push_str(&format!("{{{}}}", fields.join(",")));
    }
    out.push('}');
    Ok(out)
}

/// selections for every field of `type_name`, recursing into composite
/// field types. `visited` holds the types expanded on the current branch.
fn expand_fields(schema: &Schema, type_name: &str, visited: &mut IndexSet<String>) -> Vec<String> {
    let Some(ty) = schema.type_named(type_name) else {
        return Vec::new();
    };

    match ty.kind {
        TypeKind::Scalar | TypeKind::Enum => return Vec::new(),
        TypeKind::Union => return vec![TYPENAME_FIELD.to_string()],
        TypeKind::Object | TypeKind::Interface | TypeKind::InputObject => {}
    }

    if !visited.insert(ty.name.clone()) {
        return vec![TYPENAME_FIELD.to_string()];
    }

    let children: Vec<(&str, &str)> = if ty.kind == TypeKind::InputObject {
        ty.input_fields
            .iter()
            .map(|f| (f.name.as_str(), f.value_type.base_name()))
            .collect()
    } else {
        ty.fields
            .iter()
            .filter(|f| !has_required_args(f))
            .map(|f| (f.name.as_str(), f.field_type.base_name()))
            .collect()
    };

    let mut fields = Vec::new();
    for (name, base) in children {
        let nested = expand_fields(schema, base, visited);
        if nested.is_empty() {
            fields.push(name.to_string());
        } else {
            fields.push(format!("{}{{{}}}", name, nested.join(",")));
        }
    }

    visited.shift_remove(&ty.name);

    if fields.is_empty() {
        fields.push(TYPENAME_FIELD.to_string());
    }
    fields
}

fn has_required_args(field: &FieldDef) -> bool {
    field
        .arguments
        .iter()
        .any(|arg| arg.value_type.is_non_null() && !arg.has_default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{operation_name, print_definition};
    use graphql_parser::query::Definition;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_operation_text_for_root_field() {
        let schema = Schema::parse(indoc! {r#"
            type Query { hero(episode: Episode, limit: Int!): Hero }
            enum Episode { NEWHOPE }
            type Hero { name: String! appearsIn: [Episode]! stats: Stats }
            type Stats { height: Float }
        "#})
        .unwrap();
        let field = schema.query_type().field("hero").unwrap();
        let source =
            client_operation_from_field(&schema, OperationKind::Query, "hero", field).unwrap();
        assert_eq!(
            source,
            "query hero($episode:Episode,$limit:Int!){hero(episode:$episode,limit:$limit){name,appearsIn,stats{height}}}"
        );
    }

    #[test]
    fn test_scalar_root_field_has_no_selection() {
        let schema = Schema::parse("type Query { version: String }").unwrap();
        let field = schema.query_type().field("version").unwrap();
        let source =
            client_operation_from_field(&schema, OperationKind::Query, "version", field).unwrap();
        assert_eq!(source, "query version{version}");
    }

    #[test]
    fn test_self_referential_type_terminates() {
        let schema = Schema::parse(indoc! {r#"
            type Query { node: Node }
            type Node { id: ID! parent: Node children: [Node!]! peer: Peer }
            type Peer { node: Node }
        "#})
        .unwrap();
        let field = schema.query_type().field("node").unwrap();
        let source =
            client_operation_from_field(&schema, OperationKind::Query, "node", field).unwrap();
        assert_eq!(
            source,
            "query node{node{id,parent{__typename},children{__typename},peer{node{__typename}}}}"
        );
    }

    #[test]
    fn test_fields_with_required_arguments_are_skipped() {
        let schema = Schema::parse(indoc! {r#"
            type Query { user: User }
            type User { name: String avatar(size: Int!): String posts(first: Int): [String] }
        "#})
        .unwrap();
        let field = schema.query_type().field("user").unwrap();
        let source =
            client_operation_from_field(&schema, OperationKind::Query, "user", field).unwrap();
        assert_eq!(source, "query user{user{name,posts}}");
    }

    #[test]
    fn test_document_covers_every_root_field() {
        let schema = Schema::parse(indoc! {r#"
            type Query { hero: Hero version: String }
            type Mutation { hero(name: String!): Hero }
            type Hero { name: String }
        "#})
        .unwrap();
        let doc = create_document_from_server_schema(&schema).unwrap();

        let names: Vec<_> = doc
            .definitions
            .iter()
            .map(|def| match def {
                Definition::Operation(op) => operation_name(op).unwrap().to_string(),
                Definition::Fragment(_) => panic!("unexpected fragment"),
            })
            .collect();
        assert_eq!(names, vec!["hero", "version", "heroMutation"]);

        assert_eq!(
            print_definition(&doc.definitions[2]),
            indoc! {"
                mutation heroMutation($name: String!) {
                  hero(name: $name) {
                    __typename
                    name
                  }
                }"}
        );
    }
}
