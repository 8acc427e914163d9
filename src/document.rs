//! executable document helpers
//!
//! owned aliases over graphql-parser's query ast plus accessors that treat
//! the four operation shapes uniformly.

use crate::error::{Error, Result};
use crate::resolve::OperationKind;
use graphql_parser::query::{self, OperationDefinition, TypeCondition};
use graphql_parser::Pos;
use std::path::Path;

pub type Document = query::Document<'static, String>;
pub type Definition = query::Definition<'static, String>;
pub type Operation = query::OperationDefinition<'static, String>;
pub type FragmentDefinition = query::FragmentDefinition<'static, String>;
pub type SelectionSet = query::SelectionSet<'static, String>;
pub type Selection = query::Selection<'static, String>;
pub type Field = query::Field<'static, String>;
pub type VariableDefinition = query::VariableDefinition<'static, String>;

/// parse executable graphql text into an owned document
pub fn parse_document(source: &str, path: Option<&Path>) -> Result<Document> {
    graphql_parser::parse_query::<String>(source)
        .map(|doc| doc.into_static())
        .map_err(|err| Error::parse(path.map(Path::to_path_buf), err))
}

/// concatenate the definitions of several documents
pub fn concat_documents(documents: impl IntoIterator<Item = Document>) -> Document {
    Document {
        definitions: documents
            .into_iter()
            .flat_map(|doc| doc.definitions)
            .collect(),
    }
}

pub fn operation_kind(operation: &Operation) -> OperationKind {
    match operation {
        OperationDefinition::SelectionSet(_) | OperationDefinition::Query(_) => {
            OperationKind::Query
        }
        OperationDefinition::Mutation(_) => OperationKind::Mutation,
        OperationDefinition::Subscription(_) => OperationKind::Subscription,
    }
}

pub fn operation_name(operation: &Operation) -> Option<&str> {
    match operation {
        OperationDefinition::SelectionSet(_) => None,
        OperationDefinition::Query(q) => q.name.as_deref(),
        OperationDefinition::Mutation(m) => m.name.as_deref(),
        OperationDefinition::Subscription(s) => s.name.as_deref(),
    }
}

pub fn operation_position(operation: &Operation) -> Pos {
    match operation {
        OperationDefinition::SelectionSet(set) => set.span.0,
        OperationDefinition::Query(q) => q.position,
        OperationDefinition::Mutation(m) => m.position,
        OperationDefinition::Subscription(s) => s.position,
    }
}

pub fn variable_definitions(operation: &Operation) -> &[VariableDefinition] {
    match operation {
        OperationDefinition::SelectionSet(_) => &[],
        OperationDefinition::Query(q) => &q.variable_definitions,
        OperationDefinition::Mutation(m) => &m.variable_definitions,
        OperationDefinition::Subscription(s) => &s.variable_definitions,
    }
}

pub fn selection_set(operation: &Operation) -> &SelectionSet {
    match operation {
        OperationDefinition::SelectionSet(set) => set,
        OperationDefinition::Query(q) => &q.selection_set,
        OperationDefinition::Mutation(m) => &m.selection_set,
        OperationDefinition::Subscription(s) => &s.selection_set,
    }
}

pub fn selection_set_mut(operation: &mut Operation) -> &mut SelectionSet {
    match operation {
        OperationDefinition::SelectionSet(set) => set,
        OperationDefinition::Query(q) => &mut q.selection_set,
        OperationDefinition::Mutation(m) => &mut m.selection_set,
        OperationDefinition::Subscription(s) => &mut s.selection_set,
    }
}

pub fn type_condition_name<'d>(condition: &'d TypeCondition<'static, String>) -> &'d str {
    match condition {
        TypeCondition::On(name) => name,
    }
}

/// print a single definition the way graphql-parser formats documents
pub fn print_definition(definition: &Definition) -> String {
    let document = Document {
        definitions: vec![definition.clone()],
    };
    document.to_string().trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_accessors() {
        let doc = parse_document("mutation Add($n: Int) { add(n: $n) } { a }", None).unwrap();
        let query::Definition::Operation(first) = &doc.definitions[0] else {
            panic!("expected operation");
        };
        assert_eq!(operation_kind(first), OperationKind::Mutation);
        assert_eq!(operation_name(first), Some("Add"));
        assert_eq!(variable_definitions(first).len(), 1);
        assert_eq!(selection_set(first).items.len(), 1);

        let query::Definition::Operation(second) = &doc.definitions[1] else {
            panic!("expected operation");
        };
        assert_eq!(operation_kind(second), OperationKind::Query);
        assert_eq!(operation_name(second), None);
    }

    #[test]
    fn test_parse_error_names_path() {
        let err = parse_document("{ a ", Some(Path::new("broken.graphql"))).unwrap_err();
        assert!(err.to_string().starts_with("failed to parse broken.graphql"));
    }

    #[test]
    fn test_print_definition() {
        let doc = parse_document("query Hero { hero { name } }", None).unwrap();
        assert_eq!(
            print_definition(&doc.definitions[0]),
            "query Hero {\n  hero {\n    name\n  }\n}"
        );
    }
}
