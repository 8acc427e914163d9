//! typename injection
//!
//! rewrites a document so that every selection set on a non-root composite
//! type starts with a `__typename` selection. the parent type of each
//! selection set is carried down the recursion explicitly.

use crate::document::{self, Document, Field, Selection, SelectionSet};
use crate::error::Result;
use crate::resolve::{field_definition, operation_root_type};
use crate::schema::{Schema, TypeDef};
use graphql_parser::query::{Definition, TypeCondition};
use graphql_parser::Pos;

pub const TYPENAME_FIELD: &str = "__typename";

/// return a copy of `document` with `__typename` added where needed
///
/// running the pass on its own output is a no-op.
pub fn with_typename_field_added_where_needed(
    schema: &Schema,
    document: &Document,
) -> Result<Document> {
    let mut document = document.clone();
    for definition in &mut document.definitions {
        match definition {
            Definition::Operation(operation) => {
                let root = operation_root_type(schema, document::operation_kind(operation))?;
                add_typename(schema, Some(root), document::selection_set_mut(operation));
            }
            Definition::Fragment(fragment) => {
                let TypeCondition::On(name) = &fragment.type_condition;
                let parent = schema.type_named(name);
                add_typename(schema, parent, &mut fragment.selection_set);
            }
        }
    }
    Ok(document)
}

fn add_typename(schema: &Schema, parent: Option<&TypeDef>, selection_set: &mut SelectionSet) {
    for selection in &mut selection_set.items {
        match selection {
            Selection::Field(field) => {
                let field_type = parent
                    .and_then(|parent| field_definition(schema, parent, &field.name))
                    .and_then(|def| schema.type_named(def.field_type.base_name()));
                add_typename(schema, field_type, &mut field.selection_set);
            }
            Selection::InlineFragment(fragment) => {
                let condition = match &fragment.type_condition {
                    Some(TypeCondition::On(name)) => schema.type_named(name),
                    None => parent,
                };
                add_typename(schema, condition, &mut fragment.selection_set);
            }
            Selection::FragmentSpread(_) => {}
        }
    }

    // leaf fields carry an empty selection set
    if selection_set.items.is_empty() {
        return;
    }
    if parent.is_some_and(|parent| schema.is_operation_root_type(&parent.name)) {
        return;
    }

    match selection_set.items.iter().position(is_typename_selection) {
        Some(0) => {}
        Some(index) => {
            let existing = selection_set.items.remove(index);
            selection_set.items.insert(0, existing);
        }
        None => {
            let position = selection_set.span.0;
            selection_set
                .items
                .insert(0, Selection::Field(typename_field(position)));
        }
    }
}

fn is_typename_selection(selection: &Selection) -> bool {
    matches!(
        selection,
        Selection::Field(field)
            if field.name == TYPENAME_FIELD
                && field.alias.is_none()
                && field.directives.is_empty()
    )
}

fn typename_field(position: Pos) -> Field {
    Field {
        position,
        alias: None,
        name: TYPENAME_FIELD.to_string(),
        arguments: Vec::new(),
        directives: Vec::new(),
        selection_set: SelectionSet {
            span: (position, position),
            items: Vec::new(),
        },
    }
}
