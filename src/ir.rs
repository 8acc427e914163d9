//! intermediate representation
//!
//! the backend-agnostic compiled form of operations and fragments. every
//! text backend and the json serializer consume these records.

use crate::resolve::OperationKind;
use crate::schema::{Schema, TypeRef};
use crate::typename::TYPENAME_FIELD;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;

/// everything compiled from one document against one schema
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationContext<'s> {
    #[serde(skip)]
    pub schema: &'s Schema,
    pub operations: IndexMap<String, Operation>,
    pub fragments: IndexMap<String, Fragment>,
    /// enums, input objects, and custom scalars the document touches
    pub types_used: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub operation_name: String,
    pub operation_type: OperationKind,
    pub root_type: String,
    pub variables: Vec<Variable>,
    /// printed operation text
    pub source: String,
    pub fields: Vec<Field>,
    pub fragments_referenced: Vec<String>,
    /// operation text followed by every referenced fragment
    pub source_with_fragments: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fragment {
    pub fragment_name: String,
    pub source: String,
    pub type_condition: String,
    pub possible_types: Vec<String>,
    pub fields: Vec<Field>,
    pub fragment_spreads: Vec<String>,
    pub inline_fragments: Vec<InlineFragment>,
}

/// a selected field, with its sub-selection flattened
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// key of the field in the response (alias or name)
    pub response_name: String,
    pub field_name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// selected under `@skip` or `@include`
    pub is_conditional: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fragment_spreads: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inline_fragments: Vec<InlineFragment>,
}

/// fields that only apply when the object is of `type_condition`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineFragment {
    pub type_condition: String,
    pub possible_types: Vec<String>,
    /// the enclosing field's fields merged with the branch's own
    pub fields: Vec<Field>,
    pub fragment_spreads: Vec<String>,
}

/// one alternative shape of a polymorphic selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertySet<'a> {
    /// concrete type of the branch, `None` for the shared base shape
    pub type_condition: Option<&'a str>,
    pub fields: &'a [Field],
}

impl Field {
    pub fn is_typename(&self) -> bool {
        self.field_name == TYPENAME_FIELD
    }

    /// mutually exclusive shapes of this field's value
    ///
    /// empty when the selection does not diverge by type. otherwise one set
    /// per type condition, followed by the base shape when it selects more
    /// than `__typename` or when the branches leave possible types uncovered.
    pub fn property_sets(&self, schema: &Schema) -> Vec<PropertySet<'_>> {
        if self.inline_fragments.is_empty() {
            return Vec::new();
        }

        let mut sets: Vec<PropertySet<'_>> = self
            .inline_fragments
            .iter()
            .map(|fragment| PropertySet {
                type_condition: Some(&fragment.type_condition),
                fields: &fragment.fields,
            })
            .collect();

        let covered: HashSet<&str> = self
            .inline_fragments
            .iter()
            .flat_map(|fragment| fragment.possible_types.iter().map(String::as_str))
            .collect();
        let all_covered = schema
            .possible_types(self.type_ref.base_name())
            .iter()
            .all(|ty| covered.contains(ty));
        let has_own_fields = self.fields.iter().any(|field| !field.is_typename());

        if has_own_fields || !all_covered {
            sets.push(PropertySet {
                type_condition: None,
                fields: &self.fields,
            });
        }
        sets
    }
}

impl Fragment {
    /// the fragment's selection as a non-null field of its type condition
    pub fn to_field(&self) -> Field {
        Field {
            response_name: self.fragment_name.clone(),
            field_name: self.fragment_name.clone(),
            type_ref: TypeRef::non_null(TypeRef::named(self.type_condition.clone())),
            description: None,
            is_conditional: false,
            fields: self.fields.clone(),
            fragment_spreads: self.fragment_spreads.clone(),
            inline_fragments: self.inline_fragments.clone(),
        }
    }
}

/// merge `field` into `fields`, combining selections that share a response name
pub(crate) fn merge_field(fields: &mut Vec<Field>, field: Field) {
    let Some(existing) = fields
        .iter_mut()
        .find(|f| f.response_name == field.response_name)
    else {
        fields.push(field);
        return;
    };

    existing.is_conditional = existing.is_conditional && field.is_conditional;
    for child in field.fields {
        merge_field(&mut existing.fields, child);
    }
    for spread in field.fragment_spreads {
        if !existing.fragment_spreads.contains(&spread) {
            existing.fragment_spreads.push(spread);
        }
    }
    for fragment in field.inline_fragments {
        match existing
            .inline_fragments
            .iter_mut()
            .find(|f| f.type_condition == fragment.type_condition)
        {
            Some(target) => {
                for child in fragment.fields {
                    merge_field(&mut target.fields, child);
                }
            }
            None => existing.inline_fragments.push(fragment),
        }
    }
}
