//! schema resolution utilities
//!
//! stateless lookups of root types, field definitions, and type
//! relationships against a built [`Schema`].

use crate::error::{Error, Result};
use crate::schema::{FieldDef, Schema, TypeDef, TypeKind, TypeRef};
use serde::Serialize;
use std::fmt;

/// the three kinds of executable operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    pub const ALL: [OperationKind; 3] = [
        OperationKind::Query,
        OperationKind::Mutation,
        OperationKind::Subscription,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }

    /// capitalized form used in declaration names
    pub fn type_suffix(self) -> &'static str {
        match self {
            OperationKind::Query => "Query",
            OperationKind::Mutation => "Mutation",
            OperationKind::Subscription => "Subscription",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// root type an operation of `kind` executes against
pub fn operation_root_type(schema: &Schema, kind: OperationKind) -> Result<&TypeDef> {
    match kind {
        OperationKind::Query => Ok(schema.query_type()),
        OperationKind::Mutation => schema.mutation_type().ok_or_else(|| {
            Error::Configuration("schema is not configured for mutations".to_string())
        }),
        OperationKind::Subscription => schema.subscription_type().ok_or_else(|| {
            Error::Configuration("schema is not configured for subscriptions".to_string())
        }),
    }
}

/// definition of `field_name` selected on `parent_type`
///
/// meta-fields resolve too: `__schema` and `__type` on the query type,
/// `__typename` on any composite type. unions have no selectable fields of
/// their own, so anything but `__typename` on a union is `None`.
pub fn field_definition<'s>(
    schema: &'s Schema,
    parent_type: &'s TypeDef,
    field_name: &str,
) -> Option<&'s FieldDef> {
    let is_query_type = schema.query_type().name == parent_type.name;
    match field_name {
        "__schema" if is_query_type => return Some(&schema.meta.schema),
        "__type" if is_query_type => return Some(&schema.meta.type_),
        "__typename" if parent_type.is_composite() => return Some(&schema.meta.typename),
        _ => {}
    }

    match parent_type.kind {
        TypeKind::Object | TypeKind::Interface => parent_type.field(field_name),
        _ => None,
    }
}

/// true if the types are the same, or `sub_type` is an object type the
/// schema records as a possible type of the abstract `maybe_super_type`
pub fn is_type_proper_super_type_of(
    schema: &Schema,
    maybe_super_type: &TypeDef,
    sub_type: &TypeDef,
) -> bool {
    maybe_super_type.name == sub_type.name
        || (sub_type.kind == TypeKind::Object
            && maybe_super_type.is_abstract()
            && schema.is_possible_type(&maybe_super_type.name, &sub_type.name))
}

/// render a type reference, either fully (`[Foo!]!`) or as its base name
pub fn named_type_string(type_ref: &TypeRef, base_name: bool) -> Result<String> {
    match type_ref {
        TypeRef::Named(name) => Ok(name.clone()),
        TypeRef::List(inner) if base_name => named_type_string(inner, base_name),
        TypeRef::List(inner) => Ok(format!("[{}]", named_type_string(inner, base_name)?)),
        TypeRef::NonNull(inner) if inner.is_non_null() => Err(Error::Compiler(format!(
            "cannot find type name for `{type_ref}`: non-null wraps a non-null type"
        ))),
        TypeRef::NonNull(inner) if base_name => named_type_string(inner, base_name),
        TypeRef::NonNull(inner) => Ok(format!("{}!", named_type_string(inner, base_name)?)),
    }
}

/// root field located by [`operation_schema_def`]
#[derive(Debug, Clone, Copy)]
pub struct OperationSchemaDef<'s> {
    /// kind of the root type that declares the field
    pub kind: OperationKind,
    pub operation: &'s FieldDef,
    /// named type the field returns, if the schema defines it
    pub return_type: Option<&'s TypeDef>,
    pub full_return_type: &'s TypeRef,
}

/// find a root field named `operation_name` on the query, mutation, or
/// subscription type (in that order)
pub fn operation_schema_def<'s>(
    schema: &'s Schema,
    operation_name: &str,
) -> Result<Option<OperationSchemaDef<'s>>> {
    if operation_name.is_empty() {
        return Err(Error::Configuration(
            "operation name parameter is required".to_string(),
        ));
    }

    for kind in OperationKind::ALL {
        let Ok(root) = operation_root_type(schema, kind) else {
            continue;
        };
        if let Some(field) = root.fields.iter().find(|f| f.name == operation_name) {
            let named = named_type_string(&field.field_type, true)?;
            return Ok(Some(OperationSchemaDef {
                kind,
                operation: field,
                return_type: schema.type_named(&named),
                full_return_type: &field.field_type,
            }));
        }
    }

    Ok(None)
}
