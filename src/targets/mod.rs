//! backend generators
//!
//! each backend turns a [`CompilationContext`] into one text artifact. the
//! property model and naming helpers below are shared by the text backends.

mod flow;
mod json;
mod swift;
mod typescript;

pub(crate) use flow::generate_source as generate_flow_source;
pub(crate) use json::serialize_to_json;
pub(crate) use swift::generate_source as generate_swift_source;
pub(crate) use typescript::generate_source as generate_typescript_source;

use crate::config::CodegenOptions;
use crate::error::{Error, Result};
use crate::ir::{CompilationContext, Field, PropertySet};
use crate::schema::{Schema, TypeDef, TypeKind, TypeRef};

/// first line of every generated text artifact
pub(crate) const GENERATED_HEADER: &str =
    "//  This file was automatically generated and should not be edited.";

/// inputs shared by one backend invocation
#[derive(Debug, Clone, Copy)]
pub(crate) struct TargetContext<'a> {
    pub(crate) ir: &'a CompilationContext<'a>,
    pub(crate) options: &'a CodegenOptions,
    /// operations were synthesized from the schema, not loaded
    pub(crate) synthesized: bool,
}

impl<'a> TargetContext<'a> {
    pub(crate) fn schema(&self) -> &'a Schema {
        self.ir.schema
    }

    /// used types of `kind`, in first-use order
    pub(crate) fn types_used(&self, kind: TypeKind) -> impl Iterator<Item = &'a TypeDef> + 'a {
        let schema = self.ir.schema;
        self.ir
            .types_used
            .iter()
            .filter_map(move |name| schema.type_named(name))
            .filter(move |ty| ty.kind == kind)
    }

    /// target name for a scalar, given the backend's built-in mapping
    pub(crate) fn scalar_name(
        &self,
        name: &str,
        built_in: fn(&str) -> Option<&'static str>,
        fallback: &str,
    ) -> String {
        match built_in(name) {
            Some(mapped) => mapped.to_string(),
            None if self.options.passthrough_custom_scalars => {
                format!("{}{}", self.options.custom_scalars_prefix, name)
            }
            None => fallback.to_string(),
        }
    }
}

/// a selected field as the text backends see it
#[derive(Debug, Clone)]
pub(crate) struct Property<'a> {
    pub(crate) field: &'a Field,
    /// identifier in the generated code
    pub(crate) output_name: String,
    pub(crate) type_def: Option<&'a TypeDef>,
}

impl<'a> Property<'a> {
    pub(crate) fn new(schema: &'a Schema, field: &'a Field, output_name: String) -> Self {
        Self {
            field,
            output_name,
            type_def: schema.type_named(field.type_ref.base_name()),
        }
    }

    /// key of the value in the response map
    pub(crate) fn wire_name(&self) -> &'a str {
        &self.field.response_name
    }

    pub(crate) fn is_list(&self) -> bool {
        self.field.type_ref.is_list()
    }

    /// needs a nested declaration instead of a scalar mapping
    pub(crate) fn is_composite(&self) -> bool {
        self.type_def.is_some_and(TypeDef::is_composite)
    }

    pub(crate) fn property_sets(&self, schema: &Schema) -> Vec<PropertySet<'a>> {
        self.field.property_sets(schema)
    }
}

/// properties for `fields`, named by `output_name`
pub(crate) fn properties<'a>(
    schema: &'a Schema,
    fields: &'a [Field],
    output_name: fn(&str) -> String,
) -> Vec<Property<'a>> {
    fields
        .iter()
        .map(|field| Property::new(schema, field, output_name(&field.response_name)))
        .collect()
}

/// render `type_ref` with `wrap_list` and `wrap_nullable` applied per layer
pub(crate) fn render_type(
    type_ref: &TypeRef,
    leaf: &str,
    wrap_list: &dyn Fn(String) -> String,
    wrap_nullable: &dyn Fn(String) -> String,
) -> Result<String> {
    render_layer(type_ref, leaf, true, wrap_list, wrap_nullable)
}

fn render_layer(
    type_ref: &TypeRef,
    leaf: &str,
    nullable: bool,
    wrap_list: &dyn Fn(String) -> String,
    wrap_nullable: &dyn Fn(String) -> String,
) -> Result<String> {
    let rendered = match type_ref {
        TypeRef::NonNull(inner) if inner.is_non_null() => {
            return Err(Error::Compiler(format!(
                "cannot generate type for `{type_ref}`: non-null wraps a non-null type"
            )))
        }
        TypeRef::NonNull(inner) => {
            return render_layer(inner, leaf, false, wrap_list, wrap_nullable)
        }
        TypeRef::List(inner) => wrap_list(render_layer(inner, leaf, true, wrap_list, wrap_nullable)?),
        TypeRef::Named(_) => leaf.to_string(),
    };
    Ok(if nullable {
        wrap_nullable(rendered)
    } else {
        rendered
    })
}

/// upper-case the first character and keep the rest
pub(crate) fn upper_first(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `"Human" | "Droid"`, or `fallback` when there are no names
pub(crate) fn string_literal_union(names: &[&str], fallback: &str) -> String {
    if names.is_empty() {
        return fallback.to_string();
    }
    names
        .iter()
        .map(|name| format!("\"{name}\""))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// possible types of `set`, or the uncovered ones for the base set
pub(crate) fn property_set_typenames<'a>(
    schema: &'a Schema,
    field: &'a Field,
    set: &PropertySet<'a>,
) -> Vec<&'a str> {
    match set.type_condition {
        Some(condition) => field
            .inline_fragments
            .iter()
            .find(|fragment| fragment.type_condition == condition)
            .map(|fragment| fragment.possible_types.iter().map(String::as_str).collect())
            .unwrap_or_default(),
        None => schema
            .possible_types(field.type_ref.base_name())
            .into_iter()
            .filter(|ty| {
                !field
                    .inline_fragments
                    .iter()
                    .any(|fragment| fragment.possible_types.iter().any(|p| p == ty))
            })
            .collect(),
    }
}
