//! flow declarations
//!
//! every composite selection becomes its own exact object type, named by
//! the scope path that leads to it (`HeroNameQuery_hero`).

use super::{
    properties, property_set_typenames, render_type, string_literal_union, TargetContext,
    GENERATED_HEADER,
};
use crate::codegen::CodeGenerator;
use crate::error::Result;
use crate::ir::{Field, Operation};
use crate::schema::{TypeDef, TypeKind, TypeRef};

type Gen<'a> = CodeGenerator<TargetContext<'a>>;

pub(crate) fn generate_source(context: TargetContext<'_>) -> Result<String> {
    let mut gen = CodeGenerator::new(context);
    gen.print("/* @flow */");
    gen.print_on_newline(GENERATED_HEADER);

    for ty in context.types_used(TypeKind::Enum) {
        enum_declaration(&mut gen, ty)?;
    }
    for ty in context.types_used(TypeKind::InputObject) {
        declaration(&mut gen, &ty.name, ty.description.as_deref(), |gen| {
            for field in &ty.input_fields {
                input_property(gen, &field.name, &field.value_type)?;
            }
            Ok(())
        })?;
    }
    for operation in context.ir.operations.values() {
        operation_declarations(&mut gen, operation)?;
    }
    for fragment in context.ir.fragments.values() {
        let field = fragment.to_field();
        gen.with_scope(format!("{}Fragment", fragment.fragment_name), |gen| {
            selection_declarations(gen, &field)
        })?;
    }

    gen.print_newline();
    Ok(gen.into_output())
}

fn begin_declaration(gen: &mut Gen<'_>, description: Option<&str>) {
    gen.print_newline_if_needed();
    gen.print_newline();
    for line in description.into_iter().flat_map(str::lines) {
        gen.print(&format!("// {}", line.trim()));
        gen.print_newline();
    }
}

/// `export type <name> = {| ... |};`
fn declaration<'a, F>(gen: &mut Gen<'a>, name: &str, description: Option<&str>, body: F) -> Result<()>
where
    F: FnOnce(&mut Gen<'a>) -> Result<()>,
{
    begin_declaration(gen, description);
    gen.print(&format!("export type {name} ="));
    gen.within_block_with(" {|", "|};", body)
}

fn enum_declaration(gen: &mut Gen<'_>, ty: &TypeDef) -> Result<()> {
    begin_declaration(gen, ty.description.as_deref());
    gen.print(&format!("export type {} =", ty.name));
    if ty.values.is_empty() {
        gen.print(" empty;");
        return Ok(());
    }

    let last = ty.values.len() - 1;
    gen.with_indent(|gen| {
        for (i, value) in ty.values.iter().enumerate() {
            let separator = if i == last { ";" } else { " |" };
            gen.print_on_newline(&format!("\"{}\"{separator}", value.name));
        }
        Ok(())
    })
}

fn operation_declarations(gen: &mut Gen<'_>, operation: &Operation) -> Result<()> {
    let name = format!(
        "{}{}",
        operation.operation_name,
        operation.operation_type.type_suffix()
    );

    if !operation.variables.is_empty() {
        declaration(gen, &format!("{name}Variables"), None, |gen| {
            for variable in &operation.variables {
                input_property(gen, &variable.name, &variable.type_ref)?;
            }
            Ok(())
        })?;
    }

    gen.with_scope(name, |gen| {
        object_declarations(gen, &operation.root_type, &operation.fields, None)
    })
}

/// the object type for the current scope, then one per nested selection
fn object_declarations(
    gen: &mut Gen<'_>,
    parent_type: &str,
    fields: &[Field],
    typenames: Option<&[&str]>,
) -> Result<()> {
    let name = gen.scoped_name("_");
    declaration(gen, &name, None, |gen| {
        property_declarations(gen, parent_type, fields, typenames)
    })?;

    let schema = gen.context().schema();
    for property in properties(schema, fields, str::to_string) {
        if property.is_composite() {
            let field = property.field;
            gen.with_scope(field.response_name.clone(), |gen| selection_declarations(gen, field))?;
        }
    }
    Ok(())
}

/// declarations for the selection of `field`, whose scope is already pushed
fn selection_declarations(gen: &mut Gen<'_>, field: &Field) -> Result<()> {
    let schema = gen.context().schema();
    let sets = field.property_sets(schema);
    if sets.is_empty() {
        return object_declarations(gen, field.type_ref.base_name(), &field.fields, None);
    }

    let name = gen.scoped_name("_");
    let alternatives: Vec<String> = sets
        .iter()
        .map(|set| {
            let condition = set.type_condition.unwrap_or(field.type_ref.base_name());
            format!("{name}_{condition}")
        })
        .collect();
    begin_declaration(gen, None);
    gen.print(&format!("export type {name} = {};", alternatives.join(" | ")));

    for set in &sets {
        let condition = set.type_condition.unwrap_or(field.type_ref.base_name());
        let typenames = property_set_typenames(schema, field, set);
        gen.with_scope(condition, |gen| {
            object_declarations(gen, condition, set.fields, Some(typenames.as_slice()))
        })?;
    }
    Ok(())
}

fn property_declarations(
    gen: &mut Gen<'_>,
    parent_type: &str,
    fields: &[Field],
    typenames: Option<&[&str]>,
) -> Result<()> {
    let context = *gen.context();
    let schema = context.schema();

    for property in properties(schema, fields, str::to_string) {
        let field = property.field;
        if let Some(description) = field.description.as_ref().filter(|_| !field.is_typename()) {
            for line in description.lines() {
                gen.print_on_newline(&format!("// {}", line.trim()));
            }
        }

        let rendered = if field.is_typename() {
            match typenames {
                Some(names) => string_literal_union(names, "string"),
                None => string_literal_union(&schema.possible_types(parent_type), "string"),
            }
        } else if property.is_composite() {
            let leaf = format!("{}_{}", gen.scoped_name("_"), field.response_name);
            render_flow_type(&field.type_ref, &leaf)?
        } else {
            let leaf = leaf_type_name(&context, field.type_ref.base_name());
            render_flow_type(&field.type_ref, &leaf)?
        };
        gen.print_on_newline(&format!("{}: {rendered},", property.output_name));
    }
    Ok(())
}

fn input_property(gen: &mut Gen<'_>, name: &str, type_ref: &TypeRef) -> Result<()> {
    let context = *gen.context();
    let leaf = leaf_type_name(&context, type_ref.base_name());
    let rendered = render_flow_type(type_ref, &leaf)?;
    let optional = if type_ref.is_non_null() { "" } else { "?" };
    gen.print_on_newline(&format!("{name}{optional}: {rendered},"));
    Ok(())
}

fn builtin_scalar(name: &str) -> Option<&'static str> {
    match name {
        "String" | "ID" => Some("string"),
        "Int" | "Float" => Some("number"),
        "Boolean" => Some("boolean"),
        _ => None,
    }
}

fn leaf_type_name(context: &TargetContext<'_>, name: &str) -> String {
    match context.schema().type_named(name).map(|ty| ty.kind) {
        Some(TypeKind::Scalar) | None => context.scalar_name(name, builtin_scalar, "string"),
        Some(_) => name.to_string(),
    }
}

fn render_flow_type(type_ref: &TypeRef, leaf: &str) -> Result<String> {
    render_type(
        type_ref,
        leaf,
        &|inner| format!("Array<{inner}>"),
        &|inner| format!("?{inner}"),
    )
}
