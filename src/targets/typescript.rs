//! typescript declarations
//!
//! composite selections are written as inline object types. polymorphic
//! selections get one named declaration per property set, each tagged with
//! a literal `__typename`, and the field refers to their union.

use super::{
    properties, property_set_typenames, render_type, string_literal_union, TargetContext,
    GENERATED_HEADER,
};
use crate::codegen::CodeGenerator;
use crate::error::Result;
use crate::ir::{Field, Fragment, Operation, PropertySet};
use crate::resolve::{operation_root_type, operation_schema_def, OperationKind};
use crate::schema::{TypeDef, TypeKind, TypeRef};
use heck::ToUpperCamelCase;

type Gen<'a> = CodeGenerator<TargetContext<'a>>;

/// stands in for an inline object while rendering its wrappers
const OBJECT_SLOT: &str = "$object";

pub(crate) fn generate_source(context: TargetContext<'_>) -> Result<String> {
    let mut gen = CodeGenerator::new(context);
    gen.print("/* tslint:disable */");
    gen.print_on_newline(GENERATED_HEADER);

    for ty in context.types_used(TypeKind::Enum) {
        enum_declaration(&mut gen, ty)?;
    }
    for ty in context.types_used(TypeKind::InputObject) {
        input_object_declaration(&mut gen, ty)?;
    }
    for operation in context.ir.operations.values() {
        operation_declarations(&mut gen, operation)?;
    }
    for fragment in context.ir.fragments.values() {
        fragment_declarations(&mut gen, fragment)?;
    }
    if context.synthesized {
        operations_interfaces(&mut gen)?;
    }

    gen.print_newline();
    Ok(gen.into_output())
}

fn declaration_name(context: &TargetContext<'_>, name: &str) -> String {
    if context.options.pascal_case {
        name.to_upper_camel_case()
    } else {
        name.to_string()
    }
}

fn begin_declaration(gen: &mut Gen<'_>, description: Option<&str>) {
    gen.print_newline_if_needed();
    gen.print_newline();
    for line in description.into_iter().flat_map(str::lines) {
        gen.print(&format!("// {}", line.trim()));
        gen.print_newline();
    }
}

/// `export type <name> = { ... };` or `export interface <name> { ... }`
fn interface_declaration<'a, F>(
    gen: &mut Gen<'a>,
    name: &str,
    description: Option<&str>,
    body: F,
) -> Result<()>
where
    F: FnOnce(&mut Gen<'a>) -> Result<()>,
{
    begin_declaration(gen, description);
    if gen.context().options.prefer_interfaces {
        gen.print(&format!("export interface {name}"));
        gen.within_block(body)
    } else {
        gen.print(&format!("export type {name} ="));
        gen.within_block(body)?;
        gen.print(";");
        Ok(())
    }
}

fn enum_declaration(gen: &mut Gen<'_>, ty: &TypeDef) -> Result<()> {
    let name = declaration_name(gen.context(), &ty.name);
    begin_declaration(gen, ty.description.as_deref());
    gen.print(&format!("export type {name} ="));
    if ty.values.is_empty() {
        gen.print(" never;");
        return Ok(());
    }

    let last = ty.values.len() - 1;
    gen.with_indent(|gen| {
        for (i, value) in ty.values.iter().enumerate() {
            let separator = if i == last { ";" } else { " |" };
            if let Some(description) = &value.description {
                gen.print_on_newline(&format!("// {}", description.trim()));
            }
            gen.print_on_newline(&format!("\"{}\"{separator}", value.name));
        }
        Ok(())
    })
}

fn input_object_declaration(gen: &mut Gen<'_>, ty: &TypeDef) -> Result<()> {
    let name = declaration_name(gen.context(), &ty.name);
    interface_declaration(gen, &name, ty.description.as_deref(), |gen| {
        for field in &ty.input_fields {
            input_property(gen, &field.name, &field.value_type, field.description.as_deref())?;
        }
        Ok(())
    })
}

fn operation_declarations(gen: &mut Gen<'_>, operation: &Operation) -> Result<()> {
    let context = *gen.context();
    let base = format!(
        "{}{}",
        operation.operation_name,
        operation.operation_type.type_suffix()
    );

    if !operation.variables.is_empty() {
        let name = declaration_name(&context, &format!("{base}Variables"));
        interface_declaration(gen, &name, None, |gen| {
            for variable in &operation.variables {
                input_property(gen, &variable.name, &variable.type_ref, None)?;
            }
            Ok(())
        })?;
    }

    let name = declaration_name(&context, &base);
    gen.with_scope(base, |gen| {
        alternative_declarations(gen, &operation.fields)?;
        interface_declaration(gen, &name, None, |gen| {
            property_declarations(gen, &operation.root_type, &operation.fields, None)
        })
    })
}

fn fragment_declarations(gen: &mut Gen<'_>, fragment: &Fragment) -> Result<()> {
    let context = *gen.context();
    let schema = context.schema();
    let base = format!("{}Fragment", fragment.fragment_name);
    let name = declaration_name(&context, &base);
    let field = fragment.to_field();
    let sets = field.property_sets(schema);

    gen.with_scope(base, |gen| {
        if sets.is_empty() {
            alternative_declarations(gen, &field.fields)?;
            return interface_declaration(gen, &name, None, |gen| {
                property_declarations(gen, &fragment.type_condition, &field.fields, None)
            });
        }

        let mut alternatives = Vec::new();
        for set in &sets {
            alternatives.push(set_declaration(gen, &field, set)?);
        }
        begin_declaration(gen, None);
        gen.print(&format!("export type {name} = {};", alternatives.join(" | ")));
        Ok(())
    })
}

/// named declarations for every property set below `fields`, innermost first
fn alternative_declarations(gen: &mut Gen<'_>, fields: &[Field]) -> Result<()> {
    let schema = gen.context().schema();
    for property in properties(schema, fields, str::to_string) {
        if !property.is_composite() {
            continue;
        }
        let field = property.field;
        gen.with_scope(field.response_name.clone(), |gen| {
            let sets = property.property_sets(schema);
            if sets.is_empty() {
                return alternative_declarations(gen, &field.fields);
            }
            for set in &sets {
                set_declaration(gen, field, set)?;
            }
            Ok(())
        })?;
    }
    Ok(())
}

/// declare one property set of `field`, returning the declaration name
fn set_declaration(gen: &mut Gen<'_>, field: &Field, set: &PropertySet<'_>) -> Result<String> {
    let context = *gen.context();
    let schema = context.schema();
    let condition = set.type_condition.unwrap_or(field.type_ref.base_name());
    let typenames = property_set_typenames(schema, field, set);

    let mut name = String::new();
    gen.with_scope(condition, |gen| {
        alternative_declarations(gen, set.fields)?;
        name = declaration_name(&context, &gen.scoped_name("_"));
        interface_declaration(gen, &name, None, |gen| {
            property_declarations(gen, condition, set.fields, Some(typenames.as_slice()))
        })
    })?;
    Ok(name)
}

/// names of the property-set declarations of the field in scope `scope`
fn alternative_names(
    context: &TargetContext<'_>,
    scope: &str,
    field: &Field,
    sets: &[PropertySet<'_>],
) -> Vec<String> {
    sets.iter()
        .map(|set| {
            let condition = set.type_condition.unwrap_or(field.type_ref.base_name());
            declaration_name(context, &format!("{scope}_{condition}"))
        })
        .collect()
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

        if field.is_typename() {
            let literal = match typenames {
                Some(names) => string_literal_union(names, "string"),
                None => string_literal_union(&schema.possible_types(parent_type), "string"),
            };
            gen.print_on_newline(&format!("{}: {literal},", property.output_name));
            continue;
        }

        if !property.is_composite() {
            let leaf = leaf_type_name(&context, field.type_ref.base_name());
            let rendered = render_ts_type(&field.type_ref, &leaf)?;
            gen.print_on_newline(&format!("{}: {rendered},", property.output_name));
            continue;
        }

        let sets = property.property_sets(schema);
        if !sets.is_empty() {
            let scope = format!("{}_{}", gen.scoped_name("_"), field.response_name);
            let names = alternative_names(&context, &scope, field, &sets);
            let rendered = render_ts_type(&field.type_ref, &names.join(" | "))?;
            gen.print_on_newline(&format!("{}: {rendered},", property.output_name));
            continue;
        }

        let rendered = render_ts_type(&field.type_ref, OBJECT_SLOT)?;
        let (open, close) = rendered.split_once(OBJECT_SLOT).unwrap_or(("", ""));
        gen.print_on_newline(&format!("{}: {open}", property.output_name));
        let nested_parent = field.type_ref.base_name();
        gen.with_scope(field.response_name.clone(), |gen| {
            gen.within_block_with("{", "}", |gen| {
                property_declarations(gen, nested_parent, &field.fields, None)
            })
        })?;
        gen.print(&format!("{close},"));
    }
    Ok(())
}

fn input_property(
    gen: &mut Gen<'_>,
    name: &str,
    type_ref: &TypeRef,
    description: Option<&str>,
) -> Result<()> {
    let context = *gen.context();
    for line in description.into_iter().flat_map(str::lines) {
        gen.print_on_newline(&format!("// {}", line.trim()));
    }
    let leaf = leaf_type_name(&context, type_ref.base_name());
    let rendered = render_ts_type(type_ref, &leaf)?;
    let optional = if type_ref.is_non_null() { "" } else { "?" };
    gen.print_on_newline(&format!("{name}{optional}: {rendered},"));
    Ok(())
}

/// `<Kind>Operations` interfaces listing every synthesized root field
fn operations_interfaces(gen: &mut Gen<'_>) -> Result<()> {
    let context = *gen.context();
    let schema = context.schema();

    for kind in OperationKind::ALL {
        let operations: Vec<&Operation> = context
            .ir
            .operations
            .values()
            .filter(|op| op.operation_type == kind)
            .collect();
        if operations.is_empty() {
            continue;
        }

        begin_declaration(gen, None);
        gen.print(&format!("export interface {}Operations", kind.type_suffix()));
        gen.within_block(|gen| {
            for operation in operations {
                let Some(root_field) = operation.fields.first() else {
                    continue;
                };
                let definition = match operation_schema_def(schema, &root_field.field_name)? {
                    Some(def) if def.kind == kind => Some(def.operation),
                    _ => operation_root_type(schema, kind)?.field(&root_field.field_name),
                };
                let Some(definition) = definition else {
                    continue;
                };

                let mut args = Vec::new();
                for arg in &definition.arguments {
                    let leaf = leaf_type_name(&context, arg.value_type.base_name());
                    args.push(format!("{}: {}", arg.name, render_ts_type(&arg.value_type, &leaf)?));
                }
                let result = declaration_name(
                    &context,
                    &format!("{}{}", operation.operation_name, kind.type_suffix()),
                );
                gen.print_on_newline(&format!(
                    "{}({}): {result}[\"{}\"],",
                    definition.name,
                    args.join(", "),
                    root_field.response_name
                ));
            }
            Ok(())
        })?;
    }
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
        Some(TypeKind::Enum | TypeKind::InputObject) => declaration_name(context, name),
        Some(_) => name.to_string(),
    }
}

fn render_ts_type(type_ref: &TypeRef, leaf: &str) -> Result<String> {
    render_type(
        type_ref,
        leaf,
        &|inner| format!("Array<{inner}>"),
        &|inner| format!("{inner} | null"),
    )
}
