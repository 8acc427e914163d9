//! swift declarations
//!
//! one `GraphQLQuery`/`GraphQLMutation`/`GraphQLSubscription` class per
//! operation with a nested `Data` struct mirroring the selection. structs
//! decode themselves from a `GraphQLMap`; polymorphic selections become an
//! enum that switches on `__typename`.

use super::{
    properties, property_set_typenames, render_type, upper_first, Property, TargetContext,
    GENERATED_HEADER,
};
use crate::codegen::CodeGenerator;
use crate::error::Result;
use crate::ir::{Field, Operation, PropertySet};
use crate::schema::{TypeDef, TypeKind, TypeRef};
use crate::typename::TYPENAME_FIELD;
use heck::ToLowerCamelCase;

type Gen<'a> = CodeGenerator<TargetContext<'a>>;

const KEYWORDS: &[&str] = &[
    "associatedtype", "class", "deinit", "enum", "extension", "fileprivate", "func", "import",
    "init", "inout", "internal", "let", "open", "operator", "private", "protocol", "public",
    "rethrows", "static", "struct", "subscript", "typealias", "var", "break", "case", "continue",
    "default", "defer", "do", "else", "fallthrough", "for", "guard", "if", "in", "repeat",
    "return", "switch", "where", "while", "as", "catch", "false", "is", "nil", "super", "self",
    "Self", "throw", "throws", "true", "try",
];

pub(crate) fn generate_source(context: TargetContext<'_>) -> Result<String> {
    let mut gen = CodeGenerator::new(context);
    gen.print(GENERATED_HEADER);
    gen.print_newline_if_needed();
    gen.print_on_newline("import Apollo");

    for operation in context.ir.operations.values() {
        class_declaration(&mut gen, operation)?;
    }
    for ty in context.types_used(TypeKind::Enum) {
        enum_declaration(&mut gen, ty)?;
    }
    for ty in context.types_used(TypeKind::InputObject) {
        input_struct_declaration(&mut gen, ty)?;
    }

    gen.print_newline();
    Ok(gen.into_output())
}

/// backtick-quote names that collide with swift keywords
fn escape_identifier(name: &str) -> String {
    if KEYWORDS.contains(&name) {
        format!("`{name}`")
    } else {
        name.to_string()
    }
}

fn escape_string(line: &str) -> String {
    line.replace('\\', "\\\\").replace('"', "\\\"")
}

fn class_declaration(gen: &mut Gen<'_>, operation: &Operation) -> Result<()> {
    let context = *gen.context();
    let kind = operation.operation_type.type_suffix();
    let class_name = format!("{}{kind}", upper_first(&operation.operation_name));

    gen.print_newline_if_needed();
    gen.print_on_newline(&format!("public final class {class_name}: GraphQL{kind}"));
    gen.within_block(|gen| {
        gen.print_on_newline("public static let operationString =");
        let lines: Vec<&str> = operation.source_with_fragments.lines().collect();
        gen.with_indent(|gen| {
            for (i, line) in lines.iter().enumerate() {
                let joiner = if i + 1 == lines.len() { "" } else { " +" };
                gen.print_on_newline(&format!("\"{}\"{joiner}", escape_string(line)));
            }
            Ok(())
        })?;

        let mut parameters = Vec::new();
        let mut assignments = Vec::new();
        let mut entries = Vec::new();
        if !operation.variables.is_empty() {
            gen.print_newline_if_needed();
        }
        for variable in &operation.variables {
            let name = escape_identifier(&variable.name);
            let ty = input_type_name(&context, &variable.type_ref)?;
            gen.print_on_newline(&format!("public let {name}: {ty}"));

            let default = if variable.type_ref.is_non_null() { "" } else { " = nil" };
            parameters.push(format!("{name}: {ty}{default}"));
            assignments.push(format!("self.{name} = {name}"));
            entries.push(format!("\"{}\": {name}", variable.name));
        }

        gen.print_newline_if_needed();
        gen.print_on_newline(&format!("public init({})", parameters.join(", ")));
        gen.within_block(|gen| {
            for assignment in &assignments {
                gen.print_on_newline(assignment);
            }
            Ok(())
        })?;

        if !entries.is_empty() {
            gen.print_newline_if_needed();
            gen.print_on_newline("public var variables: GraphQLMap?");
            gen.within_block(|gen| {
                gen.print_on_newline(&format!("return [{}]", entries.join(", ")));
                Ok(())
            })?;
        }

        struct_declaration(gen, "Data", &operation.fields)
    })
}

/// struct with one stored property per field and a decoding initializer
fn struct_declaration(gen: &mut Gen<'_>, name: &str, fields: &[Field]) -> Result<()> {
    let context = *gen.context();
    let properties = properties(context.schema(), fields, escape_identifier);

    gen.print_newline_if_needed();
    gen.print_on_newline(&format!("public struct {name}: GraphQLMapConvertible"));
    gen.within_block(|gen| {
        for property in &properties {
            let field = property.field;
            if let Some(description) = field.description.as_ref().filter(|_| !field.is_typename()) {
                gen.print_on_newline(&format!("/// {}", description.trim()));
            }
            let ty = property_type_name(&context, property)?;
            gen.print_on_newline(&format!("public let {}: {ty}", property.output_name));
        }

        gen.print_newline_if_needed();
        gen.print_on_newline("public init(map: GraphQLMap) throws");
        gen.within_block(|gen| {
            for property in &properties {
                let accessor = if property.is_list() { "list" } else { "value" };
                gen.print_on_newline(&format!(
                    "{} = try map.{accessor}(forKey: \"{}\")",
                    property.output_name,
                    property.wire_name()
                ));
            }
            Ok(())
        })?;

        for property in properties.iter().filter(|property| property.is_composite()) {
            nested_declaration(gen, property)?;
        }
        Ok(())
    })
}

fn nested_declaration(gen: &mut Gen<'_>, property: &Property<'_>) -> Result<()> {
    let schema = gen.context().schema();
    let name = struct_name(property.wire_name());
    let sets = property.property_sets(schema);
    if sets.is_empty() {
        struct_declaration(gen, &name, &property.field.fields)
    } else {
        property_set_declaration(gen, &name, property.field, &sets)
    }
}

/// enum with one case per property set, chosen by `__typename`
fn property_set_declaration(
    gen: &mut Gen<'_>,
    name: &str,
    field: &Field,
    sets: &[PropertySet<'_>],
) -> Result<()> {
    let schema = gen.context().schema();
    let alternatives: Vec<(String, String, Vec<&str>)> = sets
        .iter()
        .map(|set| {
            let condition = set.type_condition.unwrap_or(field.type_ref.base_name());
            let struct_name = format!("As{}", upper_first(condition));
            let case_name = escape_identifier(&format!("as{}", upper_first(condition)));
            (case_name, struct_name, property_set_typenames(schema, field, set))
        })
        .collect();
    let last = alternatives.len() - 1;

    gen.print_newline_if_needed();
    gen.print_on_newline(&format!("public enum {name}: GraphQLMapConvertible"));
    gen.within_block(|gen| {
        for (case_name, struct_name, _) in &alternatives {
            gen.print_on_newline(&format!("case {case_name}({struct_name})"));
        }

        gen.print_newline_if_needed();
        gen.print_on_newline("public init(map: GraphQLMap) throws");
        gen.within_block(|gen| {
            gen.print_on_newline(&format!(
                "let typename: String = try map.value(forKey: \"{TYPENAME_FIELD}\")"
            ));
            gen.print_on_newline("switch typename {");
            for (i, (case_name, struct_name, typenames)) in alternatives.iter().enumerate() {
                if i != last && typenames.is_empty() {
                    continue;
                }
                if i == last {
                    gen.print_on_newline("default:");
                } else {
                    let labels: Vec<String> =
                        typenames.iter().map(|name| format!("\"{name}\"")).collect();
                    gen.print_on_newline(&format!("case {}:", labels.join(", ")));
                }
                gen.with_indent(|gen| {
                    gen.print_on_newline(&format!(
                        "self = .{case_name}(try {struct_name}(map: map))"
                    ));
                    Ok(())
                })?;
            }
            gen.print_on_newline("}");
            Ok(())
        })?;

        for (set, (_, struct_name, _)) in sets.iter().zip(&alternatives) {
            struct_declaration(gen, struct_name, set.fields)?;
        }
        Ok(())
    })
}

fn enum_declaration(gen: &mut Gen<'_>, ty: &TypeDef) -> Result<()> {
    gen.print_newline_if_needed();
    if let Some(description) = &ty.description {
        gen.print_on_newline(&format!("/// {}", description.trim()));
    }
    gen.print_on_newline(&format!("public enum {}: String", ty.name));
    gen.within_block(|gen| {
        for value in &ty.values {
            if let Some(description) = &value.description {
                gen.print_on_newline(&format!("/// {}", description.trim()));
            }
            gen.print_on_newline(&format!(
                "case {} = \"{}\"",
                escape_identifier(&value.name.to_lower_camel_case()),
                value.name
            ));
        }
        Ok(())
    })?;
    gen.print_newline_if_needed();
    gen.print_on_newline(&format!(
        "extension {}: JSONDecodable, JSONEncodable {{}}",
        ty.name
    ));
    Ok(())
}

fn input_struct_declaration(gen: &mut Gen<'_>, ty: &TypeDef) -> Result<()> {
    let context = *gen.context();
    let mut parameters = Vec::new();
    let mut entries = Vec::new();
    for field in &ty.input_fields {
        let name = escape_identifier(&field.name);
        let type_name = input_type_name(&context, &field.value_type)?;
        let default = if field.value_type.is_non_null() { "" } else { " = nil" };
        parameters.push(format!("{name}: {type_name}{default}"));
        entries.push(format!("\"{}\": {name}", field.name));
    }
    let map = if entries.is_empty() {
        "[:]".to_string()
    } else {
        format!("[{}]", entries.join(", "))
    };

    gen.print_newline_if_needed();
    gen.print_on_newline(&format!("public struct {}: GraphQLMapEncodable", ty.name));
    gen.within_block(|gen| {
        gen.print_on_newline("public var graphQLMap: GraphQLMap");
        gen.print_newline_if_needed();
        gen.print_on_newline(&format!("public init({})", parameters.join(", ")));
        gen.within_block(|gen| {
            gen.print_on_newline(&format!("graphQLMap = {map}"));
            Ok(())
        })
    })
}

fn struct_name(wire_name: &str) -> String {
    upper_first(wire_name.trim_start_matches('_'))
}

fn builtin_scalar(name: &str) -> Option<&'static str> {
    match name {
        "String" => Some("String"),
        "Int" => Some("Int"),
        "Float" => Some("Double"),
        "Boolean" => Some("Bool"),
        "ID" => Some("GraphQLID"),
        _ => None,
    }
}

fn leaf_type_name(context: &TargetContext<'_>, name: &str) -> String {
    match context.schema().type_named(name).map(|ty| ty.kind) {
        Some(TypeKind::Scalar) | None => context.scalar_name(name, builtin_scalar, "String"),
        Some(_) => name.to_string(),
    }
}

fn property_type_name(context: &TargetContext<'_>, property: &Property<'_>) -> Result<String> {
    let leaf = if property.is_composite() {
        struct_name(property.wire_name())
    } else {
        leaf_type_name(context, property.field.type_ref.base_name())
    };
    render_swift_type(&property.field.type_ref, &leaf)
}

fn input_type_name(context: &TargetContext<'_>, type_ref: &TypeRef) -> Result<String> {
    render_swift_type(type_ref, &leaf_type_name(context, type_ref.base_name()))
}

fn render_swift_type(type_ref: &TypeRef, leaf: &str) -> Result<String> {
    render_type(
        type_ref,
        leaf,
        &|inner| format!("[{inner}]"),
        &|inner| format!("{inner}?"),
    )
}
