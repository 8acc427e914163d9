//! schema model
//!
//! an immutable type graph built from a graphql-parser schema document.
//! type extensions are folded into their base definitions while building, so
//! consumers only ever see one definition per named type.

use crate::error::{Error, Result};
use graphql_parser::schema::{self as ast, Definition, TypeDefinition, TypeExtension};
use indexmap::{IndexMap, IndexSet};
use serde::{Serialize, Serializer};
use std::fmt;

const BUILT_IN_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];

/// reference to a type: named, list-of, or non-null-of
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn list(of: TypeRef) -> Self {
        TypeRef::List(Box::new(of))
    }

    pub fn non_null(of: TypeRef) -> Self {
        TypeRef::NonNull(Box::new(of))
    }

    /// innermost named type
    pub fn base_name(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.base_name(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }

    /// strips an outer non-null wrapper
    pub fn nullable(&self) -> &TypeRef {
        match self {
            TypeRef::NonNull(inner) => inner,
            other => other,
        }
    }

    /// true if the type is a list once the outer non-null is removed
    pub fn is_list(&self) -> bool {
        matches!(self.nullable(), TypeRef::List(_))
    }

    /// element type of a (possibly non-null) list
    pub fn list_element(&self) -> Option<&TypeRef> {
        match self.nullable() {
            TypeRef::List(inner) => Some(inner),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => write!(f, "{name}"),
            TypeRef::List(inner) => write!(f, "[{inner}]"),
            TypeRef::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

impl Serialize for TypeRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'a> From<&ast::Type<'a, String>> for TypeRef {
    fn from(ty: &ast::Type<'a, String>) -> Self {
        match ty {
            ast::Type::NamedType(name) => TypeRef::Named(name.clone()),
            ast::Type::ListType(inner) => TypeRef::list(inner.as_ref().into()),
            ast::Type::NonNullType(inner) => TypeRef::non_null(inner.as_ref().into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

/// output field or argument-bearing field definition
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<InputValueDef>,
    pub field_type: TypeRef,
}

/// argument or input-object field
#[derive(Debug, Clone, PartialEq)]
pub struct InputValueDef {
    pub name: String,
    pub description: Option<String>,
    pub value_type: TypeRef,
    pub has_default: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValueDef {
    pub name: String,
    pub description: Option<String>,
}

/// named type definition
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub name: String,
    pub kind: TypeKind,
    pub description: Option<String>,
    /// output fields (object, interface)
    pub fields: Vec<FieldDef>,
    /// input fields (input object)
    pub input_fields: Vec<InputValueDef>,
    /// implemented interfaces (object, interface)
    pub interfaces: Vec<String>,
    /// member types (union)
    pub members: Vec<String>,
    /// values (enum)
    pub values: Vec<EnumValueDef>,
}

impl TypeDef {
    fn new(name: &str, kind: TypeKind, description: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description,
            fields: Vec::new(),
            input_fields: Vec::new(),
            interfaces: Vec::new(),
            members: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// object, interface, or union
    pub fn is_composite(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Object | TypeKind::Interface | TypeKind::Union
        )
    }

    /// interface or union
    pub fn is_abstract(&self) -> bool {
        matches!(self.kind, TypeKind::Interface | TypeKind::Union)
    }

    /// scalar or enum
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, TypeKind::Scalar | TypeKind::Enum)
    }

    pub fn is_input(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Scalar | TypeKind::Enum | TypeKind::InputObject
        )
    }

    pub fn is_built_in_scalar(&self) -> bool {
        self.kind == TypeKind::Scalar && BUILT_IN_SCALARS.contains(&self.name.as_str())
    }
}

/// meta-fields every composite type answers without declaring them
#[derive(Debug, Clone)]
pub(crate) struct MetaFields {
    pub(crate) schema: FieldDef,
    pub(crate) type_: FieldDef,
    pub(crate) typename: FieldDef,
}

impl MetaFields {
    fn new() -> Self {
        Self {
            schema: FieldDef {
                name: "__schema".to_string(),
                description: Some("Access the current type schema of this server.".to_string()),
                arguments: Vec::new(),
                field_type: TypeRef::non_null(TypeRef::named("__Schema")),
            },
            type_: FieldDef {
                name: "__type".to_string(),
                description: Some("Request the type information of a single type.".to_string()),
                arguments: vec![InputValueDef {
                    name: "name".to_string(),
                    description: None,
                    value_type: TypeRef::non_null(TypeRef::named("String")),
                    has_default: false,
                }],
                field_type: TypeRef::named("__Type"),
            },
            typename: FieldDef {
                name: "__typename".to_string(),
                description: Some("The name of the current Object type at runtime.".to_string()),
                arguments: Vec::new(),
                field_type: TypeRef::non_null(TypeRef::named("String")),
            },
        }
    }
}

/// immutable graphql type system
#[derive(Debug, Clone)]
pub struct Schema {
    types: IndexMap<String, TypeDef>,
    query_type: String,
    mutation_type: Option<String>,
    subscription_type: Option<String>,
    possible_types: IndexMap<String, IndexSet<String>>,
    pub(crate) meta: MetaFields,
}

impl Schema {
    /// parse sdl text and build the schema
    pub fn parse(sdl: &str) -> Result<Self> {
        let document =
            graphql_parser::parse_schema::<String>(sdl).map_err(|err| Error::parse(None, err))?;
        Self::from_document(&document)
    }

    /// build the schema from a parsed sdl document
    pub fn from_document(document: &ast::Document<'_, String>) -> Result<Self> {
        let mut types: IndexMap<String, TypeDef> = IndexMap::new();
        for name in BUILT_IN_SCALARS {
            types.insert(name.to_string(), TypeDef::new(name, TypeKind::Scalar, None));
        }

        let mut roots: (Option<String>, Option<String>, Option<String>) = (None, None, None);
        let mut extensions = Vec::new();

        for def in &document.definitions {
            match def {
                Definition::SchemaDefinition(schema) => {
                    roots = (
                        schema.query.clone(),
                        schema.mutation.clone(),
                        schema.subscription.clone(),
                    );
                }
                Definition::TypeDefinition(ty) => {
                    let built = type_from_definition(ty);
                    types.insert(built.name.clone(), built);
                }
                Definition::TypeExtension(ext) => extensions.push(ext),
                Definition::DirectiveDefinition(_) => {}
            }
        }

        for ext in extensions {
            apply_extension(&mut types, ext)?;
        }

        let query_type = match roots.0 {
            Some(name) => name,
            None if types.contains_key("Query") => "Query".to_string(),
            None => {
                return Err(Error::Configuration(
                    "schema does not define a query type".to_string(),
                ))
            }
        };
        let mutation_type = roots
            .1
            .or_else(|| types.contains_key("Mutation").then(|| "Mutation".to_string()));
        let subscription_type = roots
            .2
            .or_else(|| types.contains_key("Subscription").then(|| "Subscription".to_string()));

        for root in [Some(&query_type), mutation_type.as_ref(), subscription_type.as_ref()]
            .into_iter()
            .flatten()
        {
            match types.get(root) {
                Some(ty) if ty.kind == TypeKind::Object => {}
                _ => {
                    return Err(Error::Configuration(format!(
                        "root operation type `{root}` must be a defined object type"
                    )))
                }
            }
        }

        let mut possible_types: IndexMap<String, IndexSet<String>> = IndexMap::new();
        for ty in types.values() {
            match ty.kind {
                TypeKind::Union => {
                    possible_types
                        .entry(ty.name.clone())
                        .or_default()
                        .extend(ty.members.iter().cloned());
                }
                TypeKind::Object => {
                    for interface in &ty.interfaces {
                        possible_types
                            .entry(interface.clone())
                            .or_default()
                            .insert(ty.name.clone());
                    }
                }
                _ => {}
            }
        }

        tracing::debug!(
            types = types.len(),
            query = %query_type,
            "built schema"
        );

        Ok(Self {
            types,
            query_type,
            mutation_type,
            subscription_type,
            possible_types,
            meta: MetaFields::new(),
        })
    }

    pub fn type_named(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// every named type in declaration order, built-in scalars first
    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values()
    }

    pub fn query_type(&self) -> &TypeDef {
        &self.types[&self.query_type]
    }

    pub fn mutation_type(&self) -> Option<&TypeDef> {
        self.mutation_type.as_ref().and_then(|name| self.types.get(name))
    }

    pub fn subscription_type(&self) -> Option<&TypeDef> {
        self.subscription_type
            .as_ref()
            .and_then(|name| self.types.get(name))
    }

    /// true if `name` is the query, mutation, or subscription type
    pub fn is_operation_root_type(&self, name: &str) -> bool {
        self.query_type == name
            || self.mutation_type.as_deref() == Some(name)
            || self.subscription_type.as_deref() == Some(name)
    }

    /// concrete object types an abstract type may resolve to
    pub fn possible_types(&self, name: &str) -> Vec<&str> {
        match self.types.get(name) {
            Some(ty) if ty.kind == TypeKind::Object => vec![ty.name.as_str()],
            Some(_) => self
                .possible_types
                .get(name)
                .map(|set| set.iter().map(String::as_str).collect())
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// true if `object` is one of the possible types of `abstract_type`
    pub fn is_possible_type(&self, abstract_type: &str, object: &str) -> bool {
        self.possible_types
            .get(abstract_type)
            .is_some_and(|set| set.contains(object))
    }
}

fn type_from_definition(def: &TypeDefinition<'_, String>) -> TypeDef {
    match def {
        TypeDefinition::Scalar(scalar) => {
            TypeDef::new(&scalar.name, TypeKind::Scalar, scalar.description.clone())
        }
        TypeDefinition::Object(obj) => {
            let mut ty = TypeDef::new(&obj.name, TypeKind::Object, obj.description.clone());
            ty.fields = obj.fields.iter().map(field_from_ast).collect();
            ty.interfaces = obj.implements_interfaces.clone();
            ty
        }
        TypeDefinition::Interface(iface) => {
            let mut ty = TypeDef::new(&iface.name, TypeKind::Interface, iface.description.clone());
            ty.fields = iface.fields.iter().map(field_from_ast).collect();
            ty
        }
        TypeDefinition::Union(union_ty) => {
            let mut ty = TypeDef::new(&union_ty.name, TypeKind::Union, union_ty.description.clone());
            ty.members = union_ty.types.clone();
            ty
        }
        TypeDefinition::Enum(enum_ty) => {
            let mut ty = TypeDef::new(&enum_ty.name, TypeKind::Enum, enum_ty.description.clone());
            ty.values = enum_ty.values.iter().map(enum_value_from_ast).collect();
            ty
        }
        TypeDefinition::InputObject(input) => {
            let mut ty = TypeDef::new(&input.name, TypeKind::InputObject, input.description.clone());
            ty.input_fields = input.fields.iter().map(input_value_from_ast).collect();
            ty
        }
    }
}

fn apply_extension(
    types: &mut IndexMap<String, TypeDef>,
    ext: &TypeExtension<'_, String>,
) -> Result<()> {
    let (name, kind) = match ext {
        TypeExtension::Scalar(e) => (&e.name, TypeKind::Scalar),
        TypeExtension::Object(e) => (&e.name, TypeKind::Object),
        TypeExtension::Interface(e) => (&e.name, TypeKind::Interface),
        TypeExtension::Union(e) => (&e.name, TypeKind::Union),
        TypeExtension::Enum(e) => (&e.name, TypeKind::Enum),
        TypeExtension::InputObject(e) => (&e.name, TypeKind::InputObject),
    };

    let base = types.get_mut(name.as_str()).ok_or_else(|| {
        Error::Configuration(format!("cannot extend type `{name}` because it is not defined"))
    })?;
    if base.kind != kind {
        return Err(Error::Configuration(format!(
            "extension of `{name}` does not match the kind of its definition"
        )));
    }

    match ext {
        TypeExtension::Scalar(_) => {}
        TypeExtension::Object(e) => {
            base.fields.extend(e.fields.iter().map(field_from_ast));
            base.interfaces.extend(e.implements_interfaces.iter().cloned());
        }
        TypeExtension::Interface(e) => {
            base.fields.extend(e.fields.iter().map(field_from_ast));
        }
        TypeExtension::Union(e) => base.members.extend(e.types.iter().cloned()),
        TypeExtension::Enum(e) => base.values.extend(e.values.iter().map(enum_value_from_ast)),
        TypeExtension::InputObject(e) => {
            base.input_fields
                .extend(e.fields.iter().map(input_value_from_ast));
        }
    }
    Ok(())
}

fn field_from_ast(field: &ast::Field<'_, String>) -> FieldDef {
    FieldDef {
        name: field.name.clone(),
        description: field.description.clone(),
        arguments: field.arguments.iter().map(input_value_from_ast).collect(),
        field_type: TypeRef::from(&field.field_type),
    }
}

fn input_value_from_ast(value: &ast::InputValue<'_, String>) -> InputValueDef {
    InputValueDef {
        name: value.name.clone(),
        description: value.description.clone(),
        value_type: TypeRef::from(&value.value_type),
        has_default: value.default_value.is_some(),
    }
}

fn enum_value_from_ast(value: &ast::EnumValue<'_, String>) -> EnumValueDef {
    EnumValueDef {
        name: value.name.clone(),
        description: value.description.clone(),
    }
}
