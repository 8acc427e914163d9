//! graphql query compiler and type generator
//!
//! this crate reads a graphql schema (sdl) and a set of query documents,
//! validates the documents, compiles them to an intermediate representation,
//! and emits typed declarations for swift, typescript, or flow, or the ir
//! itself as json. when no documents are given, one operation per root field
//! is synthesized from the schema.
//!
//! ## quick start
//!
//! ```
//! use graphql_typegen::{generate_source, parse_document, CodegenOptions, Schema, Target};
//!
//! # fn example() -> graphql_typegen::Result<()> {
//! let schema = Schema::parse("type Query { greeting(name: String): String! }")?;
//! let document = parse_document("query Greet($name: String) { greeting(name: $name) }", None)?;
//! let artifacts = generate_source(&schema, Some(&document), Target::TypeScript, &CodegenOptions::default())?;
//! assert!(artifacts.source.contains("export type GreetQuery ="));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## from files
//!
//! [`GenerateRequest`] and [`generate`] do the loading and writing; the
//! `graphql-typegen` binary is a thin wrapper around them.

mod codegen;
mod compilation;
mod config;
mod document;
mod error;
mod generate;
pub mod ir;
mod loading;
mod resolve;
mod schema;
mod synthesize;
mod targets;
mod typename;
mod validation;

pub use codegen::CodeGenerator;
pub use compilation::compile_to_ir;
pub use config::CodegenOptions;
pub use document::{concat_documents, parse_document, print_definition, Document};
pub use error::{Diagnostic, Error, Result, SourceLocation};
pub use generate::{generate, generate_source, GenerateRequest, GeneratedArtifacts, Target};
pub use loading::{load_and_merge_query_documents, load_schema, DEFAULT_TAG_NAME};
pub use resolve::{
    field_definition, is_type_proper_super_type_of, named_type_string, operation_root_type,
    operation_schema_def, OperationKind, OperationSchemaDef,
};
pub use schema::{EnumValueDef, FieldDef, InputValueDef, Schema, TypeDef, TypeKind, TypeRef};
pub use synthesize::create_document_from_server_schema;
pub use typename::{with_typename_field_added_where_needed, TYPENAME_FIELD};
pub use validation::validate_query_document;
