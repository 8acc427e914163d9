//! generation pipeline
//!
//! load → validate → typename injection → compile → backend → output.
//! every artifact is produced in memory first; nothing touches the disk
//! unless the whole pipeline succeeded.

use crate::compilation::compile_to_ir;
use crate::config::CodegenOptions;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::ir::CompilationContext;
use crate::loading::{load_and_merge_query_documents, load_schema, DEFAULT_TAG_NAME};
use crate::schema::Schema;
use crate::synthesize::create_document_from_server_schema;
use crate::targets::{self, TargetContext};
use crate::typename::with_typename_field_added_where_needed;
use crate::validation::{self, validate_query_document};
use indexmap::IndexMap;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::NamedTempFile;

/// output flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Json,
    Swift,
    TypeScript,
    Flow,
}

impl Target {
    pub fn as_str(self) -> &'static str {
        match self {
            Target::Json => "json",
            Target::Swift => "swift",
            Target::TypeScript => "typescript",
            Target::Flow => "flow",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(Target::Json),
            "swift" => Ok(Target::Swift),
            "ts" | "typescript" => Ok(Target::TypeScript),
            "flow" => Ok(Target::Flow),
            other => Err(Error::Configuration(format!(
                "unsupported target `{other}` (expected json, swift, ts, typescript, or flow)"
            ))),
        }
    }
}

/// everything one run produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifacts {
    /// generated source text
    pub source: String,
    /// pretty json map of operation id to name and source, when ids are on
    pub operation_ids: Option<String>,
}

#[derive(Debug, Serialize)]
struct OperationIdEntry<'a> {
    name: &'a str,
    source: &'a str,
}

/// run the pipeline on an already built schema
///
/// without a document, one operation per root field is synthesized from the
/// schema. the swift target always gets `__typename` injected.
pub fn generate_source(
    schema: &Schema,
    document: Option<&Document>,
    target: Target,
    options: &CodegenOptions,
) -> Result<GeneratedArtifacts> {
    options.validate()?;

    let synthesized = document.is_none();
    let document = match document {
        Some(document) => {
            validate_query_document(schema, document, target)?;
            Cow::Borrowed(document)
        }
        None => {
            let document = create_document_from_server_schema(schema)?;
            validation::validate(schema, &document, false)?;
            Cow::Owned(document)
        }
    };

    let mut options = options.clone();
    if target == Target::Swift {
        options.add_typename = true;
    }
    let document = if options.add_typename {
        tracing::debug!("adding __typename where needed");
        Cow::Owned(with_typename_field_added_where_needed(schema, &document)?)
    } else {
        document
    };

    let ir = compile_to_ir(schema, &document, &options)?;
    let context = TargetContext {
        ir: &ir,
        options: &options,
        synthesized,
    };

    tracing::debug!(%target, operations = ir.operations.len(), "emitting source");
    let source = match target {
        Target::Json => targets::serialize_to_json(context)?,
        Target::Swift => targets::generate_swift_source(context)?,
        Target::TypeScript => targets::generate_typescript_source(context)?,
        Target::Flow => targets::generate_flow_source(context)?,
    };

    let operation_ids = if options.generate_operation_ids {
        Some(operation_ids_map(&ir)?)
    } else {
        None
    };

    Ok(GeneratedArtifacts {
        source,
        operation_ids,
    })
}

fn operation_ids_map(ir: &CompilationContext<'_>) -> Result<String> {
    let map: IndexMap<&str, OperationIdEntry<'_>> = ir
        .operations
        .values()
        .filter_map(|operation| {
            let id = operation.operation_id.as_deref()?;
            Some((
                id,
                OperationIdEntry {
                    name: &operation.operation_name,
                    source: &operation.source_with_fragments,
                },
            ))
        })
        .collect();
    Ok(serde_json::to_string_pretty(&map)?)
}

/// a full run from files on disk
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub(crate) input_paths: Vec<PathBuf>,
    pub(crate) schema_paths: Vec<PathBuf>,
    pub(crate) output_path: Option<PathBuf>,
    pub(crate) target: Target,
    pub(crate) tag_name: String,
    pub(crate) options: CodegenOptions,
}

impl GenerateRequest {
    /// generate for `target` against the sdl in `schema_paths`
    pub fn new(schema_paths: Vec<PathBuf>, target: Target) -> Self {
        Self {
            input_paths: Vec::new(),
            schema_paths,
            output_path: None,
            target,
            tag_name: DEFAULT_TAG_NAME.to_string(),
            options: CodegenOptions::default(),
        }
    }

    /// query documents; when empty, operations are synthesized
    pub fn with_inputs(mut self, input_paths: Vec<PathBuf>) -> Self {
        self.input_paths = input_paths;
        self
    }

    /// write the artifact here instead of stdout
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn with_tag_name(mut self, tag_name: impl Into<String>) -> Self {
        self.tag_name = tag_name.into();
        self
    }

    pub fn with_options(mut self, options: CodegenOptions) -> Self {
        self.options = options;
        self
    }
}

/// load inputs, generate, and write the artifacts
pub fn generate(request: &GenerateRequest) -> Result<()> {
    let options = &request.options;
    if options.generate_operation_ids && options.operation_ids_path.is_none() {
        return Err(Error::Configuration(
            "operation ids require a path for the id map".to_string(),
        ));
    }

    let schema = load_schema(&request.schema_paths)?;
    let document = if request.input_paths.is_empty() {
        None
    } else {
        Some(load_and_merge_query_documents(
            &request.input_paths,
            &request.tag_name,
        )?)
    };

    let artifacts = generate_source(&schema, document.as_ref(), request.target, options)?;

    // stage every file before any of them becomes visible
    let staged_source = match &request.output_path {
        Some(path) => Some((stage(path, &artifacts.source)?, path)),
        None => None,
    };
    let staged_ids = match (&artifacts.operation_ids, &options.operation_ids_path) {
        (Some(ids), Some(path)) => Some((stage(path, ids)?, path)),
        _ => None,
    };

    match staged_source {
        Some((file, path)) => {
            persist(file, path)?;
            tracing::debug!(path = %path.display(), target = %request.target, "wrote generated source");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(artifacts.source.as_bytes())?;
            if !artifacts.source.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }

    if let Some((file, path)) = staged_ids {
        persist(file, path)?;
        tracing::debug!(path = %path.display(), "wrote operation ids");
    }

    Ok(())
}

/// write `contents` to a temporary file beside `path`
fn stage(path: &Path, contents: &str) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents.as_bytes())?;
    Ok(file)
}

fn persist(file: NamedTempFile, path: &Path) -> Result<()> {
    file.persist(path).map_err(|err| Error::Io(err.error))?;
    Ok(())
}
