//! document and schema loading

use crate::document::{concat_documents, parse_document, Document};
use crate::error::{Error, Result};
use crate::schema::Schema;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

const GRAPHQL_EXTENSIONS: [&str; 3] = ["graphql", "graphqls", "gql"];

/// default tag marking embedded documents in source files
pub const DEFAULT_TAG_NAME: &str = "gql";

/// read every path and merge the executable definitions into one document
///
/// graphql files are parsed whole. any other file is scanned for
/// `<tag_name>`-tagged template literals, with `${...}` interpolations
/// dropped.
pub fn load_and_merge_query_documents<P: AsRef<Path>>(
    paths: &[P],
    tag_name: &str,
) -> Result<Document> {
    let extractor = TagExtractor::new(tag_name)?;
    let mut documents = Vec::with_capacity(paths.len());

    for path in paths {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let source = if is_graphql_file(path) {
            contents
        } else {
            let literals = extractor.extract(&contents);
            if literals.is_empty() {
                tracing::debug!(path = %path.display(), "no tagged documents found");
                continue;
            }
            literals.join("\n")
        };
        documents.push(parse_document(&source, Some(path))?);
        tracing::debug!(path = %path.display(), "loaded query document");
    }

    Ok(concat_documents(documents))
}

/// read and concatenate sdl files, then build the schema
pub fn load_schema<P: AsRef<Path>>(paths: &[P]) -> Result<Schema> {
    if paths.is_empty() {
        return Err(Error::Configuration(
            "at least one schema path is required".to_string(),
        ));
    }

    let mut sdl = String::new();
    for path in paths {
        let path = path.as_ref();
        sdl.push_str(&fs::read_to_string(path)?);
        sdl.push('\n');
    }

    let document = graphql_parser::parse_schema::<String>(&sdl).map_err(|err| {
        let path: Option<PathBuf> = match paths {
            [single] => Some(single.as_ref().to_path_buf()),
            _ => None,
        };
        Error::parse(path, err)
    })?;
    let schema = Schema::from_document(&document)?;
    tracing::debug!(files = paths.len(), "loaded schema");
    Ok(schema)
}

fn is_graphql_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| GRAPHQL_EXTENSIONS.contains(&ext))
}

struct TagExtractor {
    literal: Regex,
    interpolation: Regex,
}

impl TagExtractor {
    fn new(tag_name: &str) -> Result<Self> {
        let literal = Regex::new(&format!(r"\b{}\s*`([^`]*)`", regex::escape(tag_name)))
            .map_err(|err| Error::Configuration(format!("invalid tag name `{tag_name}`: {err}")))?;
        let interpolation = Regex::new(r"\$\{[^}]*\}")
            .map_err(|err| Error::Configuration(err.to_string()))?;
        Ok(Self {
            literal,
            interpolation,
        })
    }

    fn extract(&self, contents: &str) -> Vec<String> {
        self.literal
            .captures_iter(contents)
            .filter_map(|captures| captures.get(1))
            .map(|body| self.interpolation.replace_all(body.as_str(), "").into_owned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::operation_name;
    use graphql_parser::query::Definition;
    use indoc::indoc;
    use std::io::Write;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn definition_names(doc: &Document) -> Vec<String> {
        doc.definitions
            .iter()
            .map(|def| match def {
                Definition::Operation(op) => operation_name(op).unwrap_or("").to_string(),
                Definition::Fragment(fragment) => fragment.name.clone(),
            })
            .collect()
    }

    #[test]
    fn test_extracts_tagged_literals_from_source_files() {
        let dir = tempfile::tempdir().unwrap();
        let js = write(
            dir.path(),
            "queries.js",
            indoc! {r#"
                import gql from 'graphql-tag';

                const HERO = gql`
                  query HeroName { hero { name ...HeroDetails } }
                  ${HeroDetails}
                `;

                export const DETAILS = gql `
                  fragment HeroDetails on Character { name }
                `;

                const notGraphql = `query Ignored { x }`;
            "#},
        );
        let graphql = write(dir.path(), "extra.graphql", "query Extra { hero { name } }");

        let doc = load_and_merge_query_documents(&[js, graphql], DEFAULT_TAG_NAME).unwrap();
        assert_eq!(definition_names(&doc), vec!["HeroName", "HeroDetails", "Extra"]);
    }

    #[test]
    fn test_custom_tag_name() {
        let dir = tempfile::tempdir().unwrap();
        let ts = write(dir.path(), "q.ts", "const q = graphql`query Q { a }`; gql`query Skipped { b }`");
        let doc = load_and_merge_query_documents(&[ts], "graphql").unwrap();
        assert_eq!(definition_names(&doc), vec!["Q"]);
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write(dir.path(), "bad.gql", "query {");
        let err = load_and_merge_query_documents(&[&bad], DEFAULT_TAG_NAME).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().contains("bad.gql"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_and_merge_query_documents(&["/nonexistent/q.graphql"], DEFAULT_TAG_NAME)
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_load_schema_concatenates_files() {
        let dir = tempfile::tempdir().unwrap();
        let base = write(dir.path(), "schema.graphqls", "type Query { hero: Hero }\ntype Hero { name: String }");
        let ext = write(dir.path(), "ext.graphqls", "extend type Hero { age: Int }");

        let schema = load_schema(&[base, ext]).unwrap();
        let hero = schema.type_named("Hero").unwrap();
        assert!(hero.field("age").is_some());

        let err = load_schema::<PathBuf>(&[]).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
