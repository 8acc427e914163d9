use graphql_typegen::{
    compile_to_ir, generate, generate_source, parse_document,
    with_typename_field_added_where_needed, CodegenOptions, Error, GenerateRequest, Schema,
    Target,
};
use indoc::indoc;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::fs;

const HERO_SCHEMA: &str = indoc! {r#"
    type Query { hero: Character }
    interface Character { name: String! }
    type Human implements Character { name: String! homePlanet: String }
"#};

const HERO_QUERY: &str = "query Hero { hero { name ... on Human { homePlanet } } }";

const STATS_SCHEMA: &str = indoc! {r#"
    type Query { stats: Stats }
    type Stats { count: Int! tags: [String] }
"#};

const STATS_QUERY: &str = "query Stats { stats { count tags } }";

fn generate_for(schema: &str, query: &str, target: Target) -> String {
    let schema = Schema::parse(schema).unwrap();
    let document = parse_document(query, None).unwrap();
    generate_source(&schema, Some(&document), target, &CodegenOptions::default())
        .unwrap()
        .source
}

#[test]
fn polymorphic_hero_compiles_to_two_property_sets() {
    let schema = Schema::parse(HERO_SCHEMA).unwrap();
    let document = parse_document(HERO_QUERY, None).unwrap();
    let document = with_typename_field_added_where_needed(&schema, &document).unwrap();
    let ir = compile_to_ir(&schema, &document, &CodegenOptions::default()).unwrap();

    let hero = &ir.operations["Hero"].fields[0];
    let names: Vec<&str> = hero.fields.iter().map(|f| f.response_name.as_str()).collect();
    assert_eq!(names, vec!["__typename", "name"]);

    let sets = hero.property_sets(&schema);
    assert_eq!(sets.len(), 2);
    assert_eq!(sets[0].type_condition, Some("Human"));
    let human: Vec<&str> = sets[0].fields.iter().map(|f| f.response_name.as_str()).collect();
    assert_eq!(human, vec!["__typename", "name", "homePlanet"]);
    assert_eq!(sets[1].type_condition, None);
}

#[test]
fn polymorphic_hero_emits_tagged_union() {
    let schema = Schema::parse(HERO_SCHEMA).unwrap();
    let document = parse_document(HERO_QUERY, None).unwrap();
    let options = CodegenOptions::new().with_add_typename(true);
    let output = generate_source(&schema, Some(&document), Target::TypeScript, &options)
        .unwrap()
        .source;

    assert!(output.contains("export type HeroQuery_hero_Human = {"));
    assert!(output.contains("export type HeroQuery_hero_Character = {"));
    assert!(output.contains("hero: HeroQuery_hero_Human | HeroQuery_hero_Character | null,"));
}

#[test]
fn scalars_map_the_same_way_in_every_backend() {
    let typescript = generate_for(STATS_SCHEMA, STATS_QUERY, Target::TypeScript);
    assert!(typescript.contains("count: number,"));
    assert!(typescript.contains("tags: Array<string | null> | null,"));

    let flow = generate_for(STATS_SCHEMA, STATS_QUERY, Target::Flow);
    assert!(flow.contains("count: number,"));
    assert!(flow.contains("tags: ?Array<?string>,"));

    let swift = generate_for(STATS_SCHEMA, STATS_QUERY, Target::Swift);
    assert!(swift.contains("public let count: Int\n"));
    assert!(swift.contains("public let tags: [String?]?\n"));

    let json: Value =
        serde_json::from_str(&generate_for(STATS_SCHEMA, STATS_QUERY, Target::Json)).unwrap();
    let fields = &json["operations"][0]["fields"][0]["fields"];
    assert_eq!(fields[0]["type"], "Int!");
    assert_eq!(fields[1]["type"], "[String]");
}

#[test]
fn writes_output_and_operation_ids() {
    let dir = tempfile::tempdir().unwrap();
    let schema_path = dir.path().join("schema.graphql");
    let input_path = dir.path().join("hero.ts");
    let output_path = dir.path().join("types.ts");
    let ids_path = dir.path().join("ids.json");

    fs::write(&schema_path, HERO_SCHEMA).unwrap();
    fs::write(
        &input_path,
        "export const query = gql`\n  query Hero { hero { name } }\n`;\n",
    )
    .unwrap();

    let request = GenerateRequest::new(vec![schema_path], Target::TypeScript)
        .with_inputs(vec![input_path])
        .with_output(&output_path)
        .with_options(CodegenOptions::new().with_operation_ids(&ids_path));
    generate(&request).unwrap();

    let source = fs::read_to_string(&output_path).unwrap();
    assert!(source.starts_with("/* tslint:disable */\n"));
    assert!(source.contains("export type HeroQuery = {"));

    let ids: Value = serde_json::from_str(&fs::read_to_string(&ids_path).unwrap()).unwrap();
    let entries = ids.as_object().unwrap();
    assert_eq!(entries.len(), 1);
    let entry = entries.values().next().unwrap();
    assert_eq!(entry["name"], "Hero");
}

#[test]
fn failed_validation_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let schema_path = dir.path().join("schema.graphql");
    let input_path = dir.path().join("hero.graphql");
    let output_path = dir.path().join("types.swift");

    fs::write(&schema_path, HERO_SCHEMA).unwrap();
    fs::write(&input_path, "query Hero { hero { age } }").unwrap();

    let request = GenerateRequest::new(vec![schema_path], Target::Swift)
        .with_inputs(vec![input_path])
        .with_output(&output_path);
    let err = generate(&request).unwrap_err();

    assert!(err.is_validation_error());
    assert!(!output_path.exists());
}

#[test]
fn operation_ids_without_path_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let schema_path = dir.path().join("schema.graphql");
    fs::write(&schema_path, HERO_SCHEMA).unwrap();

    let request = GenerateRequest::new(vec![schema_path], Target::Json)
        .with_output(dir.path().join("out.json"))
        .with_options(CodegenOptions::new().with_generate_operation_ids(true));
    let err = generate(&request).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn synthesized_operations_from_schema_files() {
    let dir = tempfile::tempdir().unwrap();
    let schema_path = dir.path().join("schema.graphql");
    let output_path = dir.path().join("types.js");
    fs::write(&schema_path, HERO_SCHEMA).unwrap();

    let request = GenerateRequest::new(vec![schema_path], Target::Flow).with_output(&output_path);
    generate(&request).unwrap();

    let source = fs::read_to_string(&output_path).unwrap();
    assert!(source.starts_with("/* @flow */\n"));
    assert!(source.contains("export type heroQuery = {|"));
    assert!(source.contains("export type heroQuery_hero = {|"));
}

#[test]
fn unwritable_id_map_leaves_no_source_behind() {
    let dir = tempfile::tempdir().unwrap();
    let schema_path = dir.path().join("schema.graphql");
    let input_path = dir.path().join("hero.graphql");
    let output_path = dir.path().join("types.ts");
    let ids_path = dir.path().join("missing").join("ids.json");

    fs::write(&schema_path, HERO_SCHEMA).unwrap();
    fs::write(&input_path, "query Hero { hero { name } }").unwrap();

    let request = GenerateRequest::new(vec![schema_path], Target::TypeScript)
        .with_inputs(vec![input_path])
        .with_output(&output_path)
        .with_options(CodegenOptions::new().with_operation_ids(&ids_path));
    let err = generate(&request).unwrap_err();

    assert!(matches!(err, Error::Io(_)));
    assert!(!output_path.exists());
    assert!(!ids_path.exists());
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(leftovers.len(), 2);
}
