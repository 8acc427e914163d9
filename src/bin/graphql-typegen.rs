//! generate typed declarations from graphql query documents
//!
//! `graphql-typegen generate` loads a schema and a set of query documents
//! (or synthesizes one operation per root field when no inputs are given)
//! and writes swift, typescript, flow, or json to `--output` or stdout.

use anyhow::Context;
use clap::{Parser, Subcommand};
use graphql_typegen::{generate, CodegenOptions, GenerateRequest, Target, DEFAULT_TAG_NAME};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

const DEFAULT_LOG_LEVEL: Level = Level::INFO;

#[derive(Parser, Debug)]
#[command(name = "graphql-typegen", version, about)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,

    #[arg(help = "Enable verbose output.", long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate code from query documents and a schema.
    Generate(GenerateArgs),
}

#[derive(clap::Args, Debug)]
struct GenerateArgs {
    /// Query documents (.graphql/.gql) or source files with tagged literals.
    #[arg(value_name = "INPUT")]
    inputs: Vec<PathBuf>,

    /// Schema SDL files; repeat to concatenate several.
    #[arg(long = "schema", value_name = "PATH", required = true)]
    schemas: Vec<PathBuf>,

    /// Write the generated source here instead of stdout.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Output flavour: swift, ts, typescript, flow, or json.
    #[arg(long, default_value = "json")]
    target: Target,

    /// Template tag to extract from non-graphql source files.
    #[arg(long, default_value = DEFAULT_TAG_NAME)]
    tag_name: String,

    /// Insert `__typename` into every selection set.
    #[arg(long)]
    add_typename: bool,

    /// Emit custom scalars under their own names.
    #[arg(long)]
    passthrough_custom_scalars: bool,

    /// Prefix for passed-through custom scalar names.
    #[arg(long, value_name = "PREFIX", requires = "passthrough_custom_scalars")]
    custom_scalars_prefix: Option<String>,

    /// Pascal-case declaration names.
    #[arg(long)]
    pascal_case: bool,

    /// Use `export interface` instead of `export type`.
    #[arg(long)]
    prefer_interfaces: bool,

    /// Compute operation ids and write the id map here.
    #[arg(long, value_name = "PATH")]
    operation_ids_path: Option<PathBuf>,
}

impl GenerateArgs {
    fn options(&self) -> CodegenOptions {
        let mut options = CodegenOptions::new()
            .with_add_typename(self.add_typename)
            .with_pascal_case(self.pascal_case)
            .with_prefer_interfaces(self.prefer_interfaces);
        if self.passthrough_custom_scalars {
            let prefix = self.custom_scalars_prefix.clone().unwrap_or_default();
            options = options.with_passthrough_custom_scalars(prefix);
        }
        if let Some(path) = &self.operation_ids_path {
            options = options.with_operation_ids(path.clone());
        }
        options
    }

    fn run(self) -> anyhow::Result<()> {
        let options = self.options();
        let mut request = GenerateRequest::new(self.schemas, self.target)
            .with_inputs(self.inputs)
            .with_tag_name(self.tag_name)
            .with_options(options);
        if let Some(output) = self.output {
            request = request.with_output(output);
        }
        tracing::debug!(?request, "starting generation");
        generate(&request).context("code generation failed")
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    let result = match cli.cmd {
        Command::Generate(args) => args.run(),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

/// `-v` wins over `LOG_LEVEL`; an unparseable `LOG_LEVEL` falls back to the default
fn resolve_log_level(verbose: bool, configured: Option<&str>) -> (Level, Option<String>) {
    if verbose {
        return (Level::DEBUG, None);
    }
    match configured.map(str::trim) {
        None | Some("") => (DEFAULT_LOG_LEVEL, None),
        Some(value) => match value.parse::<Level>() {
            Ok(level) => (level, None),
            Err(_) => (
                DEFAULT_LOG_LEVEL,
                Some(format!("ignoring unknown `LOG_LEVEL` value `{value}`")),
            ),
        },
    }
}

fn init_tracing(cli: &Cli) {
    let configured = std::env::var("LOG_LEVEL").ok();
    let (level, warning) = resolve_log_level(cli.verbose, configured.as_deref());

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();
    if let Some(warning) = warning {
        tracing::warn!("{warning}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_flags() {
        let cli = Cli::try_parse_from([
            "graphql-typegen",
            "generate",
            "queries.graphql",
            "--schema",
            "schema.graphql",
            "--target",
            "ts",
            "--passthrough-custom-scalars",
            "--custom-scalars-prefix",
            "Gql",
            "--operation-ids-path",
            "ids.json",
        ])
        .unwrap();
        let Command::Generate(args) = cli.cmd;
        assert_eq!(args.target, Target::TypeScript);
        assert_eq!(args.inputs, vec![PathBuf::from("queries.graphql")]);

        let options = args.options();
        assert!(options.passthrough_custom_scalars());
        assert_eq!(options.custom_scalars_prefix(), "Gql");
        assert!(options.generate_operation_ids());
    }

    #[test]
    fn test_prefix_requires_passthrough() {
        let result = Cli::try_parse_from([
            "graphql-typegen",
            "generate",
            "--schema",
            "schema.graphql",
            "--custom-scalars-prefix",
            "Gql",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_level_resolution() {
        assert_eq!(resolve_log_level(true, Some("error")), (Level::DEBUG, None));
        assert_eq!(resolve_log_level(false, None), (Level::INFO, None));
        assert_eq!(resolve_log_level(false, Some(" trace ")), (Level::TRACE, None));
        assert_eq!(resolve_log_level(false, Some("WARN")), (Level::WARN, None));

        let (level, warning) = resolve_log_level(false, Some("loud"));
        assert_eq!(level, Level::INFO);
        assert!(warning.unwrap().contains("loud"));
    }

    #[test]
    fn test_unknown_target_rejected() {
        let result = Cli::try_parse_from([
            "graphql-typegen",
            "generate",
            "--schema",
            "schema.graphql",
            "--target",
            "kotlin",
        ]);
        assert!(result.is_err());
    }
}
