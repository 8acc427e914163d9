//! error types
//!
//! structured errors for configuration, compiler invariants, document
//! validation, parsing, and io.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// library result type
pub type Result<T> = std::result::Result<T, Error>;

/// error type for the compiler pipeline
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("compiler error: {0}")]
    Compiler(String),

    #[error("validation of graphql documents failed:\n{}", render_diagnostics(.0))]
    Validation(Vec<Diagnostic>),

    #[error("failed to parse {}: {message}", source_name(.path))]
    Parse {
        /// file the text came from, if any
        path: Option<PathBuf>,
        /// parser message
        message: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// true if the error came from document validation
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// validation diagnostics, empty for every other kind
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Error::Validation(diagnostics) => diagnostics,
            _ => &[],
        }
    }

    pub(crate) fn parse(path: Option<PathBuf>, err: impl fmt::Display) -> Self {
        Error::Parse {
            path,
            message: err.to_string(),
        }
    }
}

/// a single validation message with its source locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// human readable message
    pub message: String,
    /// where the problem was found
    pub locations: Vec<SourceLocation>,
}

impl Diagnostic {
    pub(crate) fn new(message: impl Into<String>, pos: graphql_parser::Pos) -> Self {
        Self {
            message: message.into(),
            locations: vec![SourceLocation::from(pos)],
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.locations.first() {
            Some(loc) => write!(f, "{}:{}: {}", loc.line, loc.column, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// line and column in a graphql source (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl From<graphql_parser::Pos> for SourceLocation {
    fn from(pos: graphql_parser::Pos) -> Self {
        Self {
            line: pos.line,
            column: pos.column,
        }
    }
}

fn source_name(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "graphql source".to_string())
}

fn render_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("  {d}"))
        .collect::<Vec<_>>()
        .join("\n")
}
