use thiserror::Error;

/// A single compilation failure.
///
/// The `Display` strings below are a stable contract: they are the fragments
/// accumulated in the driver's diagnostic buffer, and existing tooling matches
/// on them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("Unknown phase: {phase}")]
    UnknownPhase { phase: usize },

    #[error("Disruptive actions can only be specified by chain starter rules.")]
    ChainDisruptive,

    #[error("Rules must have an ID. File: {file} at line: {line}")]
    MissingId { file: String, line: usize },

    #[error("Rule id: {id} is duplicated")]
    DuplicateId { id: i64 },

    #[error("Failed to open the file: {path}")]
    FileOpen { path: String },

    #[error("Rules source is empty")]
    EmptySource,

    #[error("Includes depth limit reached: {limit}")]
    IncludeDepth { limit: usize },
}
