use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontmatterError {
    #[error("failed to import {path}: {source}")]
    ImportError {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("import cycle detected: {}", .cycle.join(" -> "))]
    CycleError { cycle: Vec<String> },

    #[error("invalid frontmatter in {path}: {message}")]
    SchemaError { path: String, message: String },

    #[error("import target not found: {path}")]
    NotFoundError { path: String },

    #[error("'{name}' is defined in both {source_a} and {source_b}")]
    SafeJobConflict {
        name: String,
        source_a: String,
        source_b: String,
    },

    #[error("forbidden expression identifier(s): {}", .identifiers.join(", "))]
    UnauthorizedExpression { identifiers: Vec<String> },
}

pub type Result<T> = std::result::Result<T, FrontmatterError>;
