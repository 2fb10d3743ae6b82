use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Frontmatter(#[from] gh_aw_frontmatter::FrontmatterError),

    #[error("strict mode violation [{rule}]: {message}")]
    StrictViolation { rule: String, message: String },

    #[error("network policy attached to non-containerized server '{server}'")]
    NetworkOnNonContainer { server: String },

    #[error("wildcard entry in network.allowed for '{server}' is not permitted")]
    WildcardInAllowlist { server: String },

    #[error("unknown built-in tool or MCP server reference: {name}")]
    NotFoundError { name: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CompileError>;
