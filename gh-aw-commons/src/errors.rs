//! Human-readable error message constants shared across crates, consumed
//! with `anyhow::Context::context(...)` at call sites rather than
//! re-deriving a message each time.

pub const ERR_READ_FILE: &str = "failed to read file";
pub const ERR_WRITE_FILE: &str = "failed to write file";
pub const ERR_CREATE_DIR: &str = "failed to create directory";
pub const ERR_PARSE_FRONTMATTER: &str = "failed to parse YAML frontmatter";
pub const ERR_REMOTE_FETCH: &str = "failed to fetch remote import";
