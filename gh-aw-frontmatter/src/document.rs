//! Splitting a Markdown-with-frontmatter source file into its raw YAML
//! header and body text.

use crate::errors::{FrontmatterError, Result};

pub struct RawDocument {
    pub frontmatter: serde_yaml::Value,
    pub body: String,
}

const DELIMITER: &str = "---";

/// Split `source` on the leading `---`-delimited YAML block. A document
/// with no frontmatter block is treated as an empty-mapping frontmatter
/// with the whole file as body.
pub fn parse_document(path: &str, source: &str) -> Result<RawDocument> {
    let trimmed = source.trim_start_matches('\u{feff}');
    if !trimmed.trim_start().starts_with(DELIMITER) {
        return Ok(RawDocument {
            frontmatter: serde_yaml::Value::Mapping(Default::default()),
            body: source.to_string(),
        });
    }

    let after_open = trimmed.trim_start();
    let after_open = &after_open[DELIMITER.len()..];
    let close_idx = after_open
        .find("\n---")
        .ok_or_else(|| FrontmatterError::SchemaError {
            path: path.to_string(),
            message: "unterminated frontmatter block".to_string(),
        })?;

    let yaml_block = &after_open[..close_idx];
    let rest = &after_open[close_idx + "\n---".len()..];
    let body = rest.strip_prefix('\n').unwrap_or(rest).to_string();

    let frontmatter: serde_yaml::Value =
        serde_yaml::from_str(yaml_block).map_err(|err| FrontmatterError::SchemaError {
            path: path.to_string(),
            message: err.to_string(),
        })?;

    Ok(RawDocument { frontmatter, body })
}
