//! Import resolution, frontmatter merging, and expression validation: the
//! phases that turn a possibly-multi-file workflow document into one
//! normalized [`gh_aw_schema::FrontmatterTree`] plus a validated body.

pub mod document;
pub mod errors;
pub mod expressions;
pub mod import;
pub mod merge;

pub use document::{parse_document, RawDocument};
pub use errors::{FrontmatterError, Result};
pub use expressions::{find_unauthorized_expressions, validate_expressions};
pub use import::{ImportResolver, NoRemoteFetcher, RemoteFetcher, ResolvedFragment};
pub use merge::merge_fragments;

use gh_aw_schema::{CompilerDiagnostic, FrontmatterTree};

/// The fully resolved, merged, and validated document ready for the
/// compiler's later phases.
pub struct ParsedWorkflow {
    pub frontmatter: FrontmatterTree,
    pub body: String,
    pub diagnostics: Vec<CompilerDiagnostic>,
}

/// Run the full frontmatter pipeline: resolve imports, merge, deserialize
/// into the typed tree, and validate the body's expressions.
pub fn parse_workflow(root_dir: &std::path::Path, root_path: &str, fetcher: &dyn RemoteFetcher) -> Result<ParsedWorkflow> {
    let mut resolver = ImportResolver::new(root_dir, fetcher);
    let fragments = resolver.resolve(root_path)?;
    let (merged, body, diagnostics) = merge_fragments(&fragments)?;

    let frontmatter: FrontmatterTree = serde_yaml::from_value(merged).map_err(|err| FrontmatterError::SchemaError {
        path: root_path.to_string(),
        message: err.to_string(),
    })?;

    validate_expressions(&body)?;

    Ok(ParsedWorkflow {
        frontmatter,
        body,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn end_to_end_parses_simple_workflow() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("root.md"),
            "---\nname: Triage\non:\n  issues:\n    types: [opened]\n---\nHandle issue #${{ github.event.issue.number }}\n",
        )
        .unwrap();

        let fetcher = NoRemoteFetcher;
        let parsed = parse_workflow(dir.path(), "root.md", &fetcher).unwrap();
        assert_eq!(parsed.frontmatter.name.as_deref(), Some("Triage"));
        assert!(parsed.body.contains("Handle issue"));
    }

    #[test]
    fn end_to_end_rejects_secret_in_body() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("root.md"),
            "---\nname: Bad\n---\nLeak: ${{ secrets.TOKEN }}\n",
        )
        .unwrap();

        let fetcher = NoRemoteFetcher;
        let err = parse_workflow(dir.path(), "root.md", &fetcher).unwrap_err();
        assert!(matches!(err, FrontmatterError::UnauthorizedExpression { .. }));
    }
}
