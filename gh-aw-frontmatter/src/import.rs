//! Recursive import resolution: local files, remote `owner/repo/path[@ref]`
//! references, and inline `{{#import path}}` body directives.

use crate::document::parse_document;
use crate::errors::{FrontmatterError, Result};
use gh_aw_commons::is_safe_relative_path;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Frontmatter keys an imported (non-root) file is allowed to declare.
const IMPORTED_ALLOWED_KEYS: &[&str] = &["tools", "mcp-servers", "services"];

/// One resolved document in import order, root last.
pub struct ResolvedFragment {
    pub source_path: String,
    pub frontmatter: serde_yaml::Value,
    pub body: String,
    /// Keys stripped from this fragment's frontmatter because it was an
    /// import and declared a key only the root may use.
    pub stripped_keys: Vec<String>,
}

/// Fetches the text content of a remote `owner/repo/path[@ref]` reference.
/// Implemented by the host integration; the resolver itself has no opinion
/// on how the fetch is authenticated or cached.
pub trait RemoteFetcher {
    fn fetch(&self, owner: &str, repo: &str, path: &str, reference: Option<&str>) -> anyhow::Result<String>;
}

/// A fetcher that always fails, for contexts with no remote imports.
pub struct NoRemoteFetcher;

impl RemoteFetcher for NoRemoteFetcher {
    fn fetch(&self, owner: &str, repo: &str, path: &str, _reference: Option<&str>) -> anyhow::Result<String> {
        anyhow::bail!("remote imports are disabled (requested {owner}/{repo}/{path})")
    }
}

static INLINE_IMPORT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{#import(\?)?\s+([^}]+?)\s*\}\}").unwrap());

static REMOTE_REF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\w.-]+)/([\w.-]+)/(.+?)(?:@([\w./-]+))?$").unwrap());

struct ImportRef {
    path: String,
    section: Option<String>,
    optional: bool,
}

fn parse_import_target(raw: &str, optional: bool) -> ImportRef {
    match raw.split_once('#') {
        Some((path, section)) => ImportRef {
            path: path.to_string(),
            section: Some(section.to_string()),
            optional,
        },
        None => ImportRef {
            path: raw.to_string(),
            section: None,
            optional,
        },
    }
}

fn extract_section(body: &str, heading: &str) -> Option<String> {
    let heading_re = Regex::new(r"(?m)^(#{1,6})\s+(.+)$").unwrap();
    let mut matches: Vec<(usize, usize, String)> = Vec::new();
    for caps in heading_re.captures_iter(body) {
        let whole = caps.get(0).unwrap();
        let level = caps[1].len();
        let title = caps[2].trim().to_string();
        matches.push((whole.start(), level, title));
    }
    for (idx, (start, level, title)) in matches.iter().enumerate() {
        if title != heading {
            continue;
        }
        let content_start = body[*start..].find('\n').map(|n| start + n + 1).unwrap_or(body.len());
        let content_end = matches[idx + 1..]
            .iter()
            .find(|(_, lvl, _)| lvl <= level)
            .map(|(s, _, _)| *s)
            .unwrap_or(body.len());
        return Some(body[content_start..content_end].to_string());
    }
    None
}

/// Resolves a root [`crate::document`] into a flat, order-preserving list of
/// fragments, recursing through `imports:` entries and inline
/// `{{#import}}` directives with cycle detection.
pub struct ImportResolver<'a> {
    root_dir: PathBuf,
    fetcher: &'a dyn RemoteFetcher,
    stack: Vec<String>,
}

impl<'a> ImportResolver<'a> {
    pub fn new(root_dir: impl Into<PathBuf>, fetcher: &'a dyn RemoteFetcher) -> Self {
        ImportResolver {
            root_dir: root_dir.into(),
            fetcher,
            stack: Vec::new(),
        }
    }

    pub fn resolve(&mut self, root_path: &str) -> Result<Vec<ResolvedFragment>> {
        let mut out = Vec::new();
        self.resolve_into(root_path, true, &mut out)?;
        Ok(out)
    }

    fn resolve_into(&mut self, reference: &str, is_root: bool, out: &mut Vec<ResolvedFragment>) -> Result<()> {
        if self.stack.contains(&reference.to_string()) {
            let mut cycle = self.stack.clone();
            cycle.push(reference.to_string());
            return Err(FrontmatterError::CycleError { cycle });
        }
        self.stack.push(reference.to_string());

        let source = self.read(reference)?;
        let mut doc = parse_document(reference, &source)?;

        let imports: Vec<String> = doc
            .frontmatter
            .get("imports")
            .and_then(|v| v.as_sequence())
            .map(|seq| seq.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        for import_path in imports {
            self.resolve_into(&import_path, false, out)?;
        }

        doc.body = self.expand_inline_imports(&doc.body, out)?;

        let stripped_keys = if is_root {
            Vec::new()
        } else {
            strip_disallowed_keys(&mut doc.frontmatter)
        };
        for key in &stripped_keys {
            tracing::warn!(key, source = reference, "dropped disallowed key from imported frontmatter");
        }

        out.push(ResolvedFragment {
            source_path: reference.to_string(),
            frontmatter: doc.frontmatter,
            body: doc.body,
            stripped_keys,
        });

        self.stack.pop();
        Ok(())
    }

    fn expand_inline_imports(&mut self, body: &str, out: &mut Vec<ResolvedFragment>) -> Result<String> {
        let directives: Vec<(std::ops::Range<usize>, bool, String)> = INLINE_IMPORT_REGEX
            .captures_iter(body)
            .map(|caps| {
                let whole = caps.get(0).unwrap();
                let optional = caps.get(1).is_some();
                let target = caps[2].trim().to_string();
                (whole.range(), optional, target)
            })
            .collect();

        if directives.is_empty() {
            return Ok(body.to_string());
        }

        let mut result = String::with_capacity(body.len());
        let mut cursor = 0usize;
        for (range, optional, target) in directives {
            result.push_str(&body[cursor..range.start]);
            let import_ref = parse_import_target(&target, optional);
            match self.resolve_inline(&import_ref, out) {
                Ok(fragment) => result.push_str(&fragment),
                Err(err) if import_ref.optional => {
                    tracing::debug!(path = import_ref.path, error = %err, "optional import missing, substituting empty fragment");
                }
                Err(err) => return Err(err),
            }
            cursor = range.end;
        }
        result.push_str(&body[cursor..]);
        Ok(result)
    }

    fn resolve_inline(&mut self, import_ref: &ImportRef, out: &mut Vec<ResolvedFragment>) -> Result<String> {
        let source = self.read(&import_ref.path)?;
        let doc = parse_document(&import_ref.path, &source)?;
        let expanded_body = self.expand_inline_imports(&doc.body, out)?;
        match &import_ref.section {
            Some(heading) => extract_section(&expanded_body, heading).ok_or_else(|| FrontmatterError::NotFoundError {
                path: format!("{}#{heading}", import_ref.path),
            }),
            None => Ok(expanded_body),
        }
    }

    fn read(&self, reference: &str) -> Result<String> {
        if let Some(remote) = parse_remote_reference(reference) {
            return self
                .fetcher
                .fetch(&remote.owner, &remote.repo, &remote.path, remote.reference.as_deref())
                .map_err(|source| FrontmatterError::ImportError {
                    path: reference.to_string(),
                    source,
                });
        }

        let path = Path::new(reference);
        if !is_safe_relative_path(path) {
            return Err(FrontmatterError::NotFoundError {
                path: reference.to_string(),
            });
        }
        let full_path = self.root_dir.join(path);
        std::fs::read_to_string(&full_path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                FrontmatterError::NotFoundError {
                    path: reference.to_string(),
                }
            } else {
                FrontmatterError::ImportError {
                    path: reference.to_string(),
                    source: err.into(),
                }
            }
        })
    }
}

struct RemoteReference {
    owner: String,
    repo: String,
    path: String,
    reference: Option<String>,
}

fn parse_remote_reference(reference: &str) -> Option<RemoteReference> {
    if reference.starts_with('.') || reference.starts_with('/') || !reference.contains('/') {
        return None;
    }
    let caps = REMOTE_REF_REGEX.captures(reference)?;
    Some(RemoteReference {
        owner: caps[1].to_string(),
        repo: caps[2].to_string(),
        path: caps[3].to_string(),
        reference: caps.get(4).map(|m| m.as_str().to_string()),
    })
}

fn strip_disallowed_keys(frontmatter: &mut serde_yaml::Value) -> Vec<String> {
    let Some(mapping) = frontmatter.as_mapping_mut() else {
        return Vec::new();
    };
    let mut stripped = Vec::new();
    let keys: Vec<serde_yaml::Value> = mapping.keys().cloned().collect();
    for key in keys {
        if let Some(key_str) = key.as_str() {
            if !IMPORTED_ALLOWED_KEYS.contains(&key_str) {
                mapping.remove(&key);
                stripped.push(key_str.to_string());
            }
        }
    }
    stripped
}

/// Convenience grouping of the frontmatter/body pairs a merger consumes,
/// keyed by their originating path for diagnostics.
pub fn fragments_by_source(fragments: &[ResolvedFragment]) -> BTreeMap<String, usize> {
    fragments
        .iter()
        .enumerate()
        .map(|(idx, fragment)| (fragment.source_path.clone(), idx))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn resolves_declared_import_with_root_last() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "shared.md", "---\ntools:\n  - kind: builtin\n    tool: bash\n---\nshared body\n");
        write(
            dir.path(),
            "root.md",
            "---\nname: Root\nimports: [shared.md]\n---\nroot body\n",
        );

        let fetcher = NoRemoteFetcher;
        let mut resolver = ImportResolver::new(dir.path(), &fetcher);
        let fragments = resolver.resolve("root.md").unwrap();

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].source_path, "shared.md");
        assert_eq!(fragments[1].source_path, "root.md");
    }

    #[test]
    fn strips_disallowed_keys_from_imports() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "shared.md", "---\nname: nope\ntools: []\n---\nbody\n");
        write(dir.path(), "root.md", "---\nimports: [shared.md]\n---\nbody\n");

        let fetcher = NoRemoteFetcher;
        let mut resolver = ImportResolver::new(dir.path(), &fetcher);
        let fragments = resolver.resolve("root.md").unwrap();
        assert_eq!(fragments[0].stripped_keys, vec!["name".to_string()]);
        assert!(fragments[0].frontmatter.get("name").is_none());
    }

    #[test]
    fn detects_import_cycle() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.md", "---\nimports: [b.md]\n---\na\n");
        write(dir.path(), "b.md", "---\nimports: [a.md]\n---\nb\n");

        let fetcher = NoRemoteFetcher;
        let mut resolver = ImportResolver::new(dir.path(), &fetcher);
        let err = resolver.resolve("a.md").unwrap_err();
        assert!(matches!(err, FrontmatterError::CycleError { .. }));
    }

    #[test]
    fn missing_required_import_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "root.md", "---\nimports: [missing.md]\n---\nbody\n");

        let fetcher = NoRemoteFetcher;
        let mut resolver = ImportResolver::new(dir.path(), &fetcher);
        let err = resolver.resolve("root.md").unwrap_err();
        assert!(matches!(err, FrontmatterError::NotFoundError { .. }));
    }

    #[test]
    fn optional_inline_import_substitutes_empty_fragment() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "root.md", "---\n---\nbefore {{#import? missing.md}} after\n");

        let fetcher = NoRemoteFetcher;
        let mut resolver = ImportResolver::new(dir.path(), &fetcher);
        let fragments = resolver.resolve("root.md").unwrap();
        assert_eq!(fragments[0].body, "before  after\n");
    }

    #[test]
    fn required_inline_import_expands_body_text() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "snippet.md", "---\n---\nsnippet text\n");
        write(dir.path(), "root.md", "---\n---\nbefore {{#import snippet.md}} after\n");

        let fetcher = NoRemoteFetcher;
        let mut resolver = ImportResolver::new(dir.path(), &fetcher);
        let fragments = resolver.resolve("root.md").unwrap();
        assert!(fragments[0].body.contains("snippet text"));
    }

    #[test]
    fn inline_import_with_section_extracts_heading_block() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "doc.md",
            "---\n---\n# Intro\nintro text\n# Usage\nusage text\n# Notes\nnotes text\n",
        );
        write(dir.path(), "root.md", "---\n---\n{{#import doc.md#Usage}}\n");

        let fetcher = NoRemoteFetcher;
        let mut resolver = ImportResolver::new(dir.path(), &fetcher);
        let fragments = resolver.resolve("root.md").unwrap();
        assert!(fragments[0].body.contains("usage text"));
        assert!(!fragments[0].body.contains("notes text"));
    }

    #[test]
    fn rejects_path_traversal_import() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "root.md", "---\nimports: ['../../etc/passwd']\n---\nbody\n");

        let fetcher = NoRemoteFetcher;
        let mut resolver = ImportResolver::new(dir.path(), &fetcher);
        let err = resolver.resolve("root.md").unwrap_err();
        assert!(matches!(err, FrontmatterError::NotFoundError { .. }));
    }
}
