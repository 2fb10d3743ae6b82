//! Folding a sequence of resolved fragments into one frontmatter tree.

use crate::errors::{FrontmatterError, Result};
use crate::import::ResolvedFragment;
use gh_aw_schema::{AllowList, CompilerDiagnostic};
use std::collections::BTreeMap;

/// Deep-merge `incoming` into `base`: maps merge key-by-key, arrays
/// concatenate in order (except `allowed`, which unions through
/// [`AllowList`] so a wildcard on either side dominates and named entries
/// dedupe instead of doubling up), and on scalar collision the incoming
/// (later, more specific) value wins.
fn deep_merge(base: &mut serde_yaml::Value, incoming: serde_yaml::Value) {
    match (base, incoming) {
        (serde_yaml::Value::Mapping(base_map), serde_yaml::Value::Mapping(incoming_map)) => {
            for (key, incoming_value) in incoming_map {
                match base_map.get_mut(&key) {
                    Some(existing) if key.as_str() == Some("allowed") => {
                        merge_allow_list(existing, incoming_value);
                    }
                    Some(existing) => deep_merge(existing, incoming_value),
                    None => {
                        base_map.insert(key, incoming_value);
                    }
                }
            }
        }
        (serde_yaml::Value::Sequence(base_seq), serde_yaml::Value::Sequence(mut incoming_seq)) => {
            base_seq.append(&mut incoming_seq);
        }
        (base_slot, incoming_value) => {
            *base_slot = incoming_value;
        }
    }
}

/// Merge two `allowed:` values through [`AllowList::union`] rather than
/// concatenating the raw arrays, so a `["*"]` on either side wins outright
/// and repeated tool names collapse into one.
fn merge_allow_list(base: &mut serde_yaml::Value, incoming: serde_yaml::Value) {
    let (Ok(base_list), Ok(incoming_list)) =
        (serde_yaml::from_value::<AllowList>(base.clone()), serde_yaml::from_value::<AllowList>(incoming.clone()))
    else {
        deep_merge(base, incoming);
        return;
    };
    *base = serde_yaml::to_value(base_list.union(incoming_list)).expect("AllowList serializes");
}

fn job_names(frontmatter: &serde_yaml::Value) -> Vec<String> {
    frontmatter
        .get("safe-outputs")
        .and_then(|v| v.get("jobs"))
        .and_then(|v| v.as_mapping())
        .map(|mapping| {
            mapping
                .keys()
                .filter_map(|k| k.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Fold `fragments` (root last, per [`crate::import::ImportResolver`]) into
/// a single raw frontmatter tree, enforcing global uniqueness of
/// `safe-outputs.jobs` keys across the whole import graph.
pub fn merge_fragments(fragments: &[ResolvedFragment]) -> Result<(serde_yaml::Value, String, Vec<CompilerDiagnostic>)> {
    let mut merged = serde_yaml::Value::Mapping(Default::default());
    let mut body = String::new();
    let mut diagnostics = Vec::new();
    let mut job_owners: BTreeMap<String, String> = BTreeMap::new();

    for fragment in fragments {
        for job_name in job_names(&fragment.frontmatter) {
            if let Some(existing_source) = job_owners.get(&job_name) {
                if existing_source != &fragment.source_path {
                    return Err(FrontmatterError::SafeJobConflict {
                        name: job_name,
                        source_a: existing_source.clone(),
                        source_b: fragment.source_path.clone(),
                    });
                }
            } else {
                job_owners.insert(job_name, fragment.source_path.clone());
            }
        }

        for key in &fragment.stripped_keys {
            diagnostics.push(
                CompilerDiagnostic::warning(
                    "UnauthorizedKey",
                    format!("'{key}' is not permitted in imported frontmatter and was dropped"),
                )
                .with_pointer(format!("/{key}")),
            );
        }

        deep_merge(&mut merged, fragment.frontmatter.clone());
        body.push_str(&fragment.body);
        if !fragment.body.ends_with('\n') {
            body.push('\n');
        }
    }

    Ok((merged, body, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::ResolvedFragment;

    fn fragment(source: &str, yaml: &str, body: &str) -> ResolvedFragment {
        ResolvedFragment {
            source_path: source.to_string(),
            frontmatter: serde_yaml::from_str(yaml).unwrap(),
            body: body.to_string(),
            stripped_keys: Vec::new(),
        }
    }

    #[test]
    fn arrays_concatenate_in_order() {
        let fragments = vec![
            fragment("a.md", "tools: [a]\n", "a body\n"),
            fragment("b.md", "tools: [b]\n", "b body\n"),
        ];
        let (merged, body, _) = merge_fragments(&fragments).unwrap();
        let tools = merged.get("tools").unwrap().as_sequence().unwrap();
        assert_eq!(tools.len(), 2);
        assert!(body.contains("a body"));
        assert!(body.contains("b body"));
    }

    #[test]
    fn later_scalar_wins() {
        let fragments = vec![
            fragment("a.md", "name: First\n", ""),
            fragment("b.md", "name: Second\n", ""),
        ];
        let (merged, _, _) = merge_fragments(&fragments).unwrap();
        assert_eq!(merged.get("name").unwrap().as_str(), Some("Second"));
    }

    #[test]
    fn conflicting_safe_output_job_names_are_fatal() {
        let fragments = vec![
            fragment("a.md", "safe-outputs:\n  jobs:\n    deploy: {}\n", ""),
            fragment("b.md", "safe-outputs:\n  jobs:\n    deploy: {}\n", ""),
        ];
        let err = merge_fragments(&fragments).unwrap_err();
        assert!(matches!(err, FrontmatterError::SafeJobConflict { .. }));
    }

    #[test]
    fn same_source_job_name_is_not_a_conflict() {
        let fragments = vec![fragment("a.md", "safe-outputs:\n  jobs:\n    deploy: {}\n", "")];
        assert!(merge_fragments(&fragments).is_ok());
    }

    #[test]
    fn allowed_lists_union_instead_of_concatenating() {
        let fragments = vec![
            fragment("a.md", "mcp-servers:\n  github:\n    allowed: [read_file]\n", ""),
            fragment("b.md", "mcp-servers:\n  github:\n    allowed: [read_file, write_file]\n", ""),
        ];
        let (merged, _, _) = merge_fragments(&fragments).unwrap();
        let allowed = merged.get("mcp-servers").unwrap().get("github").unwrap().get("allowed").unwrap().as_sequence().unwrap();
        assert_eq!(allowed.len(), 2);
    }

    #[test]
    fn wildcard_allowed_list_dominates_union() {
        let fragments = vec![
            fragment("a.md", "mcp-servers:\n  github:\n    allowed: [read_file]\n", ""),
            fragment("b.md", "mcp-servers:\n  github:\n    allowed: [\"*\"]\n", ""),
        ];
        let (merged, _, _) = merge_fragments(&fragments).unwrap();
        let allowed = merged.get("mcp-servers").unwrap().get("github").unwrap().get("allowed").unwrap().as_sequence().unwrap();
        assert_eq!(allowed, &vec![serde_yaml::Value::from("*")]);
    }
}
