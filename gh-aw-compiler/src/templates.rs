//! Embedded runtime scripts, modeled as named templates with a fixed
//! parameter set rather than scattered indentation-sensitive string
//! concatenation. Every caller goes through [`Template::render`]; none
//! hand-assembles shell text.

use std::collections::BTreeMap;

pub struct Template {
    pub name: &'static str,
    body: &'static str,
}

impl Template {
    /// Substitute `{{param}}` placeholders. Unknown placeholders are left
    /// untouched so a missing binding fails loudly downstream rather than
    /// silently emitting a broken script.
    pub fn render(&self, params: &BTreeMap<&str, String>) -> String {
        let mut out = self.body.to_string();
        for (key, value) in params {
            out = out.replace(&format!("{{{{{key}}}}}"), value);
        }
        out
    }
}

pub const REDACTION_SCRIPT: Template = Template {
    name: "redact-secrets",
    body: r#"set -euo pipefail
IFS=',' read -ra NAMES <<< "${GITHUB_AW_SECRET_NAMES:-}"
TARGETS=({{target_paths}})
for path in "${TARGETS[@]}"; do
  [ -f "$path" ] || continue
  for name in "${NAMES[@]}"; do
    [ -z "$name" ] && continue
    value_var="SECRET_${name}"
    value="${!value_var:-}"
    [ -z "$value" ] && continue
    sed -i "s/$(printf '%s' "$value" | sed 's/[.[\*^$/]/\\&/g')/***/g" "$path" || true
  done
done
"#,
};

pub const SAFE_OUTPUT_FETCH_SCRIPT: Template = Template {
    name: "safe-output-fetch",
    body: r#"set -euo pipefail
OUTPUT_FILE="${GITHUB_AW_AGENT_OUTPUT}"
[ -f "$OUTPUT_FILE" ] || { echo "no agent output found" >&2; exit 0; }
jq -c 'select(.type == "{{output_type}}")' "$OUTPUT_FILE" | head -n {{max_items}} > selected.jsonl
echo "count=$(wc -l < selected.jsonl)" >> "$GITHUB_OUTPUT"
"#,
};

pub const STAGED_PREVIEW_SCRIPT: Template = Template {
    name: "staged-preview",
    body: r#"set -euo pipefail
echo "### Staged preview: {{output_type}}" >> "$GITHUB_STEP_SUMMARY"
while IFS= read -r line; do
  echo "- would execute: $line" >> "$GITHUB_STEP_SUMMARY"
done < selected.jsonl
"#,
};

pub const PR_METADATA_VALIDATION_SCRIPT: Template = Template {
    name: "validate-pr-metadata",
    body: r#"set -euo pipefail
PR_JSON="$(gh pr view "$PR_NUMBER" --json title,labels)"
TITLE="$(echo "$PR_JSON" | jq -r '.title')"
if [ -n "${TITLE_PREFIX:-}" ] && [[ "$TITLE" != "$TITLE_PREFIX"* ]]; then
  echo "::error::PR title '$TITLE' does not start with required prefix '$TITLE_PREFIX'" >&2
  exit 1
fi
if [ -n "${LABELS:-}" ]; then
  IFS=',' read -ra REQUIRED <<< "$LABELS"
  PR_LABELS="$(echo "$PR_JSON" | jq -r '.labels[].name')"
  for label in "${REQUIRED[@]}"; do
    echo "$PR_LABELS" | grep -qx "$label" || { echo "::error::PR is missing required label '$label'" >&2; exit 1; }
  done
fi
"#,
};

/// Runs the same offline parser `gh-aw logs` wraps, against the run's own
/// agent-output log, instead of reimplementing the JSONL/mixed-log framing
/// in shell. `gh-aw logs` exits non-zero when a declared MCP server never
/// came up, which fails this step and the job with it.
pub const LOG_PARSER_SCRIPT: Template = Template {
    name: "log-parser",
    body: r#"set -euo pipefail
gh-aw logs "{{log_path}}" --engine {{engine_id}} >> "$GITHUB_STEP_SUMMARY"
"#,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_known_placeholder() {
        let mut params = BTreeMap::new();
        params.insert("engine_id", "claude".to_string());
        params.insert("log_path", "/tmp/agent.log".to_string());
        let rendered = LOG_PARSER_SCRIPT.render(&params);
        assert!(rendered.contains("--engine claude"));
        assert!(rendered.contains("/tmp/agent.log"));
    }

    #[test]
    fn missing_placeholder_is_left_untouched() {
        let params = BTreeMap::new();
        let rendered = LOG_PARSER_SCRIPT.render(&params);
        assert!(rendered.contains("{{engine_id}}"));
    }
}
