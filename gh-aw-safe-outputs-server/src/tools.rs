//! The fixed catalog of safe-output tools: names, descriptions, and the
//! fields `tools/call` requires for each.

/// One entry of the tool catalog. `required` drives both `inputSchema`
/// generation for `tools/list` and argument validation in `tools/call`.
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub required: &'static [&'static str],
}

pub const CATALOG: &[ToolSpec] = &[
    ToolSpec { name: "create-issue", description: "Create a new issue", required: &["title", "body"] },
    ToolSpec { name: "add-comment", description: "Add a comment to the triggering issue or pull request", required: &["body"] },
    ToolSpec {
        name: "create-pull-request",
        description: "Open a pull request from a branch containing the agent's changes",
        required: &["title", "body", "branch"],
    },
    ToolSpec {
        name: "push-to-pull-request-branch",
        description: "Push a commit onto an existing pull request's branch",
        required: &["branch", "commit_message"],
    },
    ToolSpec {
        name: "create-pull-request-review-comment",
        description: "Leave a review comment on a specific line of a pull request diff",
        required: &["path", "line", "body"],
    },
    ToolSpec { name: "create-discussion", description: "Start a new discussion", required: &["title", "body"] },
    ToolSpec {
        name: "create-agent-task",
        description: "Hand off follow-up work to a Copilot coding agent task",
        required: &["title", "body"],
    },
    ToolSpec { name: "add-labels", description: "Apply labels to the target issue or pull request", required: &["labels"] },
    ToolSpec { name: "update-issue", description: "Update fields on an existing issue", required: &[] },
    ToolSpec { name: "update-release", description: "Update an existing release's notes or assets", required: &["operation", "body"] },
    ToolSpec {
        name: "create-code-scanning-alert",
        description: "Report a code scanning finding",
        required: &["file", "line", "severity", "message"],
    },
    ToolSpec { name: "missing-tool", description: "Report that a capability the agent needed was unavailable", required: &["tool", "reason"] },
    ToolSpec { name: "publish-asset", description: "Stage a generated file as a content-addressable build asset", required: &["path"] },
    ToolSpec { name: "noop", description: "Record a no-op outcome when nothing else was produced", required: &["message"] },
];

pub fn lookup(name: &str) -> Option<&'static ToolSpec> {
    CATALOG.iter().find(|tool| tool.name == name)
}

/// `inputSchema` object for a tool: every `required` field as an untyped
/// JSON Schema property, matching draft-2020-12's minimal shape.
pub fn input_schema(tool: &ToolSpec) -> serde_json::Value {
    let properties: serde_json::Map<String, serde_json::Value> =
        tool.required.iter().map(|field| ((*field).to_string(), serde_json::json!({}))).collect();
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": tool.required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_known_tool() {
        let tool = lookup("create-issue").unwrap();
        assert_eq!(tool.required, &["title", "body"]);
    }

    #[test]
    fn lookup_rejects_unknown_tool() {
        assert!(lookup("delete-repository").is_none());
    }

    #[test]
    fn input_schema_lists_required_fields() {
        let tool = lookup("create-pull-request").unwrap();
        let schema = input_schema(tool);
        assert_eq!(schema["required"], serde_json::json!(["title", "body", "branch"]));
        assert!(schema["properties"]["branch"].is_object());
    }
}
