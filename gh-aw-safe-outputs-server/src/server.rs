//! The dispatcher: one `SafeOutputsServer` per process, driven line by line
//! by the stdio loop in `main`. No interior concurrency — `tools/call`
//! requests are handled strictly in arrival order.

use crate::config::{IfNoChanges, ServerConfig};
use crate::tools::{self, ToolSpec};
use gh_aw_mcp_proto::{
    InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolCallParams, ToolCallResult, ToolDefinition, ERROR_INTERNAL,
    ERROR_INVALID_PARAMS, ERROR_METHOD_NOT_FOUND,
};
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::process::Command;

pub struct SafeOutputsServer {
    config: ServerConfig,
}

impl SafeOutputsServer {
    pub fn new(config: ServerConfig) -> Self {
        SafeOutputsServer { config }
    }

    /// Dispatch one request, or return `None` for a notification (never
    /// answered) or an unparseable/unsupported shape the caller should
    /// simply drop.
    pub fn handle(&self, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = request.id.clone()?;
        let result = match request.method.as_str() {
            "initialize" => Ok(serde_json::to_value(InitializeResult::new("gh-aw-safe-outputs", env!("CARGO_PKG_VERSION"))).unwrap()),
            "tools/list" => Ok(self.tools_list()),
            "tools/call" => self.tools_call(request.params.clone().unwrap_or_default()).map(|r| serde_json::to_value(r).unwrap()),
            _ => Err(JsonRpcError::new(ERROR_METHOD_NOT_FOUND, format!("unknown method {}", request.method))),
        };
        Some(match result {
            Ok(value) => JsonRpcResponse::ok(id, value),
            Err(error) => JsonRpcResponse::err(id, error),
        })
    }

    fn tools_list(&self) -> serde_json::Value {
        let tools: Vec<ToolDefinition> = tools::CATALOG
            .iter()
            .filter(|tool| self.config.enabled_tools.is_empty() || self.config.enabled_tools.contains(tool.name))
            .map(|tool| ToolDefinition {
                name: tool.name.to_string(),
                description: tool.description.to_string(),
                input_schema: tools::input_schema(tool),
            })
            .collect();
        serde_json::json!({ "tools": tools })
    }

    fn tools_call(&self, raw_params: serde_json::Value) -> Result<ToolCallResult, JsonRpcError> {
        let params: ToolCallParams =
            serde_json::from_value(raw_params).map_err(|e| JsonRpcError::new(ERROR_INVALID_PARAMS, format!("malformed tools/call params: {e}")))?;

        let tool = tools::lookup(&params.name).ok_or_else(|| JsonRpcError::new(ERROR_INVALID_PARAMS, format!("unknown tool {}", params.name)))?;

        for field in tool.required {
            if !params.arguments.contains_key(*field) {
                return Err(JsonRpcError::new(ERROR_INVALID_PARAMS, format!("{} missing required field {field}", tool.name)));
            }
        }

        let mut entry = serde_json::Map::new();
        entry.insert("type".to_string(), serde_json::Value::String(tool.name.to_string()));
        for (key, value) in &params.arguments {
            entry.insert(key.clone(), value.clone());
        }

        if tool.name == "publish-asset" {
            self.stage_asset(&mut entry)?;
        }

        if tool.name == "create-pull-request" || tool.name == "push-to-pull-request-branch" {
            self.regenerate_patch(tool, &mut entry)?;
        }

        self.append_entry(&entry)?;
        Ok(ToolCallResult::success("success"))
    }

    fn append_entry(&self, entry: &serde_json::Map<String, serde_json::Value>) -> Result<(), JsonRpcError> {
        let line = serde_json::to_string(entry).map_err(|e| JsonRpcError::new(ERROR_INTERNAL, format!("failed to serialize entry: {e}")))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.config.output_path)
            .map_err(|e| JsonRpcError::new(ERROR_INTERNAL, format!("failed to open {}: {e}", self.config.output_path.display())))?;
        writeln!(file, "{line}").map_err(|e| JsonRpcError::new(ERROR_INTERNAL, format!("failed to append entry: {e}")))
    }

    fn stage_asset(&self, entry: &mut serde_json::Map<String, serde_json::Value>) -> Result<(), JsonRpcError> {
        const MAX_ASSET_BYTES: u64 = 10 * 1024 * 1024;
        const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "pdf", "txt", "md", "json", "log"];

        let path = entry
            .get("path")
            .and_then(|v| v.as_str())
            .ok_or_else(|| JsonRpcError::new(ERROR_INVALID_PARAMS, "publish-asset missing path"))?;
        let source = Path::new(path);

        if !gh_aw_commons::is_safe_relative_path(source) {
            return Err(JsonRpcError::new(ERROR_INVALID_PARAMS, format!("asset path {path} escapes the workspace")));
        }

        let metadata = std::fs::metadata(source).map_err(|e| JsonRpcError::new(ERROR_INVALID_PARAMS, format!("asset {path} not readable: {e}")))?;
        if metadata.len() > MAX_ASSET_BYTES {
            return Err(JsonRpcError::new(ERROR_INVALID_PARAMS, format!("asset {path} exceeds max size of {MAX_ASSET_BYTES} bytes")));
        }
        let extension = source.extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase();
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(JsonRpcError::new(ERROR_INVALID_PARAMS, format!("asset extension .{extension} is not allowed")));
        }

        let bytes = std::fs::read(source).map_err(|e| JsonRpcError::new(ERROR_INTERNAL, format!("failed to read asset {path}: {e}")))?;
        let sha = hex_digest(&bytes);
        let staged_name = if extension.is_empty() { sha.clone() } else { format!("{sha}.{extension}") };

        if let Some(assets_dir) = &self.config.assets_dir {
            std::fs::create_dir_all(assets_dir).map_err(|e| JsonRpcError::new(ERROR_INTERNAL, format!("failed to create assets dir: {e}")))?;
            std::fs::write(assets_dir.join(&staged_name), &bytes)
                .map_err(|e| JsonRpcError::new(ERROR_INTERNAL, format!("failed to stage asset {staged_name}: {e}")))?;
        }

        entry.insert("sha256".to_string(), serde_json::Value::String(sha));
        entry.insert("staged_name".to_string(), serde_json::Value::String(staged_name));
        Ok(())
    }

    fn regenerate_patch(&self, tool: &ToolSpec, entry: &mut serde_json::Map<String, serde_json::Value>) -> Result<(), JsonRpcError> {
        let Some(patch_path) = &self.config.patch_path else {
            return Ok(());
        };

        let output = Command::new("git")
            .args(["diff", "--binary", "HEAD"])
            .output()
            .map_err(|e| JsonRpcError::new(ERROR_INTERNAL, format!("failed to run git diff: {e}")))?;
        if !output.status.success() {
            return Err(JsonRpcError::new(ERROR_INTERNAL, format!("git diff exited with {}", output.status)));
        }

        std::fs::write(patch_path, &output.stdout).map_err(|e| JsonRpcError::new(ERROR_INTERNAL, format!("failed to write patch: {e}")))?;

        let patch_kb = output.stdout.len() as u32 / 1024;
        if patch_kb > self.config.max_patch_size_kb {
            return Err(JsonRpcError::new(
                ERROR_INTERNAL,
                format!("{} patch is {patch_kb}KB, exceeding the {}KB limit", tool.name, self.config.max_patch_size_kb),
            ));
        }

        if output.stdout.is_empty() && self.config.push_if_no_changes == IfNoChanges::Error {
            return Err(JsonRpcError::new(ERROR_INTERNAL, format!("{} produced an empty patch", tool.name)));
        }

        entry.insert("patch_path".to_string(), serde_json::Value::String(patch_path.display().to_string()));
        Ok(())
    }
}

fn hex_digest(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gh_aw_mcp_proto::RequestId;
    use std::collections::BTreeSet;

    fn test_config(output_path: std::path::PathBuf) -> ServerConfig {
        ServerConfig {
            output_path,
            patch_path: None,
            assets_dir: None,
            enabled_tools: BTreeSet::new(),
            staged: false,
            push_target: None,
            push_if_no_changes: IfNoChanges::Error,
            max_patch_size_kb: 1024,
            pr_title_prefix: None,
            pr_labels: Vec::new(),
        }
    }

    #[test]
    fn notification_is_never_answered() {
        let dir = tempfile::tempdir().unwrap();
        let server = SafeOutputsServer::new(test_config(dir.path().join("out.jsonl")));
        let request = JsonRpcRequest { jsonrpc: "2.0".to_string(), id: None, method: "tools/list".to_string(), params: None };
        assert!(server.handle(&request).is_none());
    }

    #[test]
    fn unknown_method_returns_method_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let server = SafeOutputsServer::new(test_config(dir.path().join("out.jsonl")));
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(RequestId::Number(1)),
            method: "tools/frobnicate".to_string(),
            params: None,
        };
        let response = server.handle(&request).unwrap();
        assert_eq!(response.error.unwrap().code, gh_aw_mcp_proto::ERROR_METHOD_NOT_FOUND);
    }

    #[test]
    fn tools_call_rejects_missing_required_field() {
        let dir = tempfile::tempdir().unwrap();
        let server = SafeOutputsServer::new(test_config(dir.path().join("out.jsonl")));
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(RequestId::Number(1)),
            method: "tools/call".to_string(),
            params: Some(serde_json::json!({"name": "create-issue", "arguments": {"title": "oops"}})),
        };
        let response = server.handle(&request).unwrap();
        assert_eq!(response.error.unwrap().code, gh_aw_mcp_proto::ERROR_INVALID_PARAMS);
    }

    #[test]
    fn tools_call_appends_jsonl_entry() {
        let dir = tempfile::tempdir().unwrap();
        let output_path = dir.path().join("out.jsonl");
        let server = SafeOutputsServer::new(test_config(output_path.clone()));
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(RequestId::Number(1)),
            method: "tools/call".to_string(),
            params: Some(serde_json::json!({"name": "create-issue", "arguments": {"title": "t", "body": "b"}})),
        };
        let response = server.handle(&request).unwrap();
        assert!(response.error.is_none());
        let written = std::fs::read_to_string(&output_path).unwrap();
        assert!(written.contains("\"type\":\"create-issue\""));
    }

    #[test]
    fn publish_asset_rejects_disallowed_extension() {
        let dir = tempfile::tempdir().unwrap();
        let asset_path = dir.path().join("payload.exe");
        std::fs::write(&asset_path, b"binary").unwrap();
        let server = SafeOutputsServer::new(test_config(dir.path().join("out.jsonl")));
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(RequestId::Number(1)),
            method: "tools/call".to_string(),
            params: Some(serde_json::json!({"name": "publish-asset", "arguments": {"path": asset_path.to_str().unwrap()}})),
        };
        let response = server.handle(&request).unwrap();
        assert!(response.error.unwrap().message.contains("not allowed"));
    }

    #[test]
    fn publish_asset_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let server = SafeOutputsServer::new(test_config(dir.path().join("out.jsonl")));
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(RequestId::Number(1)),
            method: "tools/call".to_string(),
            params: Some(serde_json::json!({"name": "publish-asset", "arguments": {"path": "../../etc/passwd"}})),
        };
        let response = server.handle(&request).unwrap();
        assert!(response.error.unwrap().message.contains("escapes the workspace"));
    }

    #[test]
    fn tools_list_filters_to_enabled_set() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path().join("out.jsonl"));
        config.enabled_tools = BTreeSet::from(["create-issue".to_string()]);
        let server = SafeOutputsServer::new(config);
        let request = JsonRpcRequest { jsonrpc: "2.0".to_string(), id: Some(RequestId::Number(1)), method: "tools/list".to_string(), params: None };
        let response = server.handle(&request).unwrap();
        let tools = response.result.unwrap()["tools"].as_array().unwrap().len();
        assert_eq!(tools, 1);
    }
}
