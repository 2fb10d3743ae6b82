//! `ToolDecl` / `Transport`: the tagged-variant tool declaration model.
//!
//! A tool is either a built-in (mapped onto a canonical MCP server or a
//! native engine flag) or a fully specified MCP server reachable over one
//! of three transports: containerized stdio, a plain stdio command, or
//! remote HTTP.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Built-in tools normalized to a canonical MCP server or native engine
/// flag by the tool resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuiltinTool {
    Github,
    Bash,
    Edit,
    WebFetch,
    WebSearch,
    Playwright,
    AgenticWorkflows,
    CacheMemory,
}

impl BuiltinTool {
    /// Tools the resolver maps onto an MCP server (as opposed to a native
    /// engine-side flag).
    pub fn is_mcp_backed(self) -> bool {
        matches!(
            self,
            BuiltinTool::Github | BuiltinTool::Playwright | BuiltinTool::CacheMemory
        )
    }

    pub fn canonical_server_id(self) -> Option<&'static str> {
        match self {
            BuiltinTool::Github => Some("github"),
            BuiltinTool::Playwright => Some("playwright"),
            BuiltinTool::CacheMemory => Some("memory"),
            _ => None,
        }
    }
}

/// Per-server tool allow-list. `All` corresponds to the `["*"]` sentinel,
/// meaning no restriction is applied at this layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AllowList {
    All(AllStar),
    Named(Vec<String>),
}

/// Marker matching the literal `["*"]` array so `AllowList` round-trips
/// through YAML without a custom (de)serializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct AllStar;

impl TryFrom<Vec<String>> for AllStar {
    type Error = String;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        if value == ["*"] {
            Ok(AllStar)
        } else {
            Err("not a wildcard allow-list".to_string())
        }
    }
}

impl From<AllStar> for Vec<String> {
    fn from(_: AllStar) -> Self {
        vec!["*".to_string()]
    }
}

impl Default for AllowList {
    fn default() -> Self {
        AllowList::Named(Vec::new())
    }
}

impl AllowList {
    pub fn is_all(&self) -> bool {
        matches!(self, AllowList::All(_))
    }

    pub fn allows(&self, tool_name: &str) -> bool {
        match self {
            AllowList::All(_) => true,
            AllowList::Named(names) => names.iter().any(|n| n == tool_name),
        }
    }

    /// Union two allow-lists; `All` dominates.
    pub fn union(self, other: AllowList) -> AllowList {
        match (self, other) {
            (AllowList::All(_), _) | (_, AllowList::All(_)) => AllowList::All(AllStar),
            (AllowList::Named(mut a), AllowList::Named(b)) => {
                for name in b {
                    if !a.contains(&name) {
                        a.push(name);
                    }
                }
                AllowList::Named(a)
            }
        }
    }
}

/// stdio-command transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdioTransport {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// containerized stdio transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerTransport {
    pub container: String,
    #[serde(default)]
    pub version: Option<String>,
    /// docker arguments placed before the image reference.
    #[serde(default)]
    pub args: Vec<String>,
    /// arguments placed after the image reference.
    #[serde(default)]
    pub entrypoint_args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub network: Option<crate::network::NetworkPolicy>,
}

/// remote HTTP transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpTransport {
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// One of the three transports an MCP server declaration may use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Transport {
    Container(ContainerTransport),
    Stdio(StdioTransport),
    Http(HttpTransport),
}

impl Transport {
    pub fn network_policy(&self) -> Option<&crate::network::NetworkPolicy> {
        match self {
            Transport::Container(c) => c.network.as_ref(),
            _ => None,
        }
    }

    pub fn is_containerized_stdio(&self) -> bool {
        matches!(self, Transport::Container(_))
    }
}

/// user-declared `mcp-servers.<id>` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServerDecl {
    pub id: String,
    #[serde(flatten)]
    pub transport: Transport,
    #[serde(default)]
    pub allowed: AllowList,
}

/// A normalized tool declaration: either a built-in (with an optional
/// allow-list) or a fully specified MCP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ToolDecl {
    Builtin {
        tool: BuiltinTool,
        #[serde(default)]
        allowed: AllowList,
    },
    Mcp(McpServerDecl),
}

impl ToolDecl {
    pub fn name(&self) -> String {
        match self {
            ToolDecl::Builtin { tool, .. } => format!("{tool:?}").to_ascii_lowercase(),
            ToolDecl::Mcp(decl) => decl.id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_all_dominates_union() {
        let a = AllowList::Named(vec!["read_file".to_string()]);
        let b = AllowList::All(AllStar);
        assert!(a.union(b).is_all());
    }

    #[test]
    fn allow_list_named_union_dedupes() {
        let a = AllowList::Named(vec!["x".to_string()]);
        let b = AllowList::Named(vec!["x".to_string(), "y".to_string()]);
        let AllowList::Named(names) = a.union(b) else {
            panic!("expected named");
        };
        assert_eq!(names, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn transport_is_untagged_by_shape() {
        let yaml = "container: ghcr.io/example/tool\nnetwork:\n  allowed: [github]\n";
        let transport: Transport = serde_yaml::from_str(yaml).unwrap();
        assert!(transport.is_containerized_stdio());
    }
}
