//! Tool & MCP resolver: normalizes `tools:` + `mcp-servers:` into a
//! concrete set of MCP server configs and per-tool allow-lists.

use crate::errors::{CompileError, Result};
use gh_aw_schema::{AllowList, BuiltinTool, ContainerTransport, FrontmatterTree, NetworkPolicy, ToolDecl, Transport};

pub struct ResolvedMcpServer {
    pub id: String,
    pub transport: Transport,
    pub allowed: AllowList,
}

pub struct ResolvedToolset {
    pub mcp_servers: Vec<ResolvedMcpServer>,
    pub native_flags: Vec<BuiltinTool>,
}

fn canonical_server_transport(tool: BuiltinTool) -> Option<Transport> {
    match tool {
        BuiltinTool::Github => Some(Transport::Container(ContainerTransport {
            container: "ghcr.io/github/github-mcp-server".to_string(),
            version: Some("latest".to_string()),
            ..Default::default()
        })),
        BuiltinTool::Playwright => Some(Transport::Container(ContainerTransport {
            container: "ghcr.io/microsoft/playwright-mcp".to_string(),
            version: Some("latest".to_string()),
            network: Some(NetworkPolicy::Allowed(vec!["playwright".to_string()])),
            ..Default::default()
        })),
        BuiltinTool::CacheMemory => Some(Transport::Container(ContainerTransport {
            container: "ghcr.io/gh-aw/memory-mcp".to_string(),
            version: Some("latest".to_string()),
            ..Default::default()
        })),
        _ => None,
    }
}

/// Resolve `tree.tools` + `tree.mcp_servers` into a concrete toolset,
/// validating transport/network pairing and expanding ecosystem ids.
pub fn resolve_tools(tree: &FrontmatterTree) -> Result<ResolvedToolset> {
    let mut mcp_servers = Vec::new();
    let mut native_flags = Vec::new();

    for decl in &tree.tools {
        match decl {
            ToolDecl::Builtin { tool, allowed } => match canonical_server_transport(*tool) {
                Some(transport) => mcp_servers.push(ResolvedMcpServer {
                    id: tool.canonical_server_id().unwrap_or("unknown").to_string(),
                    transport,
                    allowed: allowed.clone(),
                }),
                None => native_flags.push(*tool),
            },
            ToolDecl::Mcp(server) => {
                mcp_servers.push(ResolvedMcpServer {
                    id: server.id.clone(),
                    transport: server.transport.clone(),
                    allowed: server.allowed.clone(),
                });
            }
        }
    }

    for (id, decl) in &tree.mcp_servers {
        if let ToolDecl::Mcp(server) = decl {
            mcp_servers.push(ResolvedMcpServer {
                id: id.clone(),
                transport: server.transport.clone(),
                allowed: server.allowed.clone(),
            });
        }
    }

    for server in &mut mcp_servers {
        validate_network_pairing(server)?;
        expand_network_ecosystems(server);
    }

    Ok(ResolvedToolset {
        mcp_servers,
        native_flags,
    })
}

fn validate_network_pairing(server: &ResolvedMcpServer) -> Result<()> {
    let has_network = server.transport.network_policy().is_some();
    if has_network && !server.transport.is_containerized_stdio() {
        return Err(CompileError::NetworkOnNonContainer { server: server.id.clone() });
    }
    Ok(())
}

fn expand_network_ecosystems(server: &mut ResolvedMcpServer) {
    let Transport::Container(container) = &mut server.transport else {
        return;
    };
    let Some(NetworkPolicy::Allowed(entries)) = &container.network else {
        return;
    };
    for entry in entries {
        if entry.contains('*') {
            tracing::warn!(server = server.id, entry, "wildcard entries in network.allowed are rejected, not expanded");
        }
    }
    let expanded = gh_aw_schema::network::expand_allowlist(entries);
    container.network = Some(NetworkPolicy::Allowed(expanded));
}

/// Reject a wildcard character in any raw (pre-expansion) `network.allowed`
/// entry across the resolved toolset.
pub fn reject_network_wildcards(tree: &FrontmatterTree, toolset: &ResolvedToolset) -> Result<()> {
    if let Some(NetworkPolicy::Allowed(entries)) = &tree.network {
        if entries.iter().any(|e| e.contains('*')) {
            return Err(CompileError::WildcardInAllowlist { server: "workflow".to_string() });
        }
    }
    for server in &toolset.mcp_servers {
        if let Transport::Container(container) = &server.transport {
            if let Some(NetworkPolicy::Allowed(entries)) = &container.network {
                if entries.iter().any(|e| e.contains('*')) {
                    return Err(CompileError::WildcardInAllowlist { server: server.id.clone() });
                }
            }
        }
    }
    Ok(())
}
