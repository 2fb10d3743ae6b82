//! Network proxy generator: for each containerized MCP server with
//! `network.allowed`, emits a sidecar egress-proxy service plus the
//! iptables/env wiring that forces all TCP egress through it.

use crate::lock::Job;
use crate::tools::ResolvedMcpServer;
use gh_aw_schema::{NetworkPolicy, Transport};
use serde_yaml::Value;

pub struct ProxyPlan {
    pub server_id: String,
    pub allowed_domains: Vec<String>,
    pub service_name: String,
}

/// Build a proxy plan for every containerized server with an explicit
/// allow-list. Servers with `NetworkPolicy::DenyAll` get no sidecar (their
/// egress is simply not connected). Servers with `Defaults` use the
/// curated `defaults` ecosystem domains.
pub fn plan_proxies(servers: &[ResolvedMcpServer]) -> Vec<ProxyPlan> {
    servers
        .iter()
        .filter_map(|server| {
            let Transport::Container(container) = &server.transport else {
                return None;
            };
            let domains = match &container.network {
                Some(NetworkPolicy::Allowed(entries)) => gh_aw_schema::network::expand_allowlist(entries),
                Some(NetworkPolicy::Defaults) => {
                    gh_aw_schema::network::expand_allowlist(&["defaults".to_string()])
                }
                _ => return None,
            };
            Some(ProxyPlan {
                server_id: server.id.clone(),
                allowed_domains: domains,
                service_name: format!("{}-egress-proxy", server.id),
            })
        })
        .collect()
}

/// Attach the proxy's service definition and the MCP job's `HTTP_PROXY`/
/// `HTTPS_PROXY` env vars + iptables bootstrap step to `job`.
pub fn apply_proxy_to_job(job: Job, plan: &ProxyPlan) -> Job {
    let domain_csv = plan.allowed_domains.join(",");
    let mut job = job
        .env_entry("HTTP_PROXY", format!("http://{}:3128", plan.service_name))
        .env_entry("HTTPS_PROXY", format!("http://{}:3128", plan.service_name));
    job.services.push((
        plan.service_name.clone(),
        Value::Mapping({
            let mut m = serde_yaml::Mapping::new();
            m.insert("image".into(), "ghcr.io/gh-aw/egress-proxy:latest".into());
            let mut env = serde_yaml::Mapping::new();
            env.insert("ALLOWED_DOMAINS".into(), domain_csv.into());
            m.insert("env".into(), Value::Mapping(env));
            m
        }),
    ));
    job.steps.insert(
        0,
        crate::lock::Step::run(
            "Enforce egress through proxy",
            format!(
                "iptables -A OUTPUT -p tcp -d {} -j ACCEPT\niptables -A OUTPUT -p tcp ! -d 127.0.0.1 -j DROP\n",
                plan.service_name
            ),
        ),
    );
    job
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::resolve_tools;
    use gh_aw_schema::{ContainerTransport, FrontmatterTree, McpServerDecl, ToolDecl};

    #[test]
    fn container_with_allowed_domains_gets_a_proxy_plan() {
        let mut tree = FrontmatterTree::default();
        tree.mcp_servers.insert(
            "custom".to_string(),
            ToolDecl::Mcp(McpServerDecl {
                id: "custom".to_string(),
                transport: Transport::Container(ContainerTransport {
                    container: "ghcr.io/example/tool".to_string(),
                    network: Some(NetworkPolicy::Allowed(vec!["api.example.com".to_string()])),
                    ..Default::default()
                }),
                allowed: Default::default(),
            }),
        );
        let toolset = resolve_tools(&tree).unwrap();
        let plans = plan_proxies(&toolset.mcp_servers);
        assert_eq!(plans.len(), 1);
        assert!(plans[0].allowed_domains.contains(&"api.example.com".to_string()));
    }

    #[test]
    fn allowed_list_expands_ecosystem_ids_alongside_literal_domains() {
        let mut tree = FrontmatterTree::default();
        tree.mcp_servers.insert(
            "custom".to_string(),
            ToolDecl::Mcp(McpServerDecl {
                id: "custom".to_string(),
                transport: Transport::Container(ContainerTransport {
                    container: "ghcr.io/example/tool".to_string(),
                    network: Some(NetworkPolicy::Allowed(vec![
                        "defaults".to_string(),
                        "python".to_string(),
                        "api.example.com".to_string(),
                    ])),
                    ..Default::default()
                }),
                allowed: Default::default(),
            }),
        );
        let toolset = resolve_tools(&tree).unwrap();
        let plans = plan_proxies(&toolset.mcp_servers);
        let domains = &plans[0].allowed_domains;
        assert!(domains.contains(&"github.com".to_string()));
        assert!(domains.contains(&"pypi.org".to_string()));
        assert!(domains.contains(&"api.example.com".to_string()));
        assert!(!domains.contains(&"unlisted.net".to_string()));
    }

    #[test]
    fn deny_all_container_gets_no_proxy() {
        let mut tree = FrontmatterTree::default();
        tree.mcp_servers.insert(
            "custom".to_string(),
            ToolDecl::Mcp(McpServerDecl {
                id: "custom".to_string(),
                transport: Transport::Container(ContainerTransport {
                    container: "ghcr.io/example/tool".to_string(),
                    network: Some(NetworkPolicy::DenyAll),
                    ..Default::default()
                }),
                allowed: Default::default(),
            }),
        );
        let toolset = resolve_tools(&tree).unwrap();
        assert!(plan_proxies(&toolset.mcp_servers).is_empty());
    }
}
