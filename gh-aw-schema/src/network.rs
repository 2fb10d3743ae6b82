//! `NetworkPolicy` and ecosystem-id domain expansion.

use serde::{Deserialize, Serialize};

/// A `network:` declaration, either on the workflow or on a containerized
/// MCP server. Three shapes:
/// - `"defaults"` (bare string) → [`NetworkPolicy::Defaults`]
/// - `{}` (empty map, or `allowed` omitted) → [`NetworkPolicy::DenyAll`]
/// - `{allowed: [...]}` → [`NetworkPolicy::Allowed`], entries are domains or
///   ecosystem ids, expanded at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "NetworkPolicyWire", into = "NetworkPolicyWire")]
pub enum NetworkPolicy {
    Defaults,
    DenyAll,
    Allowed(Vec<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum NetworkPolicyWire {
    Keyword(String),
    Object {
        #[serde(default)]
        allowed: Option<Vec<String>>,
    },
}

impl From<NetworkPolicyWire> for NetworkPolicy {
    fn from(wire: NetworkPolicyWire) -> Self {
        match wire {
            NetworkPolicyWire::Keyword(keyword) if keyword == "defaults" => NetworkPolicy::Defaults,
            NetworkPolicyWire::Keyword(_) => NetworkPolicy::DenyAll,
            NetworkPolicyWire::Object { allowed: None } => NetworkPolicy::DenyAll,
            NetworkPolicyWire::Object { allowed: Some(entries) } => NetworkPolicy::Allowed(entries),
        }
    }
}

impl From<NetworkPolicy> for NetworkPolicyWire {
    fn from(policy: NetworkPolicy) -> Self {
        match policy {
            NetworkPolicy::Defaults => NetworkPolicyWire::Keyword("defaults".to_string()),
            NetworkPolicy::DenyAll => NetworkPolicyWire::Object { allowed: None },
            NetworkPolicy::Allowed(entries) => NetworkPolicyWire::Object { allowed: Some(entries) },
        }
    }
}

impl Default for NetworkPolicy {
    fn default() -> Self {
        NetworkPolicy::DenyAll
    }
}

impl NetworkPolicy {
    /// Union entries from `other` into `self`. Lists union; ecosystem ids
    /// are expanded at resolution time, not here.
    pub fn union(self, other: NetworkPolicy) -> NetworkPolicy {
        match (self, other) {
            (NetworkPolicy::Defaults, _) | (_, NetworkPolicy::Defaults) => NetworkPolicy::Defaults,
            (NetworkPolicy::DenyAll, rhs) => rhs,
            (lhs, NetworkPolicy::DenyAll) => lhs,
            (NetworkPolicy::Allowed(mut a), NetworkPolicy::Allowed(b)) => {
                for entry in b {
                    if !a.contains(&entry) {
                        a.push(entry);
                    }
                }
                NetworkPolicy::Allowed(a)
            }
        }
    }

    pub fn has_wildcard(&self) -> bool {
        matches!(self, NetworkPolicy::Allowed(entries) if entries.iter().any(|e| e.contains('*')))
    }
}

/// A curated, named domain set usable in `network.allowed` in place of
/// individual domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcosystemId {
    Defaults,
    Github,
    Containers,
    LinuxDistros,
    Node,
    Python,
    Go,
    Rust,
    Java,
    Dotnet,
    Ruby,
    Php,
    Perl,
    Dart,
    Haskell,
    Swift,
    Terraform,
    Playwright,
}

impl EcosystemId {
    pub fn parse(id: &str) -> Option<Self> {
        Some(match id {
            "defaults" => EcosystemId::Defaults,
            "github" => EcosystemId::Github,
            "containers" => EcosystemId::Containers,
            "linux-distros" => EcosystemId::LinuxDistros,
            "node" => EcosystemId::Node,
            "python" => EcosystemId::Python,
            "go" => EcosystemId::Go,
            "rust" => EcosystemId::Rust,
            "java" => EcosystemId::Java,
            "dotnet" => EcosystemId::Dotnet,
            "ruby" => EcosystemId::Ruby,
            "php" => EcosystemId::Php,
            "perl" => EcosystemId::Perl,
            "dart" => EcosystemId::Dart,
            "haskell" => EcosystemId::Haskell,
            "swift" => EcosystemId::Swift,
            "terraform" => EcosystemId::Terraform,
            "playwright" => EcosystemId::Playwright,
            _ => return None,
        })
    }

    /// The curated domain list this ecosystem id expands to. Subdomain
    /// matching is implicit at allow-list evaluation time, so these lists
    /// name only the apex domains.
    pub fn domains(self) -> &'static [&'static str] {
        match self {
            EcosystemId::Defaults => &["github.com", "githubusercontent.com", "actions.githubusercontent.com"],
            EcosystemId::Github => &["github.com", "githubusercontent.com", "api.github.com", "ghcr.io"],
            EcosystemId::Containers => &["docker.io", "ghcr.io", "quay.io", "registry-1.docker.io"],
            EcosystemId::LinuxDistros => &["deb.debian.org", "archive.ubuntu.com", "security.ubuntu.com", "mirrors.fedoraproject.org"],
            EcosystemId::Node => &["registry.npmjs.org", "nodejs.org", "yarnpkg.com"],
            EcosystemId::Python => &["pypi.org", "files.pythonhosted.org", "python.org"],
            EcosystemId::Go => &["proxy.golang.org", "sum.golang.org", "go.dev"],
            EcosystemId::Rust => &["crates.io", "static.crates.io", "index.crates.io"],
            EcosystemId::Java => &["repo.maven.apache.org", "repo1.maven.org", "plugins.gradle.org"],
            EcosystemId::Dotnet => &["api.nuget.org", "dotnet.microsoft.com"],
            EcosystemId::Ruby => &["rubygems.org", "index.rubygems.org"],
            EcosystemId::Php => &["packagist.org", "repo.packagist.org"],
            EcosystemId::Perl => &["cpan.org", "www.cpan.org", "fastapi.metacpan.org"],
            EcosystemId::Dart => &["pub.dev", "storage.googleapis.com"],
            EcosystemId::Haskell => &["hackage.haskell.org"],
            EcosystemId::Swift => &["swift.org", "github.com"],
            EcosystemId::Terraform => &["registry.terraform.io", "releases.hashicorp.com"],
            EcosystemId::Playwright => &["playwright.azureedge.net", "playwright.download.prss.microsoft.com"],
        }
    }
}

/// Expand a `network.allowed` entry list into a concrete, deduplicated,
/// sorted domain set. Entries that are not a recognized ecosystem id are
/// kept as literal domains.
pub fn expand_allowlist(entries: &[String]) -> Vec<String> {
    let mut domains = Vec::new();
    for entry in entries {
        if entry.contains('*') {
            continue; // wildcard syntax rejected by the strict/tool resolver, not expanded here.
        }
        match EcosystemId::parse(entry) {
            Some(ecosystem) => {
                for domain in ecosystem.domains() {
                    if !domains.contains(&(*domain).to_string()) {
                        domains.push((*domain).to_string());
                    }
                }
            }
            None => {
                if !domains.contains(entry) {
                    domains.push(entry.clone());
                }
            }
        }
    }
    domains.sort();
    domains
}
