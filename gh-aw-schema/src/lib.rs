//! The frontmatter data model: a tagged-variant representation of
//! `ToolDecl`/`Transport`/`NetworkPolicy`/`EngineSpec`/`SafeOutputsSpec`/
//! `TriggerSet`, normalized once at parse time rather than carried around as
//! a generic YAML value tree.
//!
//! Each section is its own struct or enum deriving `Deserialize`/`Serialize`
//! with explicit defaults, optionally deriving `schemars::JsonSchema` behind
//! a `schema` feature.

pub mod diagnostics;
pub mod engine;
pub mod frontmatter;
pub mod network;
pub mod safe_outputs;
pub mod tools;
pub mod triggers;

pub use diagnostics::{CompilerDiagnostic, Severity};
pub use engine::{EngineId, EngineSpec};
pub use frontmatter::FrontmatterTree;
pub use network::{EcosystemId, NetworkPolicy};
pub use safe_outputs::{SafeOutputJobConfig, SafeOutputLine, SafeOutputType, SafeOutputsSpec};
pub use tools::{AllowList, BuiltinTool, ContainerTransport, HttpTransport, McpServerDecl, StdioTransport, ToolDecl, Transport};
pub use triggers::{CommandTrigger, ReactionConfig, RolesConfig, RolesGate, TriggerEvent, TriggerSet};
