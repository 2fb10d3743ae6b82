//! Safe-outputs MCP server: a line-delimited JSON-RPC process the agent job
//! launches alongside the engine. Exposes one tool per enabled safe-output
//! type; every `tools/call` appends a validated entry to the shared JSONL
//! artifact, with special handling for asset staging and patch generation.

pub mod config;
pub mod server;
pub mod tools;

pub use config::ServerConfig;
pub use server::SafeOutputsServer;
