//! Engine adapters: one trait, one implementation per supported coding
//! agent. Adding an engine means implementing the trait, not branching on
//! an engine id throughout the compiler.

mod claude;
mod codex;
mod copilot;
mod custom;

pub use claude::ClaudeEngine;
pub use codex::CodexEngine;
pub use copilot::CopilotEngine;
pub use custom::CustomEngine;

use crate::lock::Step;
use crate::tools::ResolvedToolset;
use gh_aw_schema::EngineSpec;

pub trait Engine {
    fn id(&self) -> &'static str;
    fn display_name(&self) -> &'static str;
    fn is_experimental(&self) -> bool;

    fn supports_tools_allowlist(&self) -> bool;
    fn supports_http_transport(&self) -> bool;
    fn supports_max_turns(&self) -> bool;

    fn installation_steps(&self, spec: &EngineSpec) -> Vec<Step>;
    fn execution_steps(&self, spec: &EngineSpec, toolset: &ResolvedToolset, log_path: &str) -> Vec<Step>;

    fn log_parser_script_id(&self) -> &'static str {
        "log-parser"
    }
}

pub fn engine_for(id: gh_aw_schema::EngineId) -> Box<dyn Engine> {
    match id {
        gh_aw_schema::EngineId::Claude => Box::new(ClaudeEngine),
        gh_aw_schema::EngineId::Codex => Box::new(CodexEngine),
        gh_aw_schema::EngineId::Copilot => Box::new(CopilotEngine),
        gh_aw_schema::EngineId::Custom => Box::new(CustomEngine),
    }
}
