//! Entry point: reads newline-framed JSON-RPC requests from stdin, answers
//! them on stdout, logs to stderr. Single-threaded, line-buffered — no
//! concurrent request handling, matching the cooperative event-loop model
//! the agent's MCP gateway expects.

use gh_aw_mcp_proto::JsonRpcRequest;
use gh_aw_safe_outputs_server::{SafeOutputsServer, ServerConfig};
use std::io::{self, BufRead, Write};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let config = ServerConfig::from_env()?;
    let server = SafeOutputsServer::new(config);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let request: JsonRpcRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(error) => {
                tracing::warn!(%error, "skipping malformed JSON-RPC line");
                continue;
            }
        };
        if let Some(response) = server.handle(&request) {
            let serialized = serde_json::to_string(&response)?;
            writeln!(stdout, "{serialized}")?;
            stdout.flush()?;
        }
    }

    Ok(())
}
