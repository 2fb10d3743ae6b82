//! `gh-aw`: compiles Markdown-with-YAML-frontmatter agentic workflows into
//! GitHub Actions lock files, and reprocesses saved agent run logs.

mod cli;
mod config;
mod remote;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, McpAction};
use gh_aw_frontmatter::parse_workflow;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Compile { file, out } => compile_command(file, out.as_deref(), cli.config.as_deref()),
        Commands::Run { file } => run_command(file, cli.config.as_deref()),
        Commands::Add { id } => {
            println!("would fetch import {id} into imports/ (not yet fetched — pass --config to override the workspace layer)");
            Ok(())
        }
        Commands::Update { id } => {
            println!("would re-fetch import {id} at its pinned or latest ref");
            Ok(())
        }
        Commands::Logs { run, engine } => logs_command(run, engine),
        Commands::Mcp { action: McpAction::Inspect { file } } => mcp_inspect_command(file),
        Commands::Audit { dir, engine } => audit_command(dir, engine),
        Commands::Sanitize { allowed_domains } => sanitize_command(allowed_domains),
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn compile_workflow(file: &Path, config_path: Option<&Path>) -> Result<(gh_aw_compiler::CompileOutput, config::GhAwConfig)> {
    let root_dir = file.parent().unwrap_or_else(|| Path::new("."));
    let root_name = file.file_name().and_then(|n| n.to_str()).with_context(|| format!("invalid workflow path {}", file.display()))?;

    let fetcher = remote::GitHubRemoteFetcher::new()?;
    let parsed = parse_workflow(root_dir, root_name, &fetcher).with_context(|| format!("parsing {}", file.display()))?;

    let workspace_root = std::env::current_dir().context("resolving workspace root")?;
    let workflow_config = config::load(&workspace_root, config_path).context("loading gh-aw configuration")?;

    let output = gh_aw_compiler::compile(parsed, &file.display().to_string()).with_context(|| format!("compiling {}", file.display()))?;
    Ok((output, workflow_config))
}

fn compile_command(file: &Path, out: Option<&Path>, config_path: Option<&Path>) -> Result<()> {
    let (output, _config) = compile_workflow(file, config_path)?;

    for diagnostic in &output.diagnostics {
        tracing::warn!(code = %diagnostic.code, message = %diagnostic.message, "compiler diagnostic");
    }

    let out_path = out.map(PathBuf::from).unwrap_or_else(|| file.with_extension("lock.yml"));
    std::fs::write(&out_path, &output.rendered).with_context(|| format!("writing lock file to {}", out_path.display()))?;
    println!("compiled {} -> {}", file.display(), out_path.display());
    Ok(())
}

fn run_command(file: &Path, config_path: Option<&Path>) -> Result<()> {
    let (output, _config) = compile_workflow(file, config_path)?;
    print!("{}", output.rendered);
    Ok(())
}

fn logs_command(run: &Path, engine: &str) -> Result<()> {
    let log_text = std::fs::read_to_string(run).with_context(|| format!("reading log {}", run.display()))?;
    let summary = gh_aw_audit::summarize_run(engine, &log_text);
    println!("{}", summary.to_step_summary_markdown());
    if summary.any_mcp_server_failed() {
        anyhow::bail!("one or more MCP servers failed to launch in {}", run.display());
    }
    Ok(())
}

fn audit_command(dir: &Path, engine: &str) -> Result<()> {
    let report = gh_aw_audit::audit_directory(dir, engine).with_context(|| format!("auditing {}", dir.display()))?;
    println!("scanned {} run(s), {} total tool call(s)", report.runs.len(), report.total_tool_calls());
    let failed = report.runs_with_failed_mcp_servers();
    if !failed.is_empty() {
        println!("runs with a failed MCP server: {}", failed.join(", "));
    }
    Ok(())
}

/// Reads raw agent-produced text from stdin and writes the sanitized
/// surface text to stdout, running the full control-char/mention/
/// bot-command/XML/URL/truncation pipeline a safe-output job shells out to
/// before handing text to the GitHub API.
fn sanitize_command(allowed_domains: &[String]) -> Result<()> {
    use std::io::{Read, Write};

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input).context("reading stdin")?;

    let mut domains: Vec<String> = gh_aw_schema::EcosystemId::Github.domains().iter().map(|d| (*d).to_string()).collect();
    for domain in allowed_domains {
        if !domains.contains(domain) {
            domains.push(domain.clone());
        }
    }

    let sanitized = gh_aw_commons::sanitize_for_surface(&input, &domains);
    std::io::stdout().write_all(sanitized.as_bytes()).context("writing sanitized output")?;
    Ok(())
}

fn mcp_inspect_command(file: &Path) -> Result<()> {
    let root_dir = file.parent().unwrap_or_else(|| Path::new("."));
    let root_name = file.file_name().and_then(|n| n.to_str()).with_context(|| format!("invalid workflow path {}", file.display()))?;

    let fetcher = remote::GitHubRemoteFetcher::new()?;
    let parsed = parse_workflow(root_dir, root_name, &fetcher).with_context(|| format!("parsing {}", file.display()))?;
    let toolset = gh_aw_compiler::tools::resolve_tools(&parsed.frontmatter)?;

    println!("MCP servers:");
    for server in &toolset.mcp_servers {
        println!("  - {}", server.id);
    }
    println!("native tool flags:");
    for flag in &toolset.native_flags {
        println!("  - {flag:?}");
    }
    Ok(())
}
