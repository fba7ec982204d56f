use clap::Parser;
use colored::*;
use eyre::{Context, Result, bail};
use log::info;
use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use toolreg::ToolHost;
use toolreg::remote::{Envelope, HttpTransport};
use toolreg::storage::JsonlToolStore;
use toolreg::tools::{CallOptions, ToolDefinition};

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;

fn setup_logging(level: Option<&str>) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("toolreg")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("toolreg.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        if let Some(level) = level {
            builder.parse_filters(level);
        }
    }
    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn open_host(config: &Config) -> Result<ToolHost> {
    let store = Arc::new(JsonlToolStore::new(&config.storage.tools_file));
    let transport = Arc::new(HttpTransport::new(&config.endpoint.server_url)?);
    let host = ToolHost::open(store, transport, config.dispatch_policy())
        .await
        .context("Failed to open tool registry")?;
    info!(
        "Opened registry with {} tools from {}",
        host.get_tools().len(),
        config.storage.tools_file.display()
    );
    Ok(host)
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
        println!("  endpoint: {}", config.endpoint.server_url);
        println!("  tools file: {}", config.storage.tools_file.display());
    }

    let host = open_host(config).await?;
    let result = match &cli.command {
        Commands::Install { file } => handle_install_command(&host, file).await,
        Commands::List => handle_list_command(&host),
        Commands::Show { tool } => handle_show_command(&host, tool),
        Commands::Remove { tool, persist } => handle_remove_command(&host, tool, *persist).await,
        Commands::Exec {
            tool,
            command,
            params,
            timeout_ms,
        } => handle_exec_command(&host, tool, command, params, *timeout_ms).await,
        Commands::Create { install } => handle_create_command(&host, *install).await,
        Commands::Export { tool } => handle_export_command(&host, tool),
    };
    host.close().await;
    result
}

fn report(envelope: Envelope) -> Result<Option<Value>> {
    if envelope.success {
        return Ok(envelope.data);
    }
    let kind = envelope.kind.map(|k| format!("[{:?}] ", k)).unwrap_or_default();
    bail!("{}{}", kind, envelope.error.unwrap_or_default())
}

fn read_definition(file: &Path) -> Result<String> {
    if file == Path::new("-") {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read definition from stdin")?;
        return Ok(content);
    }
    fs::read_to_string(file).context(format!("Failed to read {}", file.display()))
}

async fn handle_install_command(host: &ToolHost, file: &Path) -> Result<()> {
    info!("Installing tool from {}", file.display());
    let content = read_definition(file)?;
    let data = report(host.install_tool(&content).await)?;
    let name = data
        .as_ref()
        .and_then(|d| d.get("name"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    println!("{} {}", "Installed:".green(), name);
    Ok(())
}

fn handle_list_command(host: &ToolHost) -> Result<()> {
    let tools = host.get_tools();
    if tools.is_empty() {
        println!("{}", "No tools installed".yellow());
        return Ok(());
    }
    for tool in tools {
        println!(
            "{} {} - {} ({} commands)",
            tool.name.bold(),
            tool.version.dimmed(),
            tool.description,
            tool.commands.len()
        );
    }
    Ok(())
}

fn lookup(host: &ToolHost, name: &str) -> Result<ToolDefinition> {
    match host.get_tool(name) {
        Some(tool) => Ok(tool),
        None => bail!("tool not found: {}", name),
    }
}

fn handle_show_command(host: &ToolHost, name: &str) -> Result<()> {
    let tool = lookup(host, name)?;
    println!("{} {}", tool.name.bold(), tool.version.dimmed());
    println!("  {}", tool.description);
    for command in &tool.commands {
        let marker = if command.idempotent { " (idempotent)" } else { "" };
        println!("\n  {}{} - {}", command.name.cyan(), marker.dimmed(), command.description);
        for param in &command.parameters {
            let required = if param.required { "required".red() } else { "optional".normal() };
            println!(
                "    {}: {} [{}] {}",
                param.name,
                param.param_type,
                required,
                param.description.dimmed()
            );
        }
    }
    Ok(())
}

async fn handle_remove_command(host: &ToolHost, name: &str, persist: bool) -> Result<()> {
    info!("Removing tool: {} (persist: {})", name, persist);
    report(host.remove_tool(name, persist).await)?;
    if persist {
        println!("{} {}", "Removed:".red(), name);
    } else {
        println!("{} {} {}", "Removed:".red(), name, "(this session only)".dimmed());
    }
    Ok(())
}

async fn handle_exec_command(
    host: &ToolHost,
    tool: &str,
    command: &str,
    params: &str,
    timeout_ms: Option<u64>,
) -> Result<()> {
    info!("Executing {}.{}", tool, command);
    let parameters: Value = serde_json::from_str(params).context("Invalid --params JSON")?;

    let cancel = CancellationToken::new();
    let mut options = CallOptions::default().with_cancel(cancel.clone());
    if let Some(ms) = timeout_ms {
        options = options.with_timeout(Duration::from_millis(ms));
    }

    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });
    let envelope = host.execute_command_with(tool, command, parameters, options).await;
    watcher.abort();

    let data = report(envelope)?.unwrap_or(Value::Null);
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

async fn handle_create_command(host: &ToolHost, install: bool) -> Result<()> {
    let stdin = io::stdin();
    let Some(tool) = cli::wizard::run_wizard(stdin.lock(), io::stdout())? else {
        println!("{}", "Cancelled".yellow());
        return Ok(());
    };

    println!("{}", tool.to_json_pretty()?);
    if install {
        report(host.install_definition(tool.clone()).await)?;
        println!("{} {}", "Installed:".green(), tool.name);
    }
    Ok(())
}

fn handle_export_command(host: &ToolHost, name: &str) -> Result<()> {
    let tool = lookup(host, name)?;
    println!("{}", tool.to_json_pretty()?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(config.log_level.as_deref()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
