// src/main.rs
// aula-mcp - Aula school-platform client exposed as MCP tools

use anyhow::Result;
use aula::config::AulaConfig;
use aula::data::{DataManager, format_event_line, group_events_by_day};
use aula::mcp::AulaServer;
use aula::session::SessionManager;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "aula-mcp")]
#[command(about = "Aula school-platform client exposed as MCP tools")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run as MCP server on stdio (default)
    Serve,

    /// Log in with the configured credentials and print an overview
    Check,
}

fn build_manager() -> Result<Arc<DataManager>> {
    let config = AulaConfig::load()?;
    let session = Arc::new(SessionManager::new(&config));
    Ok(Arc::new(DataManager::new(session, config)))
}

async fn run_mcp_server() -> Result<()> {
    let data = build_manager()?;
    let server = AulaServer::new(data);

    // Run with stdio transport
    let transport = rmcp::transport::io::stdio();
    let service = rmcp::serve_server(server, transport).await?;
    service.waiting().await?;

    Ok(())
}

async fn run_check() -> Result<()> {
    let data = build_manager()?;

    let children = data.get_children().await?;
    println!("{} children:", children.len());
    for child in &children {
        let institution = child.institution_name.as_deref().unwrap_or("-");
        println!("  {} ({}) at {}", child.name, child.id, institution);
    }

    let unread = data.get_unread_messages().await?;
    println!("{} unread messages", unread.count);

    for child in &children {
        let batch = data
            .get_calendar_events(&child.id, aula::data::DEFAULT_CALENDAR_DAYS)
            .await?;
        println!("\nAgenda for {}:", child.name);
        for (day, events) in group_events_by_day(&batch.events) {
            println!("  {}", day);
            for event in &events {
                println!("    {}", format_event_line(event));
            }
        }
        if !batch.warnings.is_empty() {
            println!("  ({} records skipped)", batch.warnings.len());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env files (global first, then project - project overrides)
    if let Some(home) = dirs::home_dir() {
        let _ = dotenvy::from_path(home.join(".aula-mcp/.env"));
    }
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Quiet on stdio transport; the protocol owns stdout
    let log_level = match &cli.command {
        Some(Commands::Serve) | None => Level::WARN,
        Some(Commands::Check) => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        None | Some(Commands::Serve) => run_mcp_server().await?,
        Some(Commands::Check) => run_check().await?,
    }

    Ok(())
}
