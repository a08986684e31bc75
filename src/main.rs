mod cli;

use hlsforged::{
    config, pipeline,
    reaper::{start_reaper_task, Reaper},
    server::{self, AppContext},
    state::JobRegistry,
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::sync::Arc;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config::validate_config(&config)?;

    tracing::info!("Starting hlsforged");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    for dir in [&config.storage.download_dir, &config.storage.converted_dir] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {:?}", dir))?;
    }

    // Merge files from a previous run have no job record anymore
    match pipeline::purge_stale_containers(&config.storage.download_dir) {
        Ok(count) if count > 0 => {
            tracing::info!("Removed {} stale merge file(s) from previous session", count);
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!("Failed to purge stale merge files: {}", e);
        }
    }

    let registry = JobRegistry::new();
    let jobs = Arc::new(pipeline::JobManager::from_config(&config, registry.clone())?);

    let reaper = Reaper::new(
        registry,
        config.storage.converted_dir.clone(),
        config.jobs.expiration(),
    );
    let reaper_handle = start_reaper_task(reaper, config.jobs.reap_interval());

    let grace = config.jobs.shutdown_grace();
    let ctx = AppContext::new(jobs.clone(), Arc::new(config));
    let server_result = server::start_server(ctx).await;

    // Cleanup
    tracing::info!("Shutting down...");
    reaper_handle.abort();
    jobs.shutdown(grace).await;

    server_result
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "hlsforged=trace,hlsforged_av=trace,tower_http=debug".to_string()
        } else {
            "hlsforged=debug,hlsforged_av=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("hlsforged {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn check_tools() -> Result<()> {
    println!("Checking external tools...\n");

    let tools = hlsforged_av::check_tools();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Jobs cannot be remuxed until ffmpeg and ffprobe are installed.");
    }

    Ok(())
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            print_summary(&config);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            print_summary(&config);
        }
    }

    Ok(())
}

fn print_summary(config: &config::Config) {
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Download dir: {:?}", config.storage.download_dir);
    println!("  Converted dir: {:?}", config.storage.converted_dir);
    println!(
        "  Expiration: {}s (swept every {}s)",
        config.jobs.expiration_secs, config.jobs.reap_interval_secs
    );
    println!("  Max concurrent jobs: {}", config.jobs.max_concurrent);
    println!("  Remux timeout: {}s", config.remux.timeout_secs);
}
