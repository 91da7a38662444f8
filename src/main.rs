mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Cli, Commands};

use hb_core::config::Config;
use hb_core::ContentKey;
use hb_resolve::{AddonClient, Enricher, FallbackCatalog, Resolver};
use hb_store::Stores;

fn load_config(cli: &Cli) -> Config {
    let mut config = Config::load_or_default(cli.config.as_deref());
    if let Some(dir) = &cli.data_dir {
        config.server.data_dir = dir.clone();
    }
    config
}

async fn start_server(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting hubbio");
    hb_server::start(config).await.context("server failed")
}

async fn resolve_once(config: Config, kind: String, id: String) -> Result<()> {
    let stores = Stores::open(&config.server.data_dir, &config);
    let resolver = Resolver::new(
        &stores,
        Arc::new(AddonClient::new(config.resolver.provider_timeout())),
        Enricher::new(stores.settings.clone(), config.metadata.clone()),
        FallbackCatalog::default(),
    );

    let resolution = resolver.resolve(&ContentKey::new(kind, id), None).await;
    let output = serde_json::to_string_pretty(&resolution).context("failed to encode result")?;
    println!("{output}");
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            let contents = std::fs::read_to_string(p)
                .with_context(|| format!("failed to read {}", p.display()))?;
            Config::from_json(&contents)?
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    let warnings = config.validate();
    if !warnings.is_empty() {
        for warning in &warnings {
            println!("  ! {warning}");
        }
        bail!("{} configuration problem(s) found", warnings.len());
    }

    println!("Configuration is valid");
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Data dir: {}", config.server.data_dir.display());
    println!("  Provider timeout: {}s", config.resolver.provider_timeout_secs);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "hubbio=debug,hb_core=debug,hb_store=debug,hb_resolve=debug,hb_server=debug,tower_http=debug".to_string()
        } else {
            "hubbio=info,hb_core=info,hb_store=info,hb_resolve=info,hb_server=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { ref host, port } => {
            let config = load_config(&cli);
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(config, host.clone(), port))
        }
        Commands::Resolve { ref kind, ref id } => {
            let config = load_config(&cli);
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(resolve_once(config, kind.clone(), id.clone()))
        }
        Commands::Validate => validate_config(cli.config.as_deref()),
        Commands::Version => {
            println!("hubbio {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
