use anyhow::Context;
use classguard_core::ConfigLoader;
use classguard_proxy::{shutdown_on, ProxyServer, ProxyServerConfig};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::filter::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "classguard")]
#[command(about = "Classroom filter dashboard backend gated by teacher IP addresses")]
struct Args {
    /// Address to listen on (overrides the settings file)
    #[arg(long, short = 'l', env = "CLASSGUARD_LISTEN")]
    listen: Option<SocketAddr>,

    /// Settings file path (TOML)
    #[arg(long, short = 'c', env = "CLASSGUARD_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let env_filter = match std::env::var("CLASSGUARD_LOG") {
        Ok(directives) => EnvFilter::new(directives),
        Err(_) => EnvFilter::from_default_env(),
    };
    let level = if args.verbose {
        tracing_subscriber::filter::LevelFilter::DEBUG
    } else {
        tracing_subscriber::filter::LevelFilter::INFO
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter.add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config = ConfigLoader::load(args.config).context("Failed to load configuration")?;

    let listen = match args.listen {
        Some(addr) => addr,
        None => config
            .server
            .listen
            .parse::<SocketAddr>()
            .with_context(|| format!("Invalid listen address: {}", config.server.listen))?,
    };

    tracing::info!("Running in {} mode", config.environment);
    if !config.environment.is_production() && config.access.is_configured() {
        tracing::warn!(
            "Requests without X-Forwarded-For are treated as the first TEACHER_IPS entry; \
             set APP_ENV=production before deployment"
        );
    }
    if let Err(e) = config.access.check() {
        tracing::error!("{}; every gated request will be answered with 500", e);
    } else {
        tracing::info!("{} teacher address(es) configured", config.access.len());
    }
    if !config.credentials.is_complete() {
        tracing::warn!(
            "Upstream control API not fully configured, missing {:?}",
            config.credentials.missing()
        );
    }

    let server_config = ProxyServerConfig::from_config(&config)?;
    if server_config.gate.trusts_any_forwarder() {
        tracing::warn!(
            "X-Forwarded-For is trusted from every peer; only run behind a reverse proxy \
             that overwrites it, or set gate.trusted_proxies"
        );
    }

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind {}", listen))?;

    let server = ProxyServer::new(server_config);
    server
        .serve(listener, shutdown_on(tokio::signal::ctrl_c()))
        .await?;

    Ok(())
}
