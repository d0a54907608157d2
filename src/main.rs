use actix_web::{web, App, HttpServer};
use clap::Parser;
use sqlchat::api::SessionRegistry;
use sqlchat::cli::{commands::{Cli, Commands}, run_cli};
use sqlchat::config::AppConfig;
use sqlchat::llm::ProviderFactory;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,sqlchat=info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if !matches!(cli.command, Commands::Serve) {
        if let Err(e) = run_cli(cli.command, cli.config).await {
            error!("{}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    info!("Starting SQL chat server...");

    let config = match AppConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let llm_provider = match ProviderFactory::create_default(&config) {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to initialize LLM provider: {}", e);
            std::process::exit(1);
        }
    };

    let host = config.server.host.clone();
    let port = config.server.port;
    let registry = web::Data::new(SessionRegistry::new(config, llm_provider));

    info!("Server listening on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(registry.clone())
            .configure(sqlchat::api::routes::configure)
    })
    .bind((host, port))?
    .run()
    .await
}
