use std::path::PathBuf;

use anyhow::Context;
use autoapi::ServiceConfig;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Demo user service built on autoapi")]
struct Cli {
    /// Service configuration file.
    #[arg(short, long, env = "USER_SERVICE_CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Print the generated OpenAPI document and exit.
    #[arg(long)]
    print_openapi: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("info,{}=debug,autoapi=debug", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = if cli.config.exists() {
        ServiceConfig::load(&cli.config)
            .with_context(|| format!("loading {}", cli.config.display()))?
    } else {
        info!(path = %cli.config.display(), "config file not found, using defaults");
        ServiceConfig::default()
    };

    let (app, openapi) = user_service::build_app(&config)?;
    if cli.print_openapi {
        let doc = openapi.context("swagger generation is disabled in the config")?;
        println!("{}", doc.to_pretty_json()?);
        return Ok(());
    }

    let address = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into())
        + ":"
        + &std::env::var("PORT").unwrap_or_else(|_| "3000".into());
    info!("🚀 Server running at http://{address}");
    if config.swagger.enabled {
        info!("📚 Swagger UI available at http://{address}{}", config.swagger.ui_path);
    }
    let listener = tokio::net::TcpListener::bind(&address).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
