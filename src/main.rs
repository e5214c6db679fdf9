use anyhow::Result;
use clap::Parser;
use referat::cli::{commands, Cli, Commands};
use referat::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("referat={}", level))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load_from(cli.config.as_ref())?;

    std::fs::create_dir_all(settings.data_dir())?;
    std::fs::create_dir_all(settings.storage_dir())?;

    match cli.command {
        Commands::Serve { host, port } => commands::serve(settings, &host, port).await,
        Commands::Process { meeting_id } => commands::process(settings, meeting_id).await,
    }
}
