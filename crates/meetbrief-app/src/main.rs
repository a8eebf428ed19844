//! Meetbrief server binary.

mod cli;

use clap::Parser;

use meetbrief_api::auth::load_or_generate_secret;
use meetbrief_api::AppState;
use meetbrief_calendar::GoogleClient;
use meetbrief_core::config::MeetbriefConfig;
use meetbrief_storage::Database;

use cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = MeetbriefConfig::load_or_default(&config_file);
    config.apply_env_overrides();
    config.server.port = args.resolve_port(config.server.port);

    // Tracing.
    let filter = args.resolve_log_filter(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&filter)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting Meetbrief v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        path = %config_file.display(),
        app_env = %config.general.app_env,
        "Configuration loaded"
    );

    // Storage.
    let data_dir = args.resolve_data_dir(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }

    let db_path = data_dir.join("meetbrief.db");
    let database = Database::new(&db_path)?;
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    // Auth.
    let jwt_secret = if config.auth.jwt_secret.is_empty() {
        load_or_generate_secret(&cli::jwt_secret_path(&data_dir))
    } else {
        config.auth.jwt_secret.clone()
    };

    // Google.
    let google = GoogleClient::new(config.google.clone());
    if google.is_configured() {
        tracing::info!("Google sign-in and Calendar sync enabled");
    } else {
        tracing::warn!("Google client credentials not set; Google sign-in and sync disabled");
    }

    let state = AppState::new(config.clone(), database, google, &jwt_secret);

    if let Err(e) = meetbrief_api::start_server(&config, state).await {
        tracing::error!(error = %e, "API server stopped");
        tracing::error!("Try: MEETBRIEF_PORT={} meetbrief", config.server.port.saturating_add(1));
        return Err(e.into());
    }

    Ok(())
}
