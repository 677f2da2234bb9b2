//! larder-web - household inventory web server
//!
//! Serves the login-protected pages over the pantry files in the root folder
//! and keeps accounts in `larder.db` beside them.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use larder_common::config::{CliOverrides, ConfigFile, LarderConfig, DEFAULT_LOG_LEVEL};
use larder_common::db::{init::DATABASE_FILE, init_database, SqliteUserStore, UserStore};
use larder_common::Pantry;
use larder_web::services::{
    AddDelegate, ExternalAddCommand, GeminiAdvisor, InProcessAdd, RecipeAdvisor,
    UnconfiguredAdvisor,
};
use larder_web::{build_router, AppState};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "larder-web")]
#[command(about = "Household inventory web server")]
#[command(version)]
struct Args {
    /// TOML config file (default: <config dir>/larder/config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Folder holding ingredients.txt, singredients.txt and larder.db
    #[arg(short, long, value_name = "DIR")]
    root_folder: Option<PathBuf>,

    /// Address to bind
    #[arg(short, long)]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// External executable that performs adds (`<exe> add <name> <qty> <unit> <days>`)
    #[arg(long, value_name = "FILE")]
    add_executable: Option<PathBuf>,
}

impl Args {
    fn overrides(self) -> CliOverrides {
        CliOverrides {
            config_file: self.config,
            root_folder: self.root_folder,
            bind_address: self.bind,
            port: self.port,
            add_executable: self.add_executable,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let overrides = Args::parse().overrides();

    // The config file decides the default log level
    let config_file = ConfigFile::read(overrides.config_file.as_deref());
    let log_level = config_file
        .as_ref()
        .map(ConfigFile::log_level)
        .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .init();

    info!(
        "Starting larder-web v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config_file = config_file.context("Failed to load configuration")?;
    config_file.report();
    let config = LarderConfig::from_sources(&overrides, &config_file.toml)
        .context("Failed to load configuration")?;

    std::fs::create_dir_all(&config.root_folder).with_context(|| {
        format!(
            "Failed to create root folder {}",
            config.root_folder.display()
        )
    })?;
    info!("Root folder: {}", config.root_folder.display());

    let pantry = Arc::new(Pantry::open(&config.root_folder));
    info!("Inventory file: {}", pantry.inventory_path().display());
    info!("Standard items file: {}", pantry.standard_path().display());

    let db_path = config.root_folder.join(DATABASE_FILE);
    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    let users: Arc<dyn UserStore> = Arc::new(SqliteUserStore::new(pool));

    let advisor: Arc<dyn RecipeAdvisor> = match &config.gemini_api_key {
        Some(key) => {
            info!("Recipe advisor: Gemini model {}", config.gemini_model);
            Arc::new(GeminiAdvisor::new(
                key.clone(),
                config.gemini_model.clone(),
                config.recipe_timeout,
            )?)
        }
        None => {
            warn!("GEMINI_API_KEY not set; recipe suggestions are disabled");
            Arc::new(UnconfiguredAdvisor)
        }
    };

    let add_delegate: Arc<dyn AddDelegate> = match &config.add_executable {
        Some(exe) => {
            info!("Adds delegated to {}", exe.display());
            Arc::new(
                ExternalAddCommand::new(exe.clone()).with_root_folder(&config.root_folder),
            )
        }
        None => Arc::new(InProcessAdd::new(Arc::clone(&pantry))),
    };

    let state = AppState::new(pantry, users, advisor, add_delegate);
    let app = build_router(state);

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("larder-web listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_map_to_overrides() {
        let args = Args::try_parse_from([
            "larder-web",
            "--root-folder",
            "/srv/larder",
            "--port",
            "8080",
            "--add-executable",
            "/usr/local/bin/larder",
        ])
        .unwrap();
        let cli = args.overrides();
        assert_eq!(cli.root_folder, Some(PathBuf::from("/srv/larder")));
        assert_eq!(cli.port, Some(8080));
        assert_eq!(cli.bind_address, None);
        assert_eq!(
            cli.add_executable,
            Some(PathBuf::from("/usr/local/bin/larder"))
        );
    }
}
