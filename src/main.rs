//! Lantern server entry point.
//!
//! Loads configuration, boots the plugin kernel and runs startup hooks.
//! A plugin subcommand runs its handler; otherwise the installed plugin
//! listing is printed.

use std::sync::Arc;

use clap::Command;
use serde_json::json;
use tracing_subscriber::{EnvFilter, fmt};

use lantern_core::config::{AppConfig, Metadata};
use lantern_core::error::AppError;
use lantern_core::types::Response;
use lantern_plugin::consumers::routes::Route;
use lantern_plugin::{PluginContext, PluginManager};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Startup failed");
        std::process::exit(1);
    }
}

/// Load configuration from files and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("LANTERN_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Boot the kernel and report what is installed
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(
        name = %config.server.name,
        version = env!("CARGO_PKG_VERSION"),
        "Starting Lantern"
    );

    let metadata = match &config.plugins.metadata_path {
        Some(path) => {
            tracing::info!(path = %path, "Loading metadata");
            Metadata::load(path)?
        }
        None => Metadata::default(),
    };
    let databases: Vec<String> = metadata.databases.keys().cloned().collect();
    let host = Arc::new(PluginContext::new(metadata).with_databases(databases));

    let manager = Arc::new(PluginManager::bootstrap(host, config.plugins.clone())?);
    manager.invoke_startup().await?;

    let routes = manager.routes(builtin_routes(manager.clone())).await?;
    tracing::info!(routes = ?routes.patterns(), "Routes ready");

    let cli = manager.register_commands(root_command()).await?;
    let matches = cli.command().get_matches();
    if let Some(output) = cli.dispatch(&matches)? {
        println!("{output}");
        return Ok(());
    }

    let listing = serde_json::to_string_pretty(&manager.list_plugins())?;
    println!("{listing}");

    tracing::info!(
        plugins = manager.plugins().count(),
        permissions = manager.permissions().len(),
        "Lantern ready"
    );
    Ok(())
}

/// Root command line; plugins attach their subcommands to it
fn root_command() -> Command {
    Command::new("lantern")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Lantern data publishing server")
        .subcommand(Command::new("plugins").about("List installed plugins as JSON"))
}

/// Built-in introspection routes, tried after plugin routes
fn builtin_routes(manager: Arc<PluginManager>) -> Vec<Route> {
    let plugins = manager.clone();
    vec![
        Route::sync("/-/plugins.json", move |_, _| {
            let listing = serde_json::to_value(plugins.list_plugins())?;
            Ok(Response::json(&listing))
        }),
        Route::new("/-/actor.json", move |request, _| {
            let manager = manager.clone();
            async move {
                let actor = manager.actor_from_request(Arc::new(request)).await?;
                Ok(Response::json(&json!({ "actor": actor })))
            }
        }),
    ]
}
