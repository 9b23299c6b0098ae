//! Someta: overlay chat host with a local HTTP API.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod injector;
mod routes;
mod state;

use state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("SOMETA_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

fn print_settings(data_dir: &std::path::Path) -> anyhow::Result<()> {
    let config = someta_core::SometaConfig::from_env(data_dir)?;
    let store = someta_settings::SettingsStore::open(&config.data_paths.settings_file);
    println!("Settings file: {}", store.path().display());
    println!(
        "{}",
        serde_json::to_string_pretty(&store.get().to_response())?
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    // Handle CLI subcommands
    if args.len() > 1 {
        match args[1].as_str() {
            "--settings" | "settings" => {
                let data_dir = if args.len() > 2 {
                    PathBuf::from(&args[2])
                } else {
                    resolve_data_dir()
                };
                return print_settings(&data_dir);
            }
            "--help" | "-h" | "help" => {
                println!("Someta: overlay chat host");
                println!();
                println!("Usage: someta [command]");
                println!();
                println!("Commands:");
                println!("  (none)                   Start the server");
                println!("  settings [data-dir]      Print stored settings (key masked)");
                println!("  help                     Show this help message");
                println!();
                println!("Environment:");
                println!("  PORT                       Local API port (default 3003)");
                println!("  SOMETA_BACKEND_URL         Chat endpoint");
                println!("  SOMETA_CDP_URL             DevTools endpoint for screenshots");
                println!("  SOMETA_RELAY_TIMEOUT_SECS  Relay reply timeout");
                println!("  SOMETA_INJECT_DELAY_MS     Wait after injecting a page");
                println!("  SOMETA_DATA_DIR            Data directory");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'someta help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    // Normal server startup
    let data_dir = resolve_data_dir();

    info!("Data directory: {}", data_dir.display());

    let config = someta_core::SometaConfig::from_env(&data_dir)?;
    let port = config.port;
    info!("Chat backend: {}", config.backend_url);

    // Build application state and start the host relay listener
    let state = Arc::new(AppState::new(config));

    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Someta server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
