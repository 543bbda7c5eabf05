use tokio::io::AsyncBufReadExt;
use tracing::{error, info};
use warden_server::config::ServerConfig;
use warden_server::Server;

#[tokio::main]
async fn main() {
    let config = match ServerConfig::load("warden.toml") {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load warden.toml: {e}");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        "{} v{} starting (data directory: {})",
        config.server.name,
        env!("CARGO_PKG_VERSION"),
        config.permissions.data_directory
    );
    info!("Whitelist: {}", if config.permissions.whitelist_enabled { "on" } else { "off" });

    let server = match Server::open(&config) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to start: {e}");
            std::process::exit(1);
        }
    };
    info!(
        "Loaded {} white-listed players and {} banned addresses",
        server.directory().whitelisted_players().len(),
        server.directory().ip_bans().len()
    );

    // Console REPL: read lines from stdin
    let (console_tx, mut console_rx) = tokio::sync::mpsc::channel::<String>(32);
    if config.console.enabled {
        tokio::spawn(async move {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut lines = stdin.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let line = line.trim().to_string();
                if !line.is_empty() && console_tx.send(line).await.is_err() {
                    break;
                }
            }
        });
    } else {
        drop(console_tx);
    }

    loop {
        tokio::select! {
            line = console_rx.recv() => {
                match line {
                    Some(line) => {
                        server.handle_console_line(&line);
                    }
                    None if config.console.enabled => {
                        info!("Console closed");
                        break;
                    }
                    // without a console, wait for Ctrl+C
                    None => {
                        tokio::signal::ctrl_c().await.ok();
                        info!("Shutdown signal received");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!("Server shut down.");
}
