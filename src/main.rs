use std::path::PathBuf;
use std::sync::Arc;

use siteline::{GraphClient, GraphConfig, RecordStore, Scheduler};

fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SITELINE_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".siteline")
        .join("data")
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let data_dir = data_dir();
    let store = match RecordStore::open(&data_dir) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            log::error!("Failed to open data directory {}: {}", data_dir.display(), e);
            std::process::exit(1);
        }
    };
    match store.seed_sample_data() {
        Ok(true) => log::info!("Seeded sample data into {}", data_dir.display()),
        Ok(false) => {}
        Err(e) => {
            log::error!("Failed to seed sample data: {}", e);
            std::process::exit(1);
        }
    }

    let config = GraphConfig::from_env();
    let graph = Arc::new(GraphClient::new(config));
    let status = graph.status();
    log::info!(
        "Microsoft 365 integration: outlook={}, onedrive={}, autoBackup={} (every {}h)",
        status.outlook_enabled,
        status.one_drive_enabled,
        status.auto_backup_enabled,
        status.backup_interval
    );
    if graph.config().has_credentials() {
        if let Err(e) = graph.test_connection().await {
            log::warn!("Microsoft 365 connection check failed: {}", e);
        }
    }

    log::info!("Scheduler running; data directory {}", data_dir.display());
    Scheduler::new(store, graph).run().await;
}
