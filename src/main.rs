use std::process::ExitCode;
use std::sync::Arc;

use pr_reviewers::db::{self, SqliteStore};
use pr_reviewers::server::{self, AppState};
use pr_reviewers::services::RandomPicker;
use pr_reviewers::{AppConfig, AppError};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("[server] {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    log::info!(
        "[server] Using database {} (max {} connections)",
        config.database_path.display(),
        config.db_max_connections
    );

    let pool = db::initialize_with(&config.database_path, config.pool_settings()).await?;
    let store = Arc::new(SqliteStore::new(pool.clone()));
    let state = AppState::new(store, Arc::new(RandomPicker::new()));

    let result = server::serve(state, config.server_port, config.shutdown_timeout).await;
    db::close_within(&pool, config.shutdown_timeout).await;
    result
}
