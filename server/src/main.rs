use std::sync::Arc;

use tokio::net::TcpListener;
use todo_core::{DocumentStore, MemoryStore, TodoRepository, TodoService};
use todo_server::config::{self, Config, DotenvOutcome, StoreBackend};
use todo_server::RedisStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv = config::load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match dotenv {
        DotenvOutcome::Loaded(path) => tracing::info!("loaded environment from {}", path.display()),
        DotenvOutcome::Missing => {
            tracing::info!("no .env file, assuming environment variables are already set")
        }
        DotenvOutcome::Failed(e) => tracing::warn!(error = %e, "failed to load .env file"),
    }

    let config = Config::from_env()?;

    let store: Arc<dyn DocumentStore> = match config.store_backend {
        StoreBackend::Redis => Arc::new(RedisStore::connect(&config.redis_url).await?),
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let service = TodoService::new(TodoRepository::new(store));
    service.ensure_index().await?;

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("todo-server v{} listening on {}", env!("CARGO_PKG_VERSION"), listener.local_addr()?);

    todo_server::run(listener, service).await?;
    tracing::info!("server stopped");
    Ok(())
}
