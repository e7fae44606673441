use std::any::Any;
use std::future::{Future, IntoFuture};
use std::time::{Duration, Instant};

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router, ServiceExt,
};
use tokio::{net::TcpListener, sync::oneshot};
use todo_core::{CreateTodo, SearchTodos, Todo, TodoService, Todos, UpdateTodo};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::normalize_path::NormalizePath;

pub mod config;
pub mod error;
pub mod redis_store;

pub use config::{Config, StoreBackend};
pub use error::{ApiError, ErrorBody};
pub use redis_store::RedisStore;

/// How long in-flight requests get to finish once shutdown starts.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// The HTTP surface. Trailing slashes are trimmed before routing, so
/// `/api/todos/` is `/api/todos`. A panicking handler answers 500.
pub fn app(service: TodoService) -> NormalizePath<Router> {
    let router = Router::new()
        .route(
            "/api/todos",
            get(list_todos).post(create_todo).delete(delete_all_todos),
        )
        .route("/api/todos/search", get(search_todos))
        .route(
            "/api/todos/{id}",
            get(get_todo).patch(update_todo).delete(delete_todo),
        )
        .fallback(not_found)
        .with_state(service)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn(log_request));
    NormalizePath::trim_trailing_slash(router)
}

/// Serve until Ctrl-C or SIGTERM.
pub async fn run(listener: TcpListener, service: TodoService) -> Result<(), std::io::Error> {
    serve(listener, service, shutdown_signal(), SHUTDOWN_GRACE).await
}

/// Serve until `shutdown` resolves, then stop accepting connections and give
/// in-flight requests up to `grace` to complete.
pub async fn serve<F>(
    listener: TcpListener,
    service: TodoService,
    shutdown: F,
    grace: Duration,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (draining_tx, draining_rx) = oneshot::channel::<()>();
    let app = ServiceExt::<Request>::into_make_service(app(service));
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            let _ = draining_tx.send(());
        })
        .into_future();
    tokio::pin!(server);

    let deadline = async move {
        match draining_rx.await {
            Ok(()) => tokio::time::sleep(grace).await,
            Err(_) => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = &mut server => result,
        () = deadline => {
            tracing::warn!(grace_secs = grace.as_secs(), "requests still running at shutdown deadline");
            Ok(())
        }
    }
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown signal received");
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        %method,
        %uri,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        *message
    } else {
        "non-string panic payload"
    };
    tracing::error!(panic = detail, "handler panicked");

    let body = ErrorBody {
        error: "internal server error".to_string(),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn list_todos(State(service): State<TodoService>) -> Result<Json<Todos>, ApiError> {
    Ok(Json(service.all().await?))
}

async fn search_todos(
    State(service): State<TodoService>,
    Query(params): Query<SearchTodos>,
) -> Result<Json<Todos>, ApiError> {
    Ok(Json(service.search(&params.name, &params.status).await?))
}

async fn get_todo(
    State(service): State<TodoService>,
    Path(id): Path<String>,
) -> Result<Json<Todo>, ApiError> {
    Ok(Json(service.one(&id).await?))
}

async fn create_todo(
    State(service): State<TodoService>,
    Json(input): Json<CreateTodo>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let todo = service.create(&input.id, &input.name).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_todo(
    State(service): State<TodoService>,
    Path(id): Path<String>,
    Json(input): Json<UpdateTodo>,
) -> Result<Json<Todo>, ApiError> {
    Ok(Json(service.update(&id, &input.status).await?))
}

async fn delete_todo(
    State(service): State<TodoService>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_all_todos(State(service): State<TodoService>) -> Result<StatusCode, ApiError> {
    service.delete_all().await?;
    Ok(StatusCode::NO_CONTENT)
}
