use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use shared::{
    domain::{Employee, EmployeeDraft},
    error::{ApiError, ErrorCode},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use api::Directory;
use app_state::AppState;
use config::{load_settings, read_seed};

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let directory = match &settings.seed_path {
        Some(path) => {
            let drafts = read_seed(path)?;
            let directory = Directory::seeded(drafts)
                .await
                .map_err(|err| anyhow::anyhow!(err.message))
                .with_context(|| format!("invalid seed file '{}'", path.display()))?;
            info!(
                seed = %path.display(),
                count = directory.list().await.len(),
                "directory seeded"
            );
            directory
        }
        None => Directory::new(),
    };

    let app = build_router(AppState {
        directory: Arc::new(directory),
    });

    let addr: SocketAddr = settings
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.bind_addr))?;
    info!(%addr, "directory service listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/employees", get(list_employees).post(create_employee))
        .route(
            "/employees/:email",
            put(update_employee).delete(delete_employee),
        )
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn list_employees(State(state): State<AppState>) -> Json<Vec<Employee>> {
    Json(state.directory.list().await)
}

async fn create_employee(
    State(state): State<AppState>,
    Json(draft): Json<EmployeeDraft>,
) -> ApiResult<(StatusCode, Json<Employee>)> {
    let employee = state.directory.create(draft).await.map_err(reject)?;
    info!(email = %employee.email, id = %employee.id, "employee created");
    Ok((StatusCode::CREATED, Json(employee)))
}

async fn update_employee(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(draft): Json<EmployeeDraft>,
) -> ApiResult<Json<Employee>> {
    let employee = state
        .directory
        .update(&email, draft)
        .await
        .map_err(reject)?;
    info!(key = %email, email = %employee.email, "employee updated");
    Ok(Json(employee))
}

async fn delete_employee(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<StatusCode> {
    state.directory.delete(&email).await.map_err(reject)?;
    info!(%email, "employee deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(status = status.as_u16(), message = %err.message, "request rejected");
    (status, Json(err))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
