mod auth;
mod content;
mod error;
mod extractors;
mod proposals;
mod sync;

use std::net::SocketAddr;
use std::sync::Arc;

use athena_common::types::ServiceInfo;
use athena_config::{init_tracing, AppConfig};
use athena_db::audit::models::SyncJobStatusRecord;
use athena_db::content::models::{NewsArticle, ResearchEvent, ResearchProposal};
use athena_db::sync::pg_repository::PgSyncJobRecordRepository;
use athena_db::sync::repositories::SyncJobRecordRepository;
use athena_db::table::{PgTableStore, TableRepository};
use axum::http::{header, HeaderValue, Method};
use axum::{routing::get, Json, Router};
use tower_http::cors::CorsLayer;

use crate::auth::directory::{GraphClientConfig, GraphTeamDirectory, NoTeamDirectory};
use crate::auth::{Policies, TeamDirectory};

#[derive(Clone)]
pub struct AppState {
    pub news_repo: Arc<dyn TableRepository<NewsArticle>>,
    pub event_repo: Arc<dyn TableRepository<ResearchEvent>>,
    pub proposal_repo: Arc<dyn TableRepository<ResearchProposal>>,
    pub sync_repo: Arc<dyn SyncJobRecordRepository>,
    pub audit_repo: Arc<dyn TableRepository<SyncJobStatusRecord>>,
    pub policies: Arc<Policies>,
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn info() -> Json<ServiceInfo> {
    Json(ServiceInfo::new("athena-api"))
}

fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::HeaderName::from_static("x-user-object-id"),
        ]);

    Router::new()
        .route("/health", get(health))
        .route("/info", get(info))
        .merge(content::router())
        .merge(sync::router())
        .merge(proposals::router())
        .layer(cors)
        .with_state(state)
}

fn team_directory() -> Arc<dyn TeamDirectory> {
    match GraphClientConfig::from_env().expect("invalid graph config") {
        Some(config) => {
            tracing::info!(base_url = %config.base_url, "graph team directory configured");
            Arc::new(GraphTeamDirectory::new(config).expect("failed to create graph client"))
        }
        None => {
            tracing::warn!("GRAPH_ACCESS_TOKEN not set, team policies will deny every request");
            Arc::new(NoTeamDirectory)
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing("info");

    let config = AppConfig::from_env().expect("failed to load config");
    tracing::info!(service = "athena-api", "starting");

    let pool = athena_db::create_pool(&config.database_url)
        .await
        .expect("failed to create database pool");
    athena_db::ensure_schema(&pool)
        .await
        .expect("failed to prepare schema");

    let proposal_repo: Arc<dyn TableRepository<ResearchProposal>> =
        Arc::new(PgTableStore::new(pool.clone()));

    let state = AppState {
        news_repo: Arc::new(PgTableStore::new(pool.clone())),
        event_repo: Arc::new(PgTableStore::new(pool.clone())),
        proposal_repo: Arc::clone(&proposal_repo),
        sync_repo: Arc::new(PgSyncJobRecordRepository::new(pool.clone())),
        audit_repo: Arc::new(PgTableStore::new(pool)),
        policies: Arc::new(Policies::new(proposal_repo, team_directory())),
    };

    let app = build_router(state);
    let addr: SocketAddr = config.bind_addr().parse().expect("invalid bind address");

    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app).await.expect("server error");
}
