pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod ui;

use crate::{
    diagnosis::{DISEASE_LABELS, NUM_LABELS},
    image::postprocessing::{HIGH_THRESHOLD, MEDIUM_THRESHOLD},
    models::ModelManager,
    utils::error::XrayError,
    Config, Result,
};
use axum::{
    extract::{DefaultBodyLimit, State},
    middleware as axum_middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

/// 处理器共享状态
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub models: Arc<ModelManager>,
}

impl AppState {
    pub fn new(config: Config, models: Arc<ModelManager>) -> Self {
        Self { config, models }
    }
}

pub async fn serve(config: Config) -> Result<()> {
    // 模型管理器在此创建一次，由所有请求共享
    let models = Arc::new(ModelManager::new(config.clone()));

    if config.preload_model {
        tracing::info!("Preloading model from {}", config.model_path.display());
        models.preload()?;
    } else if !config.model_exists() {
        tracing::warn!(
            "Model file {} not found, inference requests will fail until it is provided",
            config.model_path.display()
        );
    }

    let app = create_app(AppState::new(config.clone(), models));

    // 解析绑定地址
    let addr: SocketAddr = config.bind_addr.parse().map_err(|e| {
        XrayError::Config(format!("Invalid bind address {}: {}", config.bind_addr, e))
    })?;

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  POST /diagnose         - JSON base64 upload");
    tracing::info!("  POST /diagnose/upload  - Multipart file upload");
    tracing::info!("  POST /diagnose/view    - Multipart upload, HTML result");
    tracing::info!("  GET  /                 - Web UI");
    tracing::info!("  GET  /health           - Health check");
    tracing::info!("  GET  /api/info         - Service information");

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| XrayError::Internal(format!("Failed to bind to address {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| XrayError::Internal(format!("Server failed: {}", e)))?;

    Ok(())
}

pub fn create_app(state: AppState) -> Router {
    let server_config = &state.config.server_config;

    Router::new()
        // 诊断API路由
        .route("/diagnose", post(handlers::diagnose_json_handler))
        .route("/diagnose/upload", post(handlers::diagnose_upload_handler))
        .route("/diagnose/view", post(handlers::diagnose_view_handler))
        // Web UI路由
        .route("/", get(ui::index_handler))
        // 系统路由
        .route("/health", get(health_handler))
        .route("/api/info", get(info_handler))
        .layer(axum_middleware::from_fn(middleware::security_headers))
        .layer(axum_middleware::from_fn(middleware::request_logging))
        .layer(DefaultBodyLimit::max(server_config.max_request_size))
        .layer(RequestBodyLimitLayer::new(server_config.max_request_size))
        .layer(TimeoutLayer::new(Duration::from_secs(server_config.request_timeout)))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// 健康检查端点
async fn health_handler(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    state.models.health_check()?;

    Ok(Json(json!({
        "status": "healthy",
        "model_loaded": state.models.is_loaded(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })))
}

/// 服务信息端点
async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "service": "X-ray Diagnosis Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "model": state.models.stats(),
        "labels": DISEASE_LABELS,
        "num_labels": NUM_LABELS,
        "thresholds": {
            "high": HIGH_THRESHOLD,
            "medium": MEDIUM_THRESHOLD
        },
        "accepted_formats": ["jpeg", "png"],
        "max_image_size": state.config.server_config.max_image_size
    }))
}
