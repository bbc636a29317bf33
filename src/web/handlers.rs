use crate::{
    diagnosis::{DiagnosisPipeline, DiagnosisReport},
    image::ImageLoader,
    models::ModelManager,
    utils::error::XrayError,
    web::{extractors::RequestId, extractors::ValidatedJson, ui, AppState},
    Result,
};
use axum::{
    body::Bytes,
    extract::{Multipart, State},
    response::{Html, IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// JSON请求体（base64模式）
#[derive(Debug, Deserialize)]
pub struct DiagnoseJsonRequest {
    /// Base64编码的图像数据，可带数据URL前缀
    pub image: String,
}

/// JSON响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: String,
    pub request_id: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, request_id: String) -> Self {
        Self {
            success: true,
            data,
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id,
        }
    }
}

/// JSON base64上传处理器
pub async fn diagnose_json_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    ValidatedJson(request): ValidatedJson<DiagnoseJsonRequest>,
) -> Result<Json<ApiResponse<DiagnosisReport>>> {
    let start_time = Instant::now();
    tracing::info!("Processing JSON diagnosis request: request_id={}", request_id);

    let report = run_blocking(&state, move |models| {
        DiagnosisPipeline::run_base64(models, &request.image)
    })
    .await?;

    tracing::info!(
        "JSON diagnosis completed: request_id={}, time={:.3}s",
        request_id,
        start_time.elapsed().as_secs_f32()
    );

    Ok(Json(ApiResponse::success(report, request_id)))
}

/// Multipart文件上传处理器
pub async fn diagnose_upload_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    multipart: Multipart,
) -> Result<Json<ApiResponse<DiagnosisReport>>> {
    let start_time = Instant::now();
    tracing::info!("Processing multipart diagnosis request: request_id={}", request_id);

    let bytes = read_image_field(multipart).await?;
    let report = run_pipeline(&state, bytes).await?;

    tracing::info!(
        "Upload diagnosis completed: request_id={}, time={:.3}s",
        request_id,
        start_time.elapsed().as_secs_f32()
    );

    Ok(Json(ApiResponse::success(report, request_id)))
}

/// Multipart上传，返回带进度条的HTML结果页
pub async fn diagnose_view_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    multipart: Multipart,
) -> Response {
    tracing::info!("Processing HTML diagnosis request: request_id={}", request_id);

    let result = match read_image_field(multipart).await {
        Ok(bytes) => {
            let preview = ImageLoader::to_data_url(&bytes);
            run_pipeline(&state, bytes)
                .await
                .map(|report| (report, preview))
        }
        Err(e) => Err(e),
    };

    match result {
        Ok((report, preview)) => {
            Html(ui::render_report_page(&report, preview.as_deref())).into_response()
        }
        Err(e) => {
            e.log(&format!("HTML diagnosis failed: request_id={}", request_id));
            (e.status_code(), Html(ui::render_error_page(&e.user_message()))).into_response()
        }
    }
}

/// 读取 multipart 中的 `file` 字段
async fn read_image_field(mut multipart: Multipart) -> Result<Bytes> {
    let mut image_data: Option<Bytes> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        XrayError::InvalidInput(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or("unknown").to_string();

        match field_name.as_str() {
            "file" => {
                tracing::debug!(
                    "Received file: name={:?}, content_type={:?}",
                    field.file_name(),
                    field.content_type()
                );

                let data = field.bytes().await.map_err(|e| {
                    XrayError::InvalidInput(format!("Failed to read file data: {}", e))
                })?;

                if data.is_empty() {
                    return Err(XrayError::InvalidInput("Empty file".to_string()));
                }

                image_data = Some(data);
            }
            _ => {
                tracing::debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    image_data.ok_or_else(|| XrayError::InvalidInput("No image file provided".to_string()))
}

/// 诊断原始图像字节
async fn run_pipeline(state: &AppState, bytes: Bytes) -> Result<DiagnosisReport> {
    run_blocking(state, move |models| DiagnosisPipeline::run(models, &bytes)).await
}

/// 在阻塞线程池中执行诊断，避免推理阻塞异步运行时
async fn run_blocking<F>(state: &AppState, task: F) -> Result<DiagnosisReport>
where
    F: FnOnce(&ModelManager) -> Result<DiagnosisReport> + Send + 'static,
{
    let models = state.models.clone();

    tokio::task::spawn_blocking(move || task(&models))
        .await
        .map_err(|e| XrayError::Internal(format!("Diagnosis task failed: {}", e)))?
}
