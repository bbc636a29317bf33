use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XrayError {
    #[error("Image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: {0} bytes, max allowed: {1} bytes")]
    FileTooLarge(usize, usize),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl XrayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            XrayError::Decode(_) => StatusCode::BAD_REQUEST,
            XrayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            XrayError::Json(_) => StatusCode::BAD_REQUEST,
            XrayError::FileTooLarge(_, _) => StatusCode::PAYLOAD_TOO_LARGE,
            XrayError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            XrayError::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            XrayError::Decode(_) => "IMAGE_DECODE_ERROR",
            XrayError::ModelLoad(_) => "MODEL_LOAD_ERROR",
            XrayError::Inference(_) => "INFERENCE_ERROR",
            XrayError::InvalidInput(_) => "INVALID_INPUT",
            XrayError::FileTooLarge(_, _) => "FILE_TOO_LARGE",
            XrayError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            XrayError::Config(_) => "CONFIG_ERROR",
            XrayError::Io(_) => "IO_ERROR",
            XrayError::Json(_) => "JSON_ERROR",
            XrayError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 是否由请求本身引起（4xx）
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// 记录失败请求：客户端错误为warn，服务端错误为error
    pub fn log(&self, context: &str) {
        if self.is_client_error() {
            tracing::warn!("{}: {} ({})", context, self, self.status_code());
        } else {
            tracing::error!("{}: {} ({})", context, self, self.status_code());
        }
    }

    /// 面向用户的错误信息，内部错误不暴露细节
    pub fn user_message(&self) -> String {
        match self {
            XrayError::Decode(_) => "could not process image".to_string(),
            XrayError::Inference(_) => "internal error during inference".to_string(),
            XrayError::Io(_) | XrayError::Internal(_) | XrayError::Config(_) => {
                "internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for XrayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.user_message(),
            }
        });

        self.log("Request failed");

        (status, axum::Json(error_response)).into_response()
    }
}
