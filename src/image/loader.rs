use crate::utils::error::XrayError;
use crate::Result;
use base64::Engine;
use image::{DynamicImage, ImageFormat};

/// 默认单张图像最大字节数
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

pub struct ImageLoader;

impl ImageLoader {
    /// 解码内存中的图像，任何解码失败都归为 Decode 错误
    pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
        image::load_from_memory(bytes).map_err(XrayError::Decode)
    }

    /// 从字节加载图像（带大小检查）
    pub fn from_bytes(bytes: &[u8], max_size: usize) -> Result<DynamicImage> {
        if bytes.is_empty() {
            return Err(XrayError::InvalidInput("Empty image data".to_string()));
        }

        if bytes.len() > max_size {
            return Err(XrayError::FileTooLarge(bytes.len(), max_size));
        }

        if let Some(format) = Self::detect_format(bytes) {
            tracing::debug!("Detected image format: {:?}", format);
        }

        Self::decode(bytes)
    }

    /// 解码base64，兼容数据URL前缀 (data:image/xxx;base64,)
    pub fn decode_base64(base64_data: &str) -> Result<Vec<u8>> {
        let trimmed = base64_data.trim();
        let base64_clean = match trimmed.strip_prefix("data:") {
            Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(rest),
            None => trimmed,
        };

        base64::engine::general_purpose::STANDARD
            .decode(base64_clean)
            .map_err(|e| XrayError::InvalidInput(format!("Invalid base64 image data: {}", e)))
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// 上传界面接受的格式
    pub fn is_supported_format(format: ImageFormat) -> bool {
        matches!(format, ImageFormat::Png | ImageFormat::Jpeg)
    }

    /// 编码为数据URL，用于结果页内联预览；仅支持PNG和JPEG
    pub fn to_data_url(bytes: &[u8]) -> Option<String> {
        let mime = match Self::detect_format(bytes)? {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            _ => return None,
        };
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Some(format!("data:{};base64,{}", mime, encoded))
    }

    /// 格式名称（用于结果展示）
    pub fn format_name(bytes: &[u8]) -> Option<String> {
        Self::detect_format(bytes)
            .filter(|format| Self::is_supported_format(*format))
            .map(|format| format!("{:?}", format).to_lowercase())
    }
}
