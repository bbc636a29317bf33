use crate::{
    diagnosis::types::{DiagnosisReport, DiagnosisStats, ImageInfo, ModelInfo, NUM_LABELS},
    image::{ImageLoader, ImagePreprocessor, ResultFormatter, INPUT_SHAPE},
    models::ModelManager,
    utils::error::XrayError,
    Result,
};
use image::GenericImageView;
use std::time::Instant;

/// 诊断处理流水线：解码 → 预处理 → 推理 → 格式化
pub struct DiagnosisPipeline;

impl DiagnosisPipeline {
    /// 处理原始图像字节
    pub fn run(models: &ModelManager, bytes: &[u8]) -> Result<DiagnosisReport> {
        let start_time = Instant::now();
        let max_size = models.config().server_config.max_image_size;

        let image = ImageLoader::from_bytes(bytes, max_size)?;
        let (width, height) = image.dimensions();
        let image_info = ImageInfo {
            width,
            height,
            format: ImageLoader::format_name(bytes),
        };
        let decode_time = start_time.elapsed();

        tracing::debug!("Decoded image: {}x{}", width, height);

        let preprocess_start = Instant::now();
        let tensor = ImagePreprocessor::preprocess(&image);
        drop(image);
        let preprocess_time = preprocess_start.elapsed();

        // 模型在第一次推理时加载
        let predictor = models.predictor()?;

        let inference_start = Instant::now();
        let predictions = predictor.predict(&tensor)?;
        let inference_time = inference_start.elapsed();

        let findings = ResultFormatter::format(&predictions);
        let summary = ResultFormatter::summarize(&findings)
            .ok_or_else(|| XrayError::Internal("Formatter returned no results".to_string()))?;

        tracing::debug!("Findings:\n{}", ResultFormatter::format_as_text(&findings));

        let total_time = start_time.elapsed();
        let stats = DiagnosisStats {
            decode_time_ms: decode_time.as_millis() as u64,
            preprocess_time_ms: preprocess_time.as_millis() as u64,
            inference_time_ms: inference_time.as_millis() as u64,
            total_time_ms: total_time.as_millis() as u64,
        };

        tracing::info!(
            "Diagnosis completed: top={} ({:.2}%), high={}, time={:.3}s",
            summary.top_label,
            summary.top_percentage,
            summary.high_count,
            total_time.as_secs_f32()
        );

        Ok(DiagnosisReport {
            processing_time: total_time.as_secs_f32(),
            image: image_info,
            findings,
            summary,
            stats,
            model_info: Some(ModelInfo {
                model: predictor.name().to_string(),
                input_shape: INPUT_SHAPE,
                labels: NUM_LABELS,
            }),
        })
    }

    /// 处理base64图像
    pub fn run_base64(models: &ModelManager, base64_data: &str) -> Result<DiagnosisReport> {
        let bytes = ImageLoader::decode_base64(base64_data)?;
        Self::run(models, &bytes)
    }
}
