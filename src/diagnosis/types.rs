use crate::utils::error::XrayError;
use serde::Serialize;

/// 疾病标签数量
pub const NUM_LABELS: usize = 15;

/// 模型输出顺序对应的疾病标签，顺序不可更改
pub const DISEASE_LABELS: [&str; NUM_LABELS] = [
    "Atelectasis",
    "Cardiomegaly",
    "Consolidation",
    "Edema",
    "Effusion",
    "Emphysema",
    "Fibrosis",
    "Hernia",
    "Infiltration",
    "Mass",
    "Nodule",
    "Pleural_Thickening",
    "Pneumonia",
    "Pneumothorax",
    "No Finding",
];

/// 多标签分类输出：每个标签一个独立概率
///
/// 只能由恰好15个有限值构造，超出[0, 1]的值会被截断。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionVector([f32; NUM_LABELS]);

impl PredictionVector {
    pub fn new(values: [f32; NUM_LABELS]) -> crate::Result<Self> {
        if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
            return Err(XrayError::Inference(format!(
                "Non-finite probability for label '{}': {}",
                DISEASE_LABELS[idx], values[idx]
            )));
        }
        Ok(Self(values.map(|v| v.clamp(0.0, 1.0))))
    }

    pub fn probabilities(&self) -> &[f32; NUM_LABELS] {
        &self.0
    }

    /// 按标签顺序迭代 (label, probability)
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f32)> + '_ {
        DISEASE_LABELS.iter().copied().zip(self.0.iter().copied())
    }
}

impl TryFrom<Vec<f32>> for PredictionVector {
    type Error = XrayError;

    fn try_from(values: Vec<f32>) -> Result<Self, Self::Error> {
        let len = values.len();
        let values: [f32; NUM_LABELS] = values.try_into().map_err(|_| {
            XrayError::Inference(format!(
                "Expected {} probabilities, model returned {}",
                NUM_LABELS, len
            ))
        })?;
        Self::new(values)
    }
}

/// 输入图像元信息
#[derive(Debug, Clone, Serialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// 处理耗时统计
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiagnosisStats {
    /// 解码耗时（毫秒）
    pub decode_time_ms: u64,
    /// 预处理耗时（毫秒）
    pub preprocess_time_ms: u64,
    /// 推理耗时（毫秒）
    pub inference_time_ms: u64,
    /// 总耗时（毫秒）
    pub total_time_ms: u64,
}

/// 模型信息
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub model: String,
    pub input_shape: [usize; 4],
    pub labels: usize,
}

/// 完整的诊断结果
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisReport {
    /// 处理耗时（秒）
    pub processing_time: f32,
    pub image: ImageInfo,
    /// 按标签顺序排列的结果
    pub findings: Vec<RenderedResult>,
    pub summary: DiagnosisSummary,
    pub stats: DiagnosisStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_info: Option<ModelInfo>,
}

// 重新导出格式化结果类型
pub use crate::image::postprocessing::{DiagnosisSummary, RenderedResult, SeverityTier};
