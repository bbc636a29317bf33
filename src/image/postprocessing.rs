use crate::diagnosis::types::{PredictionVector, NUM_LABELS};
use serde::Serialize;

/// 高风险概率阈值（严格大于）
pub const HIGH_PROBABILITY: f32 = 0.6;
/// 中风险概率阈值（严格大于）
pub const MEDIUM_PROBABILITY: f32 = 0.3;

/// 高风险阈值（百分比）
pub const HIGH_THRESHOLD: f64 = 60.0;
/// 中风险阈值（百分比）
pub const MEDIUM_THRESHOLD: f64 = 30.0;

/// 严重程度分级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    Low,
    Medium,
    High,
}

impl SeverityTier {
    /// 按 f32 概率分级，阈值严格大于
    pub fn from_probability(probability: f32) -> Self {
        if probability > HIGH_PROBABILITY {
            SeverityTier::High
        } else if probability > MEDIUM_PROBABILITY {
            SeverityTier::Medium
        } else {
            SeverityTier::Low
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            SeverityTier::High => "#d9534f",
            SeverityTier::Medium => "#f0ad4e",
            SeverityTier::Low => "#5bc0de",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SeverityTier::High => "high",
            SeverityTier::Medium => "medium",
            SeverityTier::Low => "low",
        }
    }
}

/// 单个标签的展示结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedResult {
    pub label: &'static str,
    /// 原始概率 (0.0 - 1.0)
    pub probability: f32,
    /// 概率百分比 (0.0 - 100.0)
    pub percentage: f64,
    /// 保留两位小数的百分比文本
    pub display: String,
    pub tier: SeverityTier,
    pub color: &'static str,
}

/// 结果摘要
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosisSummary {
    /// 概率最高的标签
    pub top_label: &'static str,
    pub top_percentage: f64,
    /// 高风险标签数量
    pub high_count: usize,
}

/// 结果格式化器
pub struct ResultFormatter;

impl ResultFormatter {
    /// 按固定标签顺序格式化模型输出
    pub fn format(predictions: &PredictionVector) -> Vec<RenderedResult> {
        let results: Vec<RenderedResult> = predictions
            .iter()
            .map(|(label, probability)| Self::format_single(label, probability))
            .collect();

        debug_assert_eq!(results.len(), NUM_LABELS);
        results
    }

    fn format_single(label: &'static str, probability: f32) -> RenderedResult {
        let percentage = f64::from(probability) * 100.0;
        let tier = SeverityTier::from_probability(probability);

        RenderedResult {
            label,
            probability,
            percentage,
            display: format!("{:.2}", percentage),
            tier,
            color: tier.color(),
        }
    }

    /// 计算摘要：最高概率标签与高风险数量
    pub fn summarize(results: &[RenderedResult]) -> Option<DiagnosisSummary> {
        // 概率相同时取靠前的标签
        let top = results.iter().reduce(|best, candidate| {
            if candidate.percentage > best.percentage {
                candidate
            } else {
                best
            }
        })?;

        Some(DiagnosisSummary {
            top_label: top.label,
            top_percentage: top.percentage,
            high_count: results
                .iter()
                .filter(|r| r.tier == SeverityTier::High)
                .count(),
        })
    }

    /// 格式化为纯文本输出，每行一个标签
    pub fn format_as_text(results: &[RenderedResult]) -> String {
        results
            .iter()
            .map(|r| format!("{}: {}% ({})", r.label, r.display, r.tier.as_str()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
