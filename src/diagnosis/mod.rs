pub mod pipeline;
pub mod types;

pub use pipeline::DiagnosisPipeline;
pub use types::{
    DiagnosisReport, DiagnosisStats, DiagnosisSummary, ImageInfo, ModelInfo, PredictionVector,
    RenderedResult, SeverityTier, DISEASE_LABELS, NUM_LABELS,
};
