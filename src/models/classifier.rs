use crate::diagnosis::types::{PredictionVector, NUM_LABELS};
use crate::image::{XrayTensor, INPUT_SHAPE};
use crate::utils::error::XrayError;
use crate::{Config, Result};
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;
use std::path::Path;

/// 多标签分类器接口
pub trait Predictor: Send + Sync {
    /// 对 (1, 224, 224, 3) 张量推理，返回15个标签的概率
    fn predict(&self, tensor: &XrayTensor) -> Result<PredictionVector>;

    /// 模型名称（用于结果展示）
    fn name(&self) -> &str;
}

/// 检查输入张量形状
pub fn validate_input(tensor: &XrayTensor) -> Result<()> {
    if tensor.shape() != INPUT_SHAPE {
        return Err(XrayError::Inference(format!(
            "Expected input shape {:?}, got {:?}",
            INPUT_SHAPE,
            tensor.shape()
        )));
    }
    Ok(())
}

/// 基于ONNX Runtime的胸片分类器
pub struct XrayClassifier {
    session: Mutex<Session>,
    input_name: String,  // 动态发现的输入名称
    output_name: String, // 动态发现的输出名称
    name: String,
}

impl XrayClassifier {
    pub fn new(config: &Config) -> Result<Self> {
        let model_path = &config.model_path;

        if !model_path.is_file() {
            return Err(XrayError::ModelLoad(format!(
                "Model not found: {}",
                model_path.display()
            )));
        }

        tracing::info!("Loading classification model from: {}", model_path.display());

        let session = Session::builder()
            .map_err(Self::load_error)?
            .with_optimization_level(Self::optimization_level(
                config.onnx_config.optimization_level,
            ))
            .map_err(Self::load_error)?
            .with_intra_threads(config.onnx_config.intra_threads)
            .map_err(Self::load_error)?
            .commit_from_file(model_path)
            .map_err(Self::load_error)?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| XrayError::ModelLoad("Model has no inputs".to_string()))?;

        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| XrayError::ModelLoad("Model has no outputs".to_string()))?;

        tracing::info!("Model input: '{}', output: '{}'", input_name, output_name);
        for (i, output) in session.outputs.iter().enumerate() {
            tracing::debug!("Model output[{}]: '{}'", i, output.name);
        }

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            name: Self::model_name(model_path),
        })
    }

    fn load_error(e: impl std::fmt::Display) -> XrayError {
        XrayError::ModelLoad(format!("Failed to create ONNX session: {}", e))
    }

    fn optimization_level(level: u8) -> GraphOptimizationLevel {
        match level {
            0 => GraphOptimizationLevel::Disable,
            1 => GraphOptimizationLevel::Level1,
            2 => GraphOptimizationLevel::Level2,
            _ => GraphOptimizationLevel::Level3,
        }
    }

    fn model_name(path: &Path) -> String {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "xray_model".to_string())
    }

    /// 展平输出，接受 (1, 15) 或 (15)
    fn parse_output(shape: &[usize], values: Vec<f32>) -> Result<PredictionVector> {
        let valid_shape = matches!(shape, [n] if *n == NUM_LABELS)
            || matches!(shape, [1, n] if *n == NUM_LABELS);

        if !valid_shape {
            return Err(XrayError::Inference(format!(
                "Expected output shape [1, {}], got {:?}",
                NUM_LABELS, shape
            )));
        }

        PredictionVector::try_from(values)
    }
}

impl Predictor for XrayClassifier {
    fn predict(&self, tensor: &XrayTensor) -> Result<PredictionVector> {
        validate_input(tensor)?;

        let input_tensor = Tensor::from_array(tensor.clone())
            .map_err(|e| XrayError::Inference(format!("Failed to build input tensor: {}", e)))?;

        let (shape, values) = {
            let mut session = self.session.lock();
            let outputs = session
                .run(inputs![self.input_name.as_str() => input_tensor])
                .map_err(|e| XrayError::Inference(format!("Session run failed: {}", e)))?;

            match outputs.get(self.output_name.as_str()) {
                Some(output) => {
                    let array = output.try_extract_array::<f32>().map_err(|e| {
                        XrayError::Inference(format!("Failed to extract output: {}", e))
                    })?;
                    (array.shape().to_vec(), array.iter().copied().collect::<Vec<f32>>())
                }
                None => {
                    let available: Vec<String> = outputs.keys().map(|s| s.to_string()).collect();
                    return Err(XrayError::Inference(format!(
                        "Output '{}' not found. Available outputs: {:?}",
                        self.output_name, available
                    )));
                }
            }
        };

        Self::parse_output(&shape, values)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
