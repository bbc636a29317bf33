use crate::diagnosis::types::NUM_LABELS;
use crate::image::INPUT_SHAPE;
use crate::models::{Predictor, XrayClassifier};
use crate::utils::error::XrayError;
use crate::{Config, Result};
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use std::sync::Arc;

type Loader = Box<dyn Fn(&Config) -> Result<Arc<dyn Predictor>> + Send + Sync>;

/// 模型管理器：由启动代码创建一次，通过 `Arc` 在请求间共享
///
/// 模型在首次使用时加载，之后所有请求复用同一实例。
/// 并发的首次请求只会触发一次加载，加载失败时下次请求会重新尝试。
pub struct ModelManager {
    predictor: OnceCell<Arc<dyn Predictor>>,
    loader: Loader,
    config: Config,
}

impl ModelManager {
    /// 使用ONNX分类器的延迟加载管理器
    pub fn new(config: Config) -> Self {
        Self::with_loader(config, |config| {
            let classifier: Arc<dyn Predictor> = Arc::new(XrayClassifier::new(config)?);
            Ok(classifier)
        })
    }

    /// 自定义加载函数
    pub fn with_loader<F>(config: Config, loader: F) -> Self
    where
        F: Fn(&Config) -> Result<Arc<dyn Predictor>> + Send + Sync + 'static,
    {
        Self {
            predictor: OnceCell::new(),
            loader: Box::new(loader),
            config,
        }
    }

    /// 注入已构建好的预测器
    pub fn with_predictor(config: Config, predictor: Arc<dyn Predictor>) -> Self {
        let manager = Self::with_loader(config, |_| {
            Err(XrayError::Internal("Predictor was injected, loader unused".to_string()))
        });
        // 新建的 OnceCell 一定为空
        let _ = manager.predictor.set(predictor);
        manager
    }

    /// 获取预测器，必要时加载模型
    pub fn predictor(&self) -> Result<Arc<dyn Predictor>> {
        self.predictor
            .get_or_try_init(|| {
                tracing::info!("Initializing classification model...");
                let predictor = (self.loader)(&self.config).map_err(|e| match e {
                    XrayError::ModelLoad(msg) => XrayError::ModelLoad(msg),
                    other => XrayError::ModelLoad(other.to_string()),
                })?;
                tracing::info!("Classification model '{}' ready", predictor.name());
                Ok(predictor)
            })
            .map(Arc::clone)
    }

    /// 启动时预加载
    pub fn preload(&self) -> Result<()> {
        self.predictor().map(|_| ())
    }

    pub fn is_loaded(&self) -> bool {
        self.predictor.get().is_some()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 模型健康检查：已加载，或模型文件存在
    pub fn health_check(&self) -> Result<()> {
        tracing::debug!("Performing model health check...");

        if self.is_loaded() {
            return Ok(());
        }

        if !self.config.model_exists() {
            return Err(XrayError::ModelLoad(format!(
                "Model not found: {}",
                self.config.model_path.display()
            )));
        }

        tracing::debug!("Model health check passed (model not loaded yet)");
        Ok(())
    }

    /// 获取模型统计信息
    pub fn stats(&self) -> ModelStats {
        ModelStats {
            loaded: self.is_loaded(),
            model_name: self.predictor.get().map(|p| p.name().to_string()),
            model_path: self.config.model_path.clone(),
            input_shape: INPUT_SHAPE,
            labels: NUM_LABELS,
            intra_threads: self.config.onnx_config.intra_threads,
            optimization_level: self.config.onnx_config.optimization_level,
        }
    }
}

/// 模型统计信息
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModelStats {
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    pub model_path: PathBuf,
    pub input_shape: [usize; 4],
    pub labels: usize,
    pub intra_threads: usize,
    pub optimization_level: u8,
}
