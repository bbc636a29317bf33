use crate::image::loader::DEFAULT_MAX_IMAGE_BYTES;
use crate::utils::error::XrayError;
use crate::Result;
use std::path::PathBuf;

/// 请求体中除图像外的余量（multipart头、JSON字段等）
const REQUEST_OVERHEAD_BYTES: usize = 1024 * 1024;

/// 默认模型文件路径（Keras模型导出的ONNX）
pub const DEFAULT_MODEL_PATH: &str = "models/xray_model.onnx";

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// 模型文件路径
    pub model_path: PathBuf,

    /// 工作线程数量
    pub workers: usize,

    /// 开发模式
    pub dev_mode: bool,

    /// 启动时预加载模型
    pub preload_model: bool,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 服务器配置
    pub server_config: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 优化级别 (0-3)
    pub optimization_level: u8,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 请求超时时间（秒）
    pub request_timeout: u64,

    /// 最大请求体大小（字节）
    pub max_request_size: usize,

    /// 单张图像最大字节数
    pub max_image_size: usize,
}

impl Config {
    pub fn new(
        bind_addr: String,
        model_path: impl Into<PathBuf>,
        workers: Option<usize>,
        dev_mode: bool,
        preload_model: bool,
    ) -> Result<Self> {
        let cpu_cores = num_cpus::get();
        let workers = workers.unwrap_or(cpu_cores);
        if workers == 0 {
            return Err(XrayError::Config("workers must be at least 1".to_string()));
        }

        let onnx_config = OnnxConfig {
            intra_threads: (cpu_cores * 3 / 4).max(1), // 使用75%的CPU核心
            optimization_level: 3,
        };

        let server_config = ServerConfig {
            request_timeout: if dev_mode { 300 } else { 60 },
            // base64编码使体积增长4/3
            max_request_size: DEFAULT_MAX_IMAGE_BYTES.div_ceil(3) * 4 + REQUEST_OVERHEAD_BYTES,
            max_image_size: DEFAULT_MAX_IMAGE_BYTES,
        };

        Ok(Self {
            bind_addr,
            model_path: model_path.into(),
            workers,
            dev_mode,
            preload_model,
            onnx_config,
            server_config,
        })
    }

    /// 模型文件是否存在
    pub fn model_exists(&self) -> bool {
        self.model_path.is_file()
    }
}
