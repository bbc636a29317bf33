pub mod loader;
pub mod postprocessing;
pub mod preprocessing;

pub use loader::ImageLoader;
pub use postprocessing::ResultFormatter;
pub use preprocessing::ImagePreprocessor;

use ndarray::Array4;

/// 模型输入边长
pub const INPUT_SIZE: usize = 224;

/// RGB通道数
pub const RGB_CHANNELS: usize = 3;

/// 模型输入张量 (1, H, W, C)
pub type XrayTensor = Array4<f32>;

/// 模型输入形状
pub const INPUT_SHAPE: [usize; 4] = [1, INPUT_SIZE, INPUT_SIZE, RGB_CHANNELS];
