use super::{loader::ImageLoader, XrayTensor, INPUT_SIZE, RGB_CHANNELS};
use crate::Result;
use image::{imageops::FilterType, DynamicImage};
use ndarray::Array4;

/// 缩放滤波器：Catmull-Rom 双三次插值
pub const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// 将任意图像转换为模型输入张量 (1, 224, 224, 3)，NHWC，取值 [0, 1]
    ///
    /// 1. 转为RGB：丢弃alpha通道，灰度图复制到三个通道
    /// 2. 缩放到 224x224，不保持宽高比
    /// 3. 像素值除以255
    /// 4. 添加batch维度
    pub fn preprocess(image: &DynamicImage) -> XrayTensor {
        let rgb = image.to_rgb8();
        let size = INPUT_SIZE as u32;
        let resized = image::imageops::resize(&rgb, size, size, RESIZE_FILTER);

        Array4::from_shape_fn(
            (1, INPUT_SIZE, INPUT_SIZE, RGB_CHANNELS),
            |(_, y, x, c)| f32::from(resized.get_pixel(x as u32, y as u32)[c]) / 255.0,
        )
    }

    /// 从原始字节解码并预处理
    pub fn preprocess_bytes(bytes: &[u8]) -> Result<XrayTensor> {
        let image = ImageLoader::decode(bytes)?;
        Ok(Self::preprocess(&image))
    }
}
