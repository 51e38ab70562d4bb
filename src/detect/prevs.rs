use image::{DynamicImage, GenericImageView, RgbaImage, imageops::FilterType};
use ndarray::{Array, Array4};

use crate::error::{Error, Result};

/// 把采集到的 RGBA 像素包装成图像
///
/// 像素长度必须正好是 `width * height * 4`。
pub fn rgba_to_image(rgba: &[u8], width: u32, height: u32) -> Result<DynamicImage> {
    let invalid = || Error::InvalidFrame {
        width,
        height,
        len: rgba.len(),
    };
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    let buffer = RgbaImage::from_raw(width, height, rgba.to_vec()).ok_or_else(invalid)?;
    Ok(DynamicImage::ImageRgba8(buffer))
}

/// 计算按最短边缩放后的尺寸
///
/// 最短边变为 `shortest_edge`，另一边按原宽高比四舍五入。
pub fn shortest_edge_size(width: u32, height: u32, shortest_edge: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }
    let edge = shortest_edge as f64;
    if width <= height {
        let scaled = (height as f64 * edge / width as f64).round() as u32;
        (shortest_edge, scaled.max(1))
    } else {
        let scaled = (width as f64 * edge / height as f64).round() as u32;
        (scaled.max(1), shortest_edge)
    }
}

/// 调整图像大小以适应模型输入
///
/// 使用CatmullRom插值算法将图像调整为指定尺寸。
pub fn resize_image(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    img.resize_exact(width, height, FilterType::CatmullRom)
}

/// 将图像转换为模型输入张量
///
/// 将图像转换为模型所需的四维张量格式，包括：
/// 1. 归一化像素值到[0, 1]范围
/// 2. 调整通道顺序为RGB
/// 3. 调整维度顺序为NCHW格式
///
/// # 参数
/// * `img` - 图像
/// * `input_height` - 输入图像高度
/// * `input_width` - 输入图像宽度
///
/// # 返回值
/// 返回形状为(1, 3, height, width)的四维张量
pub fn image_to_tensor(img: &DynamicImage, input_height: usize, input_width: usize) -> Array4<f32> {
    let mut tensor = Array::zeros((1, 3, input_height, input_width));

    for (x, y, pixel) in img.pixels() {
        let (x, y) = (x as usize, y as usize);
        if x >= input_width || y >= input_height {
            continue;
        }
        let [r, g, b, _] = pixel.0;

        tensor[[0, 0, y, x]] = (r as f32) / 255.0; // R通道
        tensor[[0, 1, y, x]] = (g as f32) / 255.0; // G通道
        tensor[[0, 2, y, x]] = (b as f32) / 255.0; // B通道
    }

    tensor
}
