use image::{DynamicImage, RgbaImage, imageops::FilterType};

use crate::detect::FrameSize;
use crate::utils::layout::{fit_container, stream_size};

/// 绘制表面
///
/// 保存最近一帧按采集缩放比例缩小后的像素。尺寸为 0 时表面不可绘制，
/// 捕获循环会跳过这一拍。
#[derive(Debug, Clone)]
pub struct Surface {
    native: FrameSize,
    pixels: RgbaImage,
}

impl Surface {
    pub fn new(native: FrameSize, scale: f32) -> Self {
        let (width, height) = stream_size(native.width, native.height, scale);
        Self {
            native,
            pixels: RgbaImage::new(width, height),
        }
    }

    /// 按新的缩放比例调整表面尺寸，原有内容被丢弃
    pub fn set_scale(&mut self, scale: f32) {
        let (width, height) = stream_size(self.native.width, self.native.height, scale);
        if (width, height) != self.pixels.dimensions() {
            self.pixels = RgbaImage::new(width, height);
        }
    }

    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.pixels.width(), self.pixels.height())
    }

    pub fn native(&self) -> FrameSize {
        self.native
    }

    /// 显示容器尺寸，只取决于原生宽高比
    pub fn container(&self) -> (u32, u32) {
        let (width, height) = fit_container(self.native.width, self.native.height);
        (width.round() as u32, height.round() as u32)
    }

    pub fn is_drawable(&self) -> bool {
        !self.size().is_empty()
    }

    /// 把一帧画面拉伸绘制到整个表面
    pub fn draw_frame(&mut self, frame: &DynamicImage) {
        if !self.is_drawable() {
            return;
        }
        let (width, height) = self.pixels.dimensions();
        self.pixels = if frame.width() == width && frame.height() == height {
            frame.to_rgba8()
        } else {
            frame.resize_exact(width, height, FilterType::Triangle).to_rgba8()
        };
    }

    /// 读取表面的原始 RGBA 像素
    pub fn image_data(&self) -> Vec<u8> {
        self.pixels.as_raw().clone()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}
