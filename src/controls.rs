//! 参数控制
//!
//! 三个相互独立的滑块：推理图像尺寸、置信度阈值、采集缩放比例。
//! 每次交互都会立即产出新值，不做防抖；取值范围和步长由滑块本身保证。

use crate::config::{
    CAPTURE_SCALE_STEP, DEFAULT_CAPTURE_SCALE, DEFAULT_IMAGE_SIZE, DEFAULT_THRESHOLD,
    IMAGE_SIZE_STEP, MAX_CAPTURE_SCALE, MAX_IMAGE_SIZE, MAX_THRESHOLD, MIN_CAPTURE_SCALE,
    MIN_IMAGE_SIZE, MIN_THRESHOLD, THRESHOLD_STEP,
};
use crate::detect::ProcessorHandle;
use crate::error::{Error, Result};

/// 捕获循环和渲染使用的可调参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    /// 预处理阶段的目标最短边
    pub image_size: u32,
    /// 置信度阈值
    pub threshold: f32,
    /// 采集缩放比例
    pub capture_scale: f32,
}

impl Parameters {
    /// 按滑块规则限制范围并对齐步长，启动时的参数与滑块显示保持一致
    pub fn snapped(self) -> Self {
        let [image_size, threshold, scale] = range_controls(self);
        Self {
            image_size: image_size.value() as u32,
            threshold: threshold.value() as f32,
            capture_scale: scale.value() as f32,
        }
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            image_size: DEFAULT_IMAGE_SIZE,
            threshold: DEFAULT_THRESHOLD,
            capture_scale: DEFAULT_CAPTURE_SCALE,
        }
    }
}

/// 数值滑块
#[derive(Debug, Clone, PartialEq)]
pub struct RangeControl {
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    value: f64,
}

impl RangeControl {
    pub fn new(label: &'static str, value: f64, min: f64, max: f64, step: f64) -> Self {
        let mut control = Self {
            label,
            min,
            max,
            step,
            value: min,
        };
        control.set(value);
        control
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// 像滑块一样限制在 [min, max] 并对齐到步长，返回实际生效的值
    pub fn set(&mut self, value: f64) -> f64 {
        let value = if value.is_nan() { self.min } else { value };
        let clamped = value.clamp(self.min, self.max);
        let snapped = if self.step > 0.0 {
            let steps = ((clamped - self.min) / self.step).round();
            (self.min + steps * self.step).min(self.max)
        } else {
            clamped
        };
        // 去掉步长累加带来的浮点尾数
        self.value = (snapped * 1e6).round() / 1e6;
        self.value
    }
}

fn range_controls(params: Parameters) -> [RangeControl; 3] {
    [
        RangeControl::new(
            "Image size",
            params.image_size as f64,
            MIN_IMAGE_SIZE as f64,
            MAX_IMAGE_SIZE as f64,
            IMAGE_SIZE_STEP as f64,
        ),
        RangeControl::new(
            "Threshold",
            params.threshold as f64,
            MIN_THRESHOLD as f64,
            MAX_THRESHOLD as f64,
            THRESHOLD_STEP as f64,
        ),
        RangeControl::new(
            "Image scale",
            params.capture_scale as f64,
            MIN_CAPTURE_SCALE as f64,
            MAX_CAPTURE_SCALE as f64,
            CAPTURE_SCALE_STEP as f64,
        ),
    ]
}

/// 滑块产生的事件
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    ImageSize(u32),
    Threshold(f32),
    Scale(f32),
}

impl ControlEvent {
    /// 解析一行文本命令：`size <n>`、`threshold <x>` 或 `scale <x>`
    pub fn parse(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let (Some(name), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(Error::UnknownControl(line.trim().to_string()));
        };
        let number: f64 = value
            .parse()
            .map_err(|_| Error::UnknownControl(line.trim().to_string()))?;
        match name.to_ascii_lowercase().as_str() {
            "size" | "image-size" => Ok(Self::ImageSize(number.max(0.0).round() as u32)),
            "threshold" => Ok(Self::Threshold(number as f32)),
            "scale" => Ok(Self::Scale(number as f32)),
            _ => Err(Error::UnknownControl(line.trim().to_string())),
        }
    }
}

/// 三个滑块组成的控制面板
///
/// 图像尺寸滑块直接写入推理服务的预处理配置，不经过主循环；
/// 其余两个值由调用方转交给捕获循环。
pub struct ControlPanel {
    image_size: RangeControl,
    threshold: RangeControl,
    scale: RangeControl,
    processor: ProcessorHandle,
}

impl ControlPanel {
    pub fn new(params: Parameters, processor: ProcessorHandle) -> Self {
        let [image_size, threshold, scale] = range_controls(params);
        Self {
            image_size,
            threshold,
            scale,
            processor,
        }
    }

    /// 应用一次交互，返回滑块实际生效的值
    pub fn apply(&mut self, event: ControlEvent) -> ControlEvent {
        match event {
            ControlEvent::ImageSize(size) => {
                let size = self.image_size.set(size as f64) as u32;
                self.processor.set_shortest_edge(size);
                ControlEvent::ImageSize(size)
            }
            ControlEvent::Threshold(threshold) => {
                ControlEvent::Threshold(self.threshold.set(threshold as f64) as f32)
            }
            ControlEvent::Scale(scale) => ControlEvent::Scale(self.scale.set(scale as f64) as f32),
        }
    }

    pub fn parameters(&self) -> Parameters {
        Parameters {
            image_size: self.image_size.value() as u32,
            threshold: self.threshold.value() as f32,
            capture_scale: self.scale.value() as f32,
        }
    }

    pub fn controls(&self) -> [&RangeControl; 3] {
        [&self.image_size, &self.threshold, &self.scale]
    }
}
