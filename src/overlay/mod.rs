//! 检测结果叠加层
//!
//! [`Overlay`] 是一组标注框的容器，对应显示在视频上方的那一层。
//! 每批推理结果到达时先整体清空再逐个追加，不同批次的标注不会交错出现。

pub mod draw;
pub mod marker;
pub mod palette;

pub use draw::compose;
pub use marker::{OverlayMarker, label_text, render_box};
pub use palette::{Color, PALETTE, color_for};

use crate::detect::{Detection, FrameSize, LabelTable};

#[derive(Debug, Clone, Default)]
pub struct Overlay {
    markers: Vec<OverlayMarker>,
    /// 最近一次渲染的批次号，从 1 开始
    batch: u64,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// 移除全部标注
    pub fn clear(&mut self) {
        self.markers.clear();
    }

    pub fn append(&mut self, marker: OverlayMarker) {
        self.markers.push(marker);
    }

    /// 用一批新的检测结果替换当前内容，返回实际绘制的标注数
    pub fn render_batch(
        &mut self,
        detections: &[Detection],
        frame: FrameSize,
        threshold: f32,
        labels: &LabelTable,
    ) -> usize {
        self.clear();
        self.batch += 1;
        for detection in detections {
            if let Some(marker) = render_box(detection, frame, threshold, labels) {
                self.append(marker);
            }
        }
        self.markers.len()
    }

    pub fn markers(&self) -> &[OverlayMarker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn batch(&self) -> u64 {
        self.batch
    }
}
