use crate::detect::{Detection, FrameSize, LabelTable};
use crate::overlay::palette::{Color, color_for};

/// 叠加层上的一个标注框
///
/// 位置和尺寸都是相对显示容器的百分比，因此与绘制表面的实际分辨率无关。
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayMarker {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub color: Color,
    pub label: String,
    pub class_id: usize,
}

/// 把一个检测结果映射为叠加层标注
///
/// 置信度低于 `threshold`（或为 NaN）、帧尺寸为空时返回 `None`。
///
/// # 参数
/// * `detection` - 检测结果，坐标位于 `frame` 坐标系
/// * `frame` - 检测坐标对应的帧尺寸
/// * `threshold` - 当前置信度阈值
/// * `labels` - 模型提供的标签表
pub fn render_box(
    detection: &Detection,
    frame: FrameSize,
    threshold: f32,
    labels: &LabelTable,
) -> Option<OverlayMarker> {
    if !(detection.score >= threshold) || frame.is_empty() {
        return None;
    }

    let (w, h) = (frame.width as f32, frame.height as f32);
    let bbox = &detection.bbox;
    Some(OverlayMarker {
        left: 100.0 * bbox.x1 / w,
        top: 100.0 * bbox.y1 / h,
        width: 100.0 * (bbox.x2 - bbox.x1) / w,
        height: 100.0 * (bbox.y2 - bbox.y1) / h,
        color: color_for(detection.class_id),
        label: label_text(detection, labels),
        class_id: detection.class_id,
    })
}

/// 标签文字：类别名称加两位小数的百分比置信度
pub fn label_text(detection: &Detection, labels: &LabelTable) -> String {
    let percent = 100.0 * detection.score;
    match labels.name(detection.class_id) {
        Some(name) => format!("{name} ({percent:.2}%)"),
        None => format!("{} ({percent:.2}%)", detection.class_id),
    }
}
