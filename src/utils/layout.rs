use crate::config::{CONTAINER_MAX_HEIGHT, CONTAINER_MAX_WIDTH};

/// 按采集缩放比例计算绘制表面的尺寸（四舍五入到整数像素）
pub fn stream_size(width: u32, height: u32, scale: f32) -> (u32, u32) {
    let scale = scale.max(0.0);
    (
        (width as f32 * scale).round() as u32,
        (height as f32 * scale).round() as u32,
    )
}

/// 保持宽高比，把视频放进 720x405 的显示容器
///
/// 比容器更宽的画面占满宽度，否则占满高度。
pub fn fit_container(width: u32, height: u32) -> (f32, f32) {
    if width == 0 || height == 0 {
        return (CONTAINER_MAX_WIDTH, CONTAINER_MAX_HEIGHT);
    }
    let ar = width as f32 / height as f32;
    if ar > CONTAINER_MAX_WIDTH / CONTAINER_MAX_HEIGHT {
        (CONTAINER_MAX_WIDTH, CONTAINER_MAX_WIDTH / ar)
    } else {
        (CONTAINER_MAX_HEIGHT * ar, CONTAINER_MAX_HEIGHT)
    }
}
