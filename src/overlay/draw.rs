use image::{DynamicImage, ImageBuffer, RgbaImage};
use raqote::{DrawOptions, DrawTarget, LineJoin, PathBuilder, SolidSource, Source, StrokeStyle};

use crate::overlay::Overlay;

const BOX_STROKE_WIDTH: f32 = 2.0;
const LABEL_TAB_HEIGHT: f32 = 14.0;
const LABEL_CHAR_WIDTH: f32 = 6.0;

/// 把绘制表面和叠加层合成为一张图像
///
/// 表面被拉伸到显示容器大小，标注框的百分比坐标按容器尺寸换算为像素。
/// 每个标注绘制描边矩形，并在左上角填充一条与标签等宽的色带。
///
/// # 参数
/// * `surface` - 当前绘制表面的像素
/// * `overlay` - 叠加层
/// * `container` - 显示容器尺寸 (宽, 高)
pub fn compose(surface: &RgbaImage, overlay: &Overlay, container: (u32, u32)) -> DynamicImage {
    let (width, height) = (container.0.max(1), container.1.max(1));
    let mut dt = DrawTarget::new(width as i32, height as i32);

    // 将表面绘制到DrawTarget上
    let image_data: Vec<u32> = surface
        .pixels()
        .map(|pixel| {
            let [r, g, b, a] = pixel.0;
            u32::from_le_bytes([b, g, r, a])
        })
        .collect();
    if surface.width() > 0 && surface.height() > 0 {
        let img = raqote::Image {
            width: surface.width() as i32,
            height: surface.height() as i32,
            data: &image_data,
        };
        dt.draw_image_with_size_at(
            width as f32,
            height as f32,
            0.0,
            0.0,
            &img,
            &DrawOptions::new(),
        );
    }

    for marker in overlay.markers() {
        let x = marker.left / 100.0 * width as f32;
        let y = marker.top / 100.0 * height as f32;
        let w = marker.width / 100.0 * width as f32;
        let h = marker.height / 100.0 * height as f32;

        let color = SolidSource {
            r: marker.color.r,
            g: marker.color.g,
            b: marker.color.b,
            a: 0xFF,
        };

        let mut pb = PathBuilder::new();
        pb.rect(x, y, w, h);
        let path = pb.finish();
        dt.stroke(
            &path,
            &Source::Solid(color),
            &StrokeStyle {
                join: LineJoin::Round,
                width: BOX_STROKE_WIDTH,
                ..StrokeStyle::default()
            },
            &DrawOptions::default(),
        );

        // 栅格层不带字体，用色带标出标签位置
        let tab_width = LABEL_CHAR_WIDTH * marker.label.chars().count() as f32;
        dt.fill_rect(
            x,
            (y - LABEL_TAB_HEIGHT).max(0.0),
            tab_width,
            LABEL_TAB_HEIGHT,
            &Source::Solid(color),
            &DrawOptions::default(),
        );
    }

    // 将DrawTarget转换回图像
    let pixels: Vec<u8> = dt
        .get_data()
        .iter()
        .flat_map(|&pixel| {
            let [b, g, r, a] = pixel.to_le_bytes();
            [r, g, b, a]
        })
        .collect();

    match ImageBuffer::from_raw(width, height, pixels) {
        Some(buffer) => DynamicImage::ImageRgba8(buffer),
        None => DynamicImage::new_rgba8(width, height),
    }
}
