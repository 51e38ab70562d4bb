/// 边界框结构
///
/// 以帧像素坐标表示的矩形，(x1, y1) 为左上角，(x2, y2) 为右下角。
#[derive(Debug, Clone, Default, Copy, PartialEq)]
pub struct BoundingBox {
    /// 左上角x坐标
    pub x1: f32,
    /// 左上角y坐标
    pub y1: f32,
    /// 右下角x坐标
    pub x2: f32,
    /// 右下角y坐标
    pub y2: f32,
}

impl BoundingBox {
    /// 创建一个新的边界框
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// 计算边界框的宽度
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    /// 计算边界框的高度
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// 检查边界框是否有效（宽度和高度都大于0）
    pub fn is_valid(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0
    }
}

/// 一次推理输出的单个检测结果
///
/// 对应模型输出的一行 `[xmin, ymin, xmax, ymax, score, classId]`，
/// 坐标位于预处理后的帧坐标系（见 [`FrameSize`]）。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Detection {
    /// 目标的边界框
    pub bbox: BoundingBox,
    /// 置信度
    pub score: f32,
    /// 类别ID
    pub class_id: usize,
}

impl Detection {
    /// 创建一个新的检测结果
    pub fn new(bbox: BoundingBox, score: f32, class_id: usize) -> Self {
        Self { bbox, score, class_id }
    }

    /// 从模型输出的一行六元组构造
    ///
    /// 类别ID以浮点数给出，负值按 0 处理。
    pub fn from_row(row: [f32; 6]) -> Self {
        let [xmin, ymin, xmax, ymax, score, class_id] = row;
        Self {
            bbox: BoundingBox::new(xmin, ymin, xmax, ymax),
            score,
            class_id: class_id.max(0.0).round() as usize,
        }
    }

    pub fn to_row(&self) -> [f32; 6] {
        [
            self.bbox.x1,
            self.bbox.y1,
            self.bbox.x2,
            self.bbox.y2,
            self.score,
            self.class_id as f32,
        ]
    }
}

/// 检测坐标所在的帧尺寸（像素）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<(u32, u32)> for FrameSize {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}
