/// 标注颜色（不透明 RGB）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#RRGGBB` 形式
    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// 固定调色板，类别ID对长度取模选色
pub const PALETTE: [Color; 20] = [
    Color::rgb(0xEF, 0x44, 0x44),
    Color::rgb(0x42, 0x99, 0xE1),
    Color::rgb(0x05, 0x96, 0x69),
    Color::rgb(0xFB, 0xBF, 0x24),
    Color::rgb(0x4B, 0x52, 0xB1),
    Color::rgb(0x7B, 0x3A, 0xC2),
    Color::rgb(0xED, 0x50, 0x7A),
    Color::rgb(0x1D, 0xD1, 0xA1),
    Color::rgb(0xF3, 0x87, 0x3A),
    Color::rgb(0x4B, 0x55, 0x63),
    Color::rgb(0xDC, 0x26, 0x26),
    Color::rgb(0x18, 0x52, 0xB4),
    Color::rgb(0x18, 0xA3, 0x5D),
    Color::rgb(0xF5, 0x9E, 0x0B),
    Color::rgb(0x40, 0x59, 0xBE),
    Color::rgb(0x60, 0x27, 0xA5),
    Color::rgb(0xD6, 0x3D, 0x60),
    Color::rgb(0x00, 0xAC, 0x9B),
    Color::rgb(0xE6, 0x4A, 0x19),
    Color::rgb(0x27, 0x2A, 0x34),
];

pub fn color_for(class_id: usize) -> Color {
    PALETTE[class_id % PALETTE.len()]
}
