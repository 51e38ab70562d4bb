//! 视频采集
//!
//! [`FrameSource`] 是采集设备的约定：打开时协商出原生分辨率，之后每次
//! `grab` 返回当前帧。[`Surface`] 是按采集缩放比例缩小后的绘制表面，
//! 推理使用的像素都从这里读取。

pub mod folder;
pub mod still;
pub mod surface;

pub use folder::FolderSource;
pub use still::StillSource;
pub use surface::Surface;

use image::DynamicImage;
use std::path::Path;

use crate::detect::FrameSize;
use crate::error::Result;

/// 视频帧来源
pub trait FrameSource: Send {
    /// 打开视频流，返回协商后的原生分辨率
    fn open(&mut self) -> Result<FrameSize>;

    /// 读取当前帧
    fn grab(&mut self) -> Result<DynamicImage>;
}

/// 根据路径选择帧来源：目录按图像序列循环播放，文件作为静止画面
pub fn open_source(path: &Path) -> Box<dyn FrameSource> {
    if path.is_dir() {
        Box::new(FolderSource::new(path))
    } else {
        Box::new(StillSource::new(path))
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn open(&mut self) -> Result<FrameSize> {
        (**self).open()
    }

    fn grab(&mut self) -> Result<DynamicImage> {
        (**self).grab()
    }
}
