use image::{DynamicImage, GenericImageView};
use std::path::{Path, PathBuf};

use crate::capture::FrameSource;
use crate::detect::FrameSize;
use crate::error::{Error, Result};

/// 静止画面：每次都返回同一张图像
pub struct StillSource {
    path: PathBuf,
    image: Option<DynamicImage>,
}

impl StillSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            image: None,
        }
    }

    /// 直接使用内存中的图像
    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            path: PathBuf::from("<memory>"),
            image: Some(image),
        }
    }
}

impl FrameSource for StillSource {
    fn open(&mut self) -> Result<FrameSize> {
        if self.image.is_none() {
            self.image = Some(load_image(&self.path)?);
        }
        let (width, height) = self
            .image
            .as_ref()
            .map(|image| image.dimensions())
            .unwrap_or_default();
        Ok(FrameSize::new(width, height))
    }

    fn grab(&mut self) -> Result<DynamicImage> {
        self.image.clone().ok_or_else(|| Error::Source {
            path: self.path.clone(),
            reason: "stream is not open".to_string(),
        })
    }
}

/// 加载图像文件
///
/// 文件不存在或无法解码时返回 [`Error::Source`]，信息中包含底层原因。
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    if !path.exists() {
        return Err(Error::Source {
            path: path.to_path_buf(),
            reason: "file does not exist".to_string(),
        });
    }
    image::open(path).map_err(|e| Error::Source {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
