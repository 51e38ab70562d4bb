use image::{DynamicImage, GenericImageView};
use std::path::{Path, PathBuf};

use crate::capture::FrameSource;
use crate::capture::still::load_image;
use crate::detect::FrameSize;
use crate::error::{Error, Result};

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "webp"];

/// 图像序列：按文件名排序后循环播放目录中的图像
///
/// 原生分辨率取第一帧的尺寸；尺寸不同的后续帧在绘制到表面时会被缩放。
pub struct FolderSource {
    dir: PathBuf,
    frames: Vec<PathBuf>,
    next: usize,
}

impl FolderSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            frames: Vec::new(),
            next: 0,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn source_error(&self, reason: impl Into<String>) -> Error {
        Error::Source {
            path: self.dir.clone(),
            reason: reason.into(),
        }
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

impl FrameSource for FolderSource {
    fn open(&mut self) -> Result<FrameSize> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| self.source_error(e.to_string()))?;
        let mut frames = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| self.source_error(e.to_string()))?.path();
            if path.is_file() && is_image(&path) {
                frames.push(path);
            }
        }
        frames.sort();
        if frames.is_empty() {
            return Err(self.source_error("no images found"));
        }

        let (width, height) = load_image(&frames[0])?.dimensions();
        log::debug!("{} frames in {}", frames.len(), self.dir.display());
        self.frames = frames;
        self.next = 0;
        Ok(FrameSize::new(width, height))
    }

    fn grab(&mut self) -> Result<DynamicImage> {
        if self.frames.is_empty() {
            return Err(self.source_error("stream is not open"));
        }
        let path = &self.frames[self.next];
        self.next = (self.next + 1) % self.frames.len();
        load_image(path)
    }
}
