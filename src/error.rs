use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// 库内统一的错误类型
#[derive(Debug, Error)]
pub enum Error {
    #[error("onnx runtime error: {0}")]
    Ort(#[from] ort::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid model config: {0}")]
    Json(#[from] serde_json::Error),

    /// 模型输出张量的形状不是 [1, N, 6] 或 [N, 6]
    #[error("unexpected model output shape {0:?}")]
    OutputShape(Vec<i64>),

    #[error("invalid frame: {width}x{height} with {len} bytes")]
    InvalidFrame { width: u32, height: u32, len: usize },

    #[error("label table {path}: {reason}")]
    Labels { path: PathBuf, reason: String },

    #[error("frame source {path}: {reason}")]
    Source { path: PathBuf, reason: String },

    #[error("unknown control command: {0}")]
    UnknownControl(String),

    #[error("model failed to load")]
    ModelUnavailable,

    #[error("inference did not finish within {0:?}")]
    Timeout(Duration),

    #[error("inference task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, Error>;
