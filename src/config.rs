//! 运行参数
//!
//! 默认值以常量形式给出；运行时配置按 文件 → 环境变量 → 命令行 的顺序叠加，
//! 最后统一校验。

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::controls::Parameters;

pub const FPS_WINDOW_CAPACITY: usize = 30;

// 推理输入尺寸（预处理阶段的最短边）
pub const DEFAULT_IMAGE_SIZE: u32 = 128;
pub const MIN_IMAGE_SIZE: u32 = 64;
pub const MAX_IMAGE_SIZE: u32 = 256;
pub const IMAGE_SIZE_STEP: u32 = 32;

// 置信度阈值
pub const DEFAULT_THRESHOLD: f32 = 0.25;
pub const MIN_THRESHOLD: f32 = 0.01;
pub const MAX_THRESHOLD: f32 = 1.0;
pub const THRESHOLD_STEP: f32 = 0.01;

// 采集缩放比例
pub const DEFAULT_CAPTURE_SCALE: f32 = 0.5;
pub const MIN_CAPTURE_SCALE: f32 = 0.0;
pub const MAX_CAPTURE_SCALE: f32 = 1.0;
pub const CAPTURE_SCALE_STEP: f32 = 0.01;

// 显示容器的最大尺寸
pub const CONTAINER_MAX_WIDTH: f32 = 720.0;
pub const CONTAINER_MAX_HEIGHT: f32 = 405.0;

pub const DEFAULT_REFRESH_HZ: u32 = 60;
pub const DEFAULT_INTRA_THREADS: usize = 4;
pub const DEFAULT_INPUT_NAME: &str = "images";
pub const DEFAULT_SNAPSHOT_EVERY: u64 = 30;

const CONFIG_ENV: &str = "LOOKOUT_CONFIG";

#[derive(Debug, Deserialize, Default)]
struct LookoutConfigFile {
    model: Option<ModelConfigFile>,
    source: Option<PathBuf>,
    refresh_hz: Option<u32>,
    inference_timeout_ms: Option<u64>,
    params: Option<ParamsConfigFile>,
    snapshots: Option<SnapshotConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelConfigFile {
    path: Option<PathBuf>,
    labels: Option<PathBuf>,
    input_name: Option<String>,
    intra_threads: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct ParamsConfigFile {
    image_size: Option<u32>,
    threshold: Option<f32>,
    capture_scale: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct SnapshotConfigFile {
    dir: Option<PathBuf>,
    every: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct LookoutConfig {
    pub model_path: Option<PathBuf>,
    /// 缺省时读取模型同目录下的 config.json
    pub labels_path: Option<PathBuf>,
    pub input_name: String,
    pub intra_threads: usize,
    pub source: Option<PathBuf>,
    pub refresh_hz: u32,
    pub inference_timeout: Option<Duration>,
    pub params: Parameters,
    pub snapshot_dir: Option<PathBuf>,
    pub snapshot_every: u64,
}

impl Default for LookoutConfig {
    fn default() -> Self {
        Self::from_file(LookoutConfigFile::default())
    }
}

impl LookoutConfig {
    /// 从 `path`（或 `LOOKOUT_CONFIG`）读取配置文件并叠加进程环境变量。
    ///
    /// 不做校验：命令行参数覆盖之后由调用方执行 [`LookoutConfig::validate`]。
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// 与 [`LookoutConfig::load`] 相同，但环境变量由 `env` 提供
    pub fn load_with<F>(path: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_path = path
            .map(Path::to_path_buf)
            .or_else(|| env(CONFIG_ENV).filter(|p| !p.trim().is_empty()).map(PathBuf::from));
        let file_cfg = match config_path.as_deref() {
            Some(path) => read_config_file(path)?,
            None => LookoutConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg);
        cfg.apply_env(env)?;
        Ok(cfg)
    }

    fn from_file(file: LookoutConfigFile) -> Self {
        let model = file.model.unwrap_or_default();
        let params = file.params.unwrap_or_default();
        let snapshots = file.snapshots.unwrap_or_default();
        Self {
            model_path: model.path,
            labels_path: model.labels,
            input_name: model
                .input_name
                .unwrap_or_else(|| DEFAULT_INPUT_NAME.to_string()),
            intra_threads: model.intra_threads.unwrap_or(DEFAULT_INTRA_THREADS),
            source: file.source,
            refresh_hz: file.refresh_hz.unwrap_or(DEFAULT_REFRESH_HZ),
            inference_timeout: file.inference_timeout_ms.map(Duration::from_millis),
            params: Parameters {
                image_size: params.image_size.unwrap_or(DEFAULT_IMAGE_SIZE),
                threshold: params.threshold.unwrap_or(DEFAULT_THRESHOLD),
                capture_scale: params.capture_scale.unwrap_or(DEFAULT_CAPTURE_SCALE),
            },
            snapshot_dir: snapshots.dir,
            snapshot_every: snapshots.every.unwrap_or(DEFAULT_SNAPSHOT_EVERY),
        }
    }

    fn apply_env<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        if let Some(path) = var("LOOKOUT_MODEL") {
            self.model_path = Some(PathBuf::from(path));
        }
        if let Some(path) = var("LOOKOUT_LABELS") {
            self.labels_path = Some(PathBuf::from(path));
        }
        if let Some(path) = var("LOOKOUT_SOURCE") {
            self.source = Some(PathBuf::from(path));
        }
        if let Some(value) = var("LOOKOUT_THRESHOLD") {
            self.params.threshold = value
                .trim()
                .parse()
                .map_err(|_| anyhow!("LOOKOUT_THRESHOLD must be a number"))?;
        }
        if let Some(value) = var("LOOKOUT_IMAGE_SIZE") {
            self.params.image_size = value
                .trim()
                .parse()
                .map_err(|_| anyhow!("LOOKOUT_IMAGE_SIZE must be an integer"))?;
        }
        if let Some(value) = var("LOOKOUT_SCALE") {
            self.params.capture_scale = value
                .trim()
                .parse()
                .map_err(|_| anyhow!("LOOKOUT_SCALE must be a number"))?;
        }
        if let Some(value) = var("LOOKOUT_REFRESH_HZ") {
            self.refresh_hz = value
                .trim()
                .parse()
                .map_err(|_| anyhow!("LOOKOUT_REFRESH_HZ must be an integer"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let params = &self.params;
        if !(MIN_IMAGE_SIZE..=MAX_IMAGE_SIZE).contains(&params.image_size) {
            return Err(anyhow!(
                "image size {} outside [{}, {}]",
                params.image_size,
                MIN_IMAGE_SIZE,
                MAX_IMAGE_SIZE
            ));
        }
        if !(MIN_THRESHOLD..=MAX_THRESHOLD).contains(&params.threshold) {
            return Err(anyhow!(
                "threshold {} outside [{}, {}]",
                params.threshold,
                MIN_THRESHOLD,
                MAX_THRESHOLD
            ));
        }
        if !(MIN_CAPTURE_SCALE..=MAX_CAPTURE_SCALE).contains(&params.capture_scale) {
            return Err(anyhow!(
                "capture scale {} outside [{}, {}]",
                params.capture_scale,
                MIN_CAPTURE_SCALE,
                MAX_CAPTURE_SCALE
            ));
        }
        if self.refresh_hz == 0 {
            return Err(anyhow!("refresh rate must be greater than zero"));
        }
        if self.intra_threads == 0 {
            return Err(anyhow!("intra-op thread count must be greater than zero"));
        }
        if self.snapshot_every == 0 {
            return Err(anyhow!("snapshot interval must be greater than zero"));
        }
        if self.model_path.is_none() {
            return Err(anyhow!("model path is not configured (--model or LOOKOUT_MODEL)"));
        }
        if self.source.is_none() {
            return Err(anyhow!("frame source is not configured (--source or LOOKOUT_SOURCE)"));
        }
        Ok(())
    }

    /// 标签文件路径：显式配置优先，否则为模型目录下的 config.json
    pub fn resolved_labels_path(&self) -> Option<PathBuf> {
        self.labels_path.clone().or_else(|| {
            self.model_path
                .as_ref()
                .map(|model| model.with_file_name("config.json"))
        })
    }
}

fn read_config_file(path: &Path) -> Result<LookoutConfigFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("failed to parse config {}", path.display()))
}
