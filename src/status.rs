//! 模型状态与启动
//!
//! 模型在后台加载，状态依次为 Loading → Ready 或 Error。
//! 捕获循环只在第一次进入 Ready 时启动一次；Error 则永远不会启动。

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

use crate::detect::OrtDetector;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStatus {
    Loading,
    Ready,
    Error,
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelStatus::Loading => f.write_str("Loading model"),
            ModelStatus::Ready => f.write_str("Ready"),
            ModelStatus::Error => f.write_str("Error"),
        }
    }
}

/// 在模型首次就绪时启动捕获循环，且只启动一次
#[derive(Debug, Clone, Default)]
pub struct Supervisor {
    launched: Arc<AtomicBool>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_launched(&self) -> bool {
        self.launched.load(Ordering::Acquire)
    }

    /// 对一次状态变化作出反应，只有第一次 Ready 返回 true
    pub fn on_status(&self, status: ModelStatus) -> bool {
        status == ModelStatus::Ready
            && self
                .launched
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
    }

    /// 监听状态通道，第一次 Ready 时调用 `launch` 并返回其结果
    ///
    /// 状态为 Error、通道关闭或已经启动过时返回 [`Error::ModelUnavailable`]。
    pub async fn launch_when_ready<T, F>(
        &self,
        mut status: watch::Receiver<ModelStatus>,
        launch: F,
    ) -> Result<T>
    where
        F: FnOnce() -> T,
    {
        loop {
            let current = *status.borrow_and_update();
            log::debug!("model status: {current}");
            match current {
                ModelStatus::Error => return Err(Error::ModelUnavailable),
                ModelStatus::Ready if self.on_status(current) => return Ok(launch()),
                ModelStatus::Ready => return Err(Error::ModelUnavailable),
                ModelStatus::Loading => {}
            }
            if status.changed().await.is_err() {
                return Err(Error::ModelUnavailable);
            }
        }
    }
}

/// 后台加载模型并发布状态
///
/// 加载在阻塞线程上进行；失败时记录错误并把状态置为 Error。
pub async fn load_detector(
    model_path: PathBuf,
    labels_path: Option<PathBuf>,
    shortest_edge: u32,
    intra_threads: usize,
    status: watch::Sender<ModelStatus>,
) -> Option<OrtDetector> {
    status.send_replace(ModelStatus::Loading);
    let loaded = tokio::task::spawn_blocking(move || {
        OrtDetector::load(&model_path, labels_path.as_deref(), shortest_edge, intra_threads)
    })
    .await;

    match loaded {
        Ok(Ok(detector)) => {
            status.send_replace(ModelStatus::Ready);
            Some(detector)
        }
        Ok(Err(e)) => {
            log::error!("failed to load model: {e}");
            status.send_replace(ModelStatus::Error);
            None
        }
        Err(e) => {
            log::error!("model loader panicked: {e}");
            status.send_replace(ModelStatus::Error);
            None
        }
    }
}
