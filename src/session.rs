use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::controls::Parameters;
use crate::detect::{Detection, FrameSize, LabelTable};
use crate::overlay::Overlay;
use crate::utils::fps::FpsWindow;

/// 一次会话内的共享状态
///
/// 捕获循环和正在进行的推理任务都会访问它，生命周期与会话相同。
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub params: Parameters,
    pub overlay: Overlay,
    pub fps: FpsWindow,
    /// 上一次推理完成的时间
    pub previous: Option<Instant>,
    pub completed: u64,
    pub dropped: u64,
    pub failures: u64,
}

/// 一批结果的处理摘要
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchReport {
    pub batch: u64,
    pub detections: usize,
    pub rendered: usize,
    pub mean_fps: f64,
}

impl SessionState {
    pub fn new(params: Parameters) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// 处理一次完成的推理
    ///
    /// 先清空旧标注再渲染新的一批（使用此刻的阈值），然后用距上次完成的
    /// 间隔更新帧率窗口。
    pub fn complete_batch(
        &mut self,
        detections: &[Detection],
        frame: FrameSize,
        labels: &LabelTable,
        now: Instant,
    ) -> BatchReport {
        let rendered = self
            .overlay
            .render_batch(detections, frame, self.params.threshold, labels);

        if let Some(previous) = self.previous {
            let elapsed_ms = now.saturating_duration_since(previous).as_secs_f64() * 1000.0;
            self.fps.push_interval_ms(elapsed_ms);
        }
        self.previous = Some(now);
        self.completed += 1;

        BatchReport {
            batch: self.overlay.batch(),
            detections: detections.len(),
            rendered,
            mean_fps: self.fps.mean(),
        }
    }
}

/// 在循环与推理任务之间共享的会话句柄
pub type SharedSession = Arc<Mutex<SessionState>>;

/// 获取会话锁；持锁方 panic 后状态仍然可用，继续使用
pub fn lock_session(session: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}
