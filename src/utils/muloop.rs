use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// 循环模式枚举
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoopMode {
    /// 按次数循环
    Count(usize),
    /// 按时间循环（毫秒）
    Duration(u64),
    /// 持续循环直到手动停止
    Continuous,
}

/// 循环预算：根据模式判断是否还允许下一次执行
#[derive(Debug, Clone)]
pub struct LoopBudget {
    mode: LoopMode,
    started: Instant,
    ticks: usize,
}

impl LoopBudget {
    pub fn new(mode: LoopMode) -> Self {
        Self {
            mode,
            started: Instant::now(),
            ticks: 0,
        }
    }

    /// 检查是否还可以继续循环
    pub fn allows_tick(&self) -> bool {
        match self.mode {
            LoopMode::Count(count) => self.ticks < count,
            LoopMode::Duration(duration_ms) => {
                self.started.elapsed() < Duration::from_millis(duration_ms)
            }
            LoopMode::Continuous => true,
        }
    }

    pub fn record_tick(&mut self) {
        self.ticks += 1;
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }
}

/// 跨任务共享的运行标志，用于从外部（例如 Ctrl-C）请求停止循环
#[derive(Debug, Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// 停止循环
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// 检查循环是否仍应运行
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Default for StopHandle {
    fn default() -> Self {
        Self::new()
    }
}
