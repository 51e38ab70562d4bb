use std::collections::VecDeque;

use crate::config::FPS_WINDOW_CAPACITY;

/// 固定窗口的帧率滑动平均
///
/// 窗口满后按先进先出淘汰最旧的样本，每次写入后重新计算均值。
#[derive(Debug, Clone)]
pub struct FpsWindow {
    samples: VecDeque<f64>,
    capacity: usize,
    mean: f64,
}

impl FpsWindow {
    pub fn new() -> Self {
        Self::with_capacity(FPS_WINDOW_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity: capacity.max(1),
            mean: 0.0,
        }
    }

    /// 写入一个瞬时帧率样本
    pub fn push(&mut self, sample: f64) {
        self.samples.push_back(sample);
        if self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
        self.mean = self.samples.iter().sum::<f64>() / self.samples.len() as f64;
    }

    /// 由两次完成推理之间的间隔（毫秒）换算帧率并写入
    ///
    /// 非正的间隔无法换算，直接忽略。
    pub fn push_interval_ms(&mut self, elapsed_ms: f64) {
        if elapsed_ms > 0.0 {
            self.push(1000.0 / elapsed_ms);
        }
    }

    /// 窗口内样本的算术平均，窗口为空时为 0
    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 按从旧到新的顺序遍历样本
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    /// 界面上显示的读数
    pub fn readout(&self) -> String {
        format!("Average FPS: {:.1}", self.mean)
    }
}

impl Default for FpsWindow {
    fn default() -> Self {
        Self::new()
    }
}
