use ndarray::Array4;
use std::sync::{Arc, PoisonError, RwLock};

use crate::detect::bounds::{Detection, FrameSize};
use crate::detect::labels::LabelTable;
use crate::error::Result;

/// 预处理阶段的参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorOptions {
    /// 缩放后图像最短边的长度
    pub shortest_edge: u32,
}

/// 预处理参数的共享句柄
///
/// 推理服务在每次预处理时读取；控制面板可以随时直接写入，不经过主循环。
#[derive(Debug, Clone)]
pub struct ProcessorHandle {
    options: Arc<RwLock<ProcessorOptions>>,
}

impl ProcessorHandle {
    pub fn new(options: ProcessorOptions) -> Self {
        Self {
            options: Arc::new(RwLock::new(options)),
        }
    }

    pub fn get(&self) -> ProcessorOptions {
        *self.options.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_shortest_edge(&self, shortest_edge: u32) {
        self.options
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .shortest_edge = shortest_edge;
    }
}

/// 预处理结果：模型输入张量及其对应的帧尺寸
#[derive(Debug, Clone)]
pub struct ModelInputs {
    pub tensor: Array4<f32>,
    /// 缩放后的 (宽, 高)，检测坐标以此为参照
    pub reshaped_size: FrameSize,
}

/// 推理服务的约定
///
/// 捕获循环只通过这个 trait 使用模型：读写预处理配置、预处理一帧、
/// 推理得到检测结果、查询类别名称。
pub trait InferenceService: Send + 'static {
    /// 预处理配置的共享句柄
    fn processor(&self) -> ProcessorHandle;

    /// 把 RGBA 像素转换为模型输入
    fn preprocess(&self, rgba: &[u8], width: u32, height: u32) -> Result<ModelInputs>;

    /// 对预处理结果执行推理
    fn infer(&mut self, inputs: &ModelInputs) -> Result<Vec<Detection>>;

    /// 模型提供的类别标签表
    fn labels(&self) -> &LabelTable;
}
