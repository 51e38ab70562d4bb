//! 目标检测模块
//!
//! 把 ONNX 检测模型封装成捕获循环使用的推理服务，包括：
//! - 模型与标签表加载
//! - 图像预处理（按最短边缩放、归一化为NCHW张量）
//! - 模型推理与输出解析
//!
//! 捕获循环只依赖 [`InferenceService`]，测试中可以用任意实现替换 [`OrtDetector`]。

pub mod bounds;
pub mod detector;
pub mod infer;
pub mod labels;
pub mod model;
pub mod prevs;
pub mod service;

// 重新导出常用类型和函数
pub use bounds::{BoundingBox, Detection, FrameSize};
pub use detector::OrtDetector;
pub use labels::LabelTable;
pub use model::load_model;
pub use service::{InferenceService, ModelInputs, ProcessorHandle, ProcessorOptions};
