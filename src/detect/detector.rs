use ort::session::Session;
use std::path::Path;
use std::time::Instant;

use crate::config::DEFAULT_INPUT_NAME;
use crate::detect::bounds::{Detection, FrameSize};
use crate::detect::infer::run_inference;
use crate::detect::labels::LabelTable;
use crate::detect::model::load_model;
use crate::detect::prevs::{image_to_tensor, resize_image, rgba_to_image, shortest_edge_size};
use crate::detect::service::{InferenceService, ModelInputs, ProcessorHandle, ProcessorOptions};
use crate::error::{Error, Result};

/// 基于 ONNX Runtime 的目标检测器
///
/// 模型需要输出已经过后处理（含NMS）的检测结果，
/// 每行为 `[xmin, ymin, xmax, ymax, score, classId]`。
///
/// # 示例
///
/// ```no_run
/// use std::path::Path;
/// use lookout::{InferenceService, OrtDetector};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let detector = OrtDetector::load(Path::new("models/gelan-c.onnx"), None, 128, 4)?;
/// detector.processor().set_shortest_edge(160);
/// # Ok(())
/// # }
/// ```
pub struct OrtDetector {
    /// ONNX模型会话
    model: Session,
    /// 模型输入节点名称
    input_name: String,
    /// 预处理参数，可被控制面板修改
    processor: ProcessorHandle,
    labels: LabelTable,
}

impl OrtDetector {
    pub fn new(model: Session, labels: LabelTable, shortest_edge: u32) -> Self {
        Self {
            model,
            input_name: DEFAULT_INPUT_NAME.to_string(),
            processor: ProcessorHandle::new(ProcessorOptions { shortest_edge }),
            labels,
        }
    }

    /// 设置模型输入节点名称
    pub fn with_input_name(mut self, input_name: impl Into<String>) -> Self {
        self.input_name = input_name.into();
        self
    }

    /// 加载模型和标签表
    ///
    /// 未指定标签文件时读取模型同目录下的 `config.json`。
    pub fn load(
        model_path: &Path,
        labels_path: Option<&Path>,
        shortest_edge: u32,
        intra_threads: usize,
    ) -> Result<Self> {
        let labels_path = labels_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| model_path.with_file_name("config.json"));
        let labels = LabelTable::load(&labels_path)?;

        let started = Instant::now();
        let model = load_model(model_path, intra_threads)?;
        log::info!(
            "loaded model {} ({} labels) in {:?}",
            model_path.display(),
            labels.len(),
            started.elapsed()
        );
        Ok(Self::new(model, labels, shortest_edge))
    }
}

impl InferenceService for OrtDetector {
    fn processor(&self) -> ProcessorHandle {
        self.processor.clone()
    }

    fn preprocess(&self, rgba: &[u8], width: u32, height: u32) -> Result<ModelInputs> {
        let image = rgba_to_image(rgba, width, height)?;
        let options = self.processor.get();
        let (target_width, target_height) = shortest_edge_size(width, height, options.shortest_edge);
        if target_width == 0 || target_height == 0 {
            return Err(Error::InvalidFrame {
                width,
                height,
                len: rgba.len(),
            });
        }

        let resized = resize_image(&image, target_width, target_height);
        let tensor = image_to_tensor(&resized, target_height as usize, target_width as usize);
        Ok(ModelInputs {
            tensor,
            reshaped_size: FrameSize::new(target_width, target_height),
        })
    }

    fn infer(&mut self, inputs: &ModelInputs) -> Result<Vec<Detection>> {
        let start_time = Instant::now();
        let rows = run_inference(&mut self.model, &self.input_name, &inputs.tensor)?;
        log::trace!(
            "inference on {}x{} took {:?}, {} rows",
            inputs.reshaped_size.width,
            inputs.reshaped_size.height,
            start_time.elapsed(),
            rows.len()
        );
        Ok(rows.into_iter().map(Detection::from_row).collect())
    }

    fn labels(&self) -> &LabelTable {
        &self.labels
    }
}
