use ort::session::{Session, builder::GraphOptimizationLevel};
use std::path::Path;

/// 加载ONNX格式的检测模型
///
/// # 参数
/// * `model_path` - 模型文件路径
/// * `intra_threads` - 单个算子内部使用的线程数
///
/// # 错误处理
/// 如果模型加载失败会返回Err
pub fn load_model(model_path: &Path, intra_threads: usize) -> Result<Session, ort::Error> {
    let model = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(intra_threads)?
        .commit_from_file(model_path)?;
    Ok(model)
}
