use ndarray::Array4;
use ort::{inputs, session::Session, value::Tensor};

use crate::error::{Error, Result};

/// 运行模型推理
///
/// 使用ONNX模型对输入张量进行推理，返回每个检测框的六元组。
///
/// # 参数
/// * `model` - ONNX模型Session
/// * `input_name` - 模型输入节点名称
/// * `input` - 输入张量，形状应为(1, 3, height, width)
///
/// # 返回值
/// 返回 `[xmin, ymin, xmax, ymax, score, classId]` 列表
pub fn run_inference(
    model: &mut Session,
    input_name: &str,
    input: &Array4<f32>,
) -> Result<Vec<[f32; 6]>> {
    let shape: Vec<usize> = input.shape().to_vec();
    let (data, _offset) = input.clone().into_raw_vec_and_offset();
    let input_tensor = Tensor::from_array(([shape[0], shape[1], shape[2], shape[3]], data))?;
    let outputs = model.run(inputs![input_name => input_tensor])?;

    let (output_shape, output_data) = outputs[0].try_extract_tensor::<f32>()?;
    let dims: Vec<i64> = output_shape.iter().copied().collect();
    rows_from_output(&dims, output_data)
}

/// 把扁平的输出数据切分为检测六元组
///
/// 支持 `[1, N, P]` 和 `[N, P]` 两种形状，`P` 至少为 6，多余的列被忽略。
pub fn rows_from_output(shape: &[i64], data: &[f32]) -> Result<Vec<[f32; 6]>> {
    let (num_boxes, num_params) = match *shape {
        [1, n, p] | [n, p] if n >= 0 && p >= 6 => (n as usize, p as usize),
        _ => return Err(Error::OutputShape(shape.to_vec())),
    };
    if data.len() < num_boxes * num_params {
        return Err(Error::OutputShape(shape.to_vec()));
    }

    let rows = data
        .chunks_exact(num_params)
        .take(num_boxes)
        .map(|row| [row[0], row[1], row[2], row[3], row[4], row[5]])
        .collect();
    Ok(rows)
}
