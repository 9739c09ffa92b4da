// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! ONNX Runtime 推理后端

use anyhow::{ensure, Context, Result};
use ndarray::{Array, IxDyn};
use ort::session::{builder::GraphOptimizationLevel, Session};
use tracing::{debug, info};

use crate::models::Model;

/// ONNX Runtime 会话封装
///
/// 会话在进程启动时创建一次, 之后只读。`run` 需要 `&mut self`,
/// 多个请求线程共享同一个后端时由外层 `Mutex` 串行化调用。
pub struct OrtBackend {
    session: Session,
    input_name: String,
}

impl OrtBackend {
    /// 加载 ONNX 模型并准备推理会话
    pub fn load(model_path: &str) -> Result<Self> {
        info!("loading model from: {model_path}");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(model_path)
            .with_context(|| format!("failed to load ONNX model from {model_path}"))?;

        ensure!(!session.outputs.is_empty(), "loaded model has no outputs");
        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "images".to_string());

        info!(
            "model loaded: {} input(s), {} output(s)",
            session.inputs.len(),
            session.outputs.len()
        );
        for output in &session.outputs {
            info!("output layer: {}", output.name);
        }

        Ok(Self {
            session,
            input_name,
        })
    }
}

impl Model for OrtBackend {
    fn run(&mut self, input: Array<f32, IxDyn>) -> Result<Array<f32, IxDyn>> {
        let shape: Vec<usize> = input.shape().to_vec();
        let (data, _) = input.into_raw_vec_and_offset();
        let value = ort::value::Value::from_array((shape.as_slice(), data.into_boxed_slice()))?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => value])?;

        let (out_shape, out_data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: Vec<usize> = out_shape.iter().map(|&d| d as usize).collect();
        debug!("network output shape: {dims:?}");

        Ok(Array::from_shape_vec(IxDyn(&dims), out_data.to_vec())?)
    }
}
