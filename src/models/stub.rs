// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 固定输出的桩模型
//!
//! 重放预置的输出张量, 不做任何真实推理。集成测试用它驱动完整的
//! 请求流水线, 不依赖模型文件。

use anyhow::Result;
use ndarray::{Array, IxDyn};

use crate::models::Model;

/// 构造桩输出用的候选框描述 (坐标为 letterbox 画布下的归一化值)
#[derive(Clone, Copy, Debug)]
pub struct StubAnchor {
    pub cx: f32,
    pub cy: f32,
    pub w: f32,
    pub h: f32,
    pub obj: f32,
    pub class_id: usize,
    pub class_prob: f32,
}

/// 重放固定张量的推理算子
pub struct StubModel {
    output: Array<f32, IxDyn>,
}

impl StubModel {
    pub fn new(output: Array<f32, IxDyn>) -> Self {
        Self { output }
    }

    /// 由候选框列表构造 `[1, N, 5 + num_classes]` 输出张量
    pub fn from_anchors(num_classes: usize, anchors: &[StubAnchor]) -> Self {
        let stride = 5 + num_classes;
        let mut output = Array::zeros((1, anchors.len(), stride)).into_dyn();

        for (i, anchor) in anchors.iter().enumerate() {
            output[[0, i, 0]] = anchor.cx;
            output[[0, i, 1]] = anchor.cy;
            output[[0, i, 2]] = anchor.w;
            output[[0, i, 3]] = anchor.h;
            output[[0, i, 4]] = anchor.obj;
            if anchor.class_id < num_classes {
                output[[0, i, 5 + anchor.class_id]] = anchor.class_prob;
            }
        }

        Self { output }
    }

    /// 没有任何候选框的空输出
    pub fn empty(num_classes: usize) -> Self {
        Self {
            output: Array::zeros((1, 0, 5 + num_classes)).into_dyn(),
        }
    }
}

impl Model for StubModel {
    fn run(&mut self, _input: Array<f32, IxDyn>) -> Result<Array<f32, IxDyn>> {
        Ok(self.output.clone())
    }
}
