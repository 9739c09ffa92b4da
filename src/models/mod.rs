// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 推理算子接口
//!
//! 流水线只依赖张量约定: 输入 `[1, 3, Hm, Wm]` f32 (NCHW, 像素已
//! 乘 1/255, 按配置做 BGR->RGB 交换), 输出按 anchor 布局
//! `[cx, cy, w, h, obj, p_0 .. p_{C-1}]` 由解析器解码。

use anyhow::Result;
use image::RgbImage;
use ndarray::{Array, IxDyn};

pub mod ort_backend;
pub mod stub;

pub use ort_backend::OrtBackend;
pub use stub::StubModel;

/// YOLO 系列模型的标准输入边长
const YOLO_INPUT_SIZE: u32 = 640;
/// 其余分类/检测模型的回退输入边长
const DEFAULT_INPUT_SIZE: u32 = 224;

/// 统一的推理算子接口
///
/// 实现者只做前向传播, 预处理与解码都在外部完成。`run` 取 `&mut self`,
/// 跨请求共享时由调用方用互斥锁串行化。
pub trait Model: Send {
    fn run(&mut self, input: Array<f32, IxDyn>) -> Result<Array<f32, IxDyn>>;
}

/// 从模型路径推断输入尺寸
///
/// 路径含 "yolo" 或 "YOLO" 时按 YOLO 标准取 640x640, 否则 224x224。
/// 显式给出的宽高优先于推断。
pub fn input_size_for_model(path: &str, width: Option<u32>, height: Option<u32>) -> (u32, u32) {
    if let (Some(w), Some(h)) = (width, height) {
        return (w, h);
    }

    if path.contains("yolo") || path.contains("YOLO") {
        (YOLO_INPUT_SIZE, YOLO_INPUT_SIZE)
    } else {
        (DEFAULT_INPUT_SIZE, DEFAULT_INPUT_SIZE)
    }
}

/// letterbox 画布 -> NCHW f32 张量
///
/// `swap_rb` 为 true 时在写入张量的同时交换第 1/3 通道。
pub fn image_to_tensor(canvas: &RgbImage, swap_rb: bool) -> Array<f32, IxDyn> {
    let (w, h) = canvas.dimensions();
    let mut tensor = Array::zeros((1, 3, h as usize, w as usize)).into_dyn();

    for (x, y, pixel) in canvas.enumerate_pixels() {
        let [c0, c1, c2] = pixel.0;
        let (r, g, b) = if swap_rb { (c2, c1, c0) } else { (c0, c1, c2) };
        let (x, y) = (x as usize, y as usize);
        tensor[[0, 0, y, x]] = r as f32 / 255.0;
        tensor[[0, 1, y, x]] = g as f32 / 255.0;
        tensor[[0, 2, y, x]] = b as f32 / 255.0;
    }

    tensor
}
