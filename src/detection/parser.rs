// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 网络输出解析: 原始张量 -> 候选检测框
//!
//! 接受 `[N, K]`, `[B, N, K]`, `[B, 1, N, K]` 三种形状并统一成
//! `(N, K)` 逐 anchor 解码, 布局为 `[cx, cy, w, h, obj, p_0 .. p_{C-1}]`。

use ndarray::{Array, Axis, Ix2, IxDyn};
use thiserror::Error;
use tracing::debug;

use crate::detection::Detection;

/// 输出张量形状不符合约定
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutputShapeError {
    #[error("unsupported output tensor rank: {0} (supported: 2, 3, 4)")]
    UnsupportedRank(usize),
    #[error("invalid detection stride: {0} (expected at least 5)")]
    StrideTooSmall(usize),
}

/// 解析网络输出
///
/// anchor 的 bbox 为 letterbox 画布下的归一化坐标, 解码后转换成
/// 画布像素坐标的左上角形式并夹取到画布内。低于阈值的 anchor 与
/// 无类别分量的 anchor 被跳过。空张量返回空列表。
pub fn parse_output(
    output: &Array<f32, IxDyn>,
    model_w: u32,
    model_h: u32,
    thr: f32,
) -> Result<Vec<Detection>, OutputShapeError> {
    let mut detections = Vec::new();

    if output.is_empty() {
        debug!("empty network output");
        return Ok(detections);
    }

    let ndim = output.ndim();
    let preds = match ndim {
        2 => output.view().into_dimensionality::<Ix2>(),
        3 => output.index_axis(Axis(0), 0).into_dimensionality::<Ix2>(),
        4 => output
            .view()
            .index_axis_move(Axis(0), 0)
            .index_axis_move(Axis(0), 0)
            .into_dimensionality::<Ix2>(),
        other => return Err(OutputShapeError::UnsupportedRank(other)),
    }
    .map_err(|_| OutputShapeError::UnsupportedRank(ndim))?;

    let stride = preds.ncols();
    if stride < 5 {
        return Err(OutputShapeError::StrideTooSmall(stride));
    }

    let model_w = model_w as f32;
    let model_h = model_h as f32;

    for row in preds.rows() {
        let obj = row[4];
        if obj < thr {
            continue;
        }

        // 类别分量取最大值
        let best = row
            .iter()
            .skip(5)
            .enumerate()
            .fold(None::<(usize, f32)>, |acc, (idx, &p)| match acc {
                Some((_, max)) if p <= max => acc,
                _ => Some((idx, p)),
            });
        let Some((class_id, class_prob)) = best else {
            continue;
        };

        let confidence = obj * class_prob;
        if confidence < thr {
            continue;
        }

        // 归一化中心形式 -> 画布像素左上角形式
        let cx = row[0] * model_w;
        let cy = row[1] * model_h;
        let mut w = row[2] * model_w;
        let mut h = row[3] * model_h;

        if w < 1.0 || h < 1.0 {
            debug!("degenerate anchor box: {w:.2}x{h:.2}");
        }

        let mut x = cx - w / 2.0;
        let mut y = cy - h / 2.0;

        x = x.min(model_w - w).max(0.0);
        y = y.min(model_h - h).max(0.0);
        w = w.min(model_w - x).max(1.0);
        h = h.min(model_h - y).max(1.0);

        detections.push(Detection::new(
            x as i32,
            y as i32,
            w as i32,
            h as i32,
            class_id as i32,
            confidence,
        ));
    }

    debug!("parsed {} candidate detections", detections.len());
    Ok(detections)
}
