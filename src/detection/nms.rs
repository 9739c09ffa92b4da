// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 类别感知的非极大值抑制
//!
//! 只在同类框之间做抑制: 给每个框的两个坐标都加上
//! `class_id * Δ` (Δ 取所有框 `max(x+w, y+h)` 的最大值加 1),
//! 不同类别被平移进互不相交的空间区块, 跨类 IoU 恒为 0。
//! 抑制完成后返回原始坐标的存活框。

use std::cmp::Ordering;

use tracing::debug;

use crate::detection::Detection;

/// 偏移后的浮点框, 仅在抑制过程内部使用
#[derive(Clone, Copy)]
struct OffsetBox {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

impl OffsetBox {
    fn iou(&self, other: &OffsetBox) -> f32 {
        let l = self.x1.max(other.x1);
        let t = self.y1.max(other.y1);
        let r = self.x2.min(other.x2);
        let b = self.y2.min(other.y2);

        let inter = (r - l).max(0.0) * (b - t).max(0.0);
        let area_a = (self.x2 - self.x1) * (self.y2 - self.y1);
        let area_b = (other.x2 - other.x1) * (other.y2 - other.y1);
        let union = area_a + area_b - inter;

        if union > 0.0 {
            inter / union
        } else {
            0.0
        }
    }
}

/// 对检测列表做类别感知 NMS
///
/// 先按 `score_thr` 过滤, 再按置信度降序贪心保留与已留框 IoU 低于
/// `iou_thr` 的框。同分框按输入顺序决胜 (稳定排序)。
pub fn non_max_suppression(
    detections: &[Detection],
    score_thr: f32,
    iou_thr: f32,
) -> Vec<Detection> {
    let candidates: Vec<usize> = (0..detections.len())
        .filter(|&i| detections[i].confidence() >= score_thr)
        .collect();

    if candidates.is_empty() {
        return Vec::new();
    }

    // 类别偏移步长: 保证平移后的不同类别互不重叠
    let max_coord = candidates
        .iter()
        .map(|&i| detections[i].right().max(detections[i].bottom()) as f32)
        .fold(0.0f32, f32::max);
    let step = max_coord + 1.0;

    let offset_boxes: Vec<OffsetBox> = candidates
        .iter()
        .map(|&i| {
            let det = &detections[i];
            let offset = det.class_id() as f32 * step;
            OffsetBox {
                x1: det.x() as f32 + offset,
                y1: det.y() as f32 + offset,
                x2: det.right() as f32 + offset,
                y2: det.bottom() as f32 + offset,
            }
        })
        .collect();

    // 稳定排序: 等分时保持输入顺序
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        detections[candidates[b]]
            .confidence()
            .partial_cmp(&detections[candidates[a]].confidence())
            .unwrap_or(Ordering::Equal)
    });

    let mut kept_boxes: Vec<OffsetBox> = Vec::new();
    let mut survivors = Vec::new();

    for &idx in &order {
        let candidate = offset_boxes[idx];
        let suppressed = kept_boxes.iter().any(|kept| candidate.iou(kept) >= iou_thr);
        if !suppressed {
            kept_boxes.push(candidate);
            survivors.push(detections[candidates[idx]].clone());
        }
    }

    debug!(
        "NMS reduced detections from {} to {}",
        detections.len(),
        survivors.len()
    );

    survivors
}
