//! 区域过滤: 按优先级裁决检测结果的去留
//!
//! 每个检测用其中心点做多边形包含判定。规则是包含式白名单:
//! 不落在任何区域内的检测一律丢弃, 落在多个区域内时由优先级最高
//! 的区域单独裁决 (排除区丢弃, 包含区按目标类别列表放行)。

use tracing::debug;

use crate::detection::Detection;
use crate::geometry::{Polygon, PolygonType};

/// 单次请求的区域过滤器
///
/// 借用已按优先级降序排好的区域切片, 不持有区域副本。
pub struct ZoneFilter<'a> {
    zones: &'a [Polygon],
}

impl<'a> ZoneFilter<'a> {
    /// `zones` 必须已按优先级降序排序 (稳定序)
    pub fn new(zones: &'a [Polygon]) -> Self {
        Self { zones }
    }

    /// 过滤检测列表, 返回存活的检测
    pub fn filter(&self, detections: &[Detection]) -> Vec<Detection> {
        let mut kept = Vec::new();

        for detection in detections {
            let (cx, cy) = detection.center();
            let containing = self.containing_zones(cx, cy);

            if containing.is_empty() {
                continue;
            }

            if Self::should_include(detection, &containing) {
                kept.push(detection.clone());
            }
        }

        debug!(
            "zone filter kept {} of {} detections",
            kept.len(),
            detections.len()
        );
        kept
    }

    /// 收集包含该点的区域, 按优先级降序 (同priority 保持输入顺序)
    fn containing_zones(&self, cx: f64, cy: f64) -> Vec<&'a Polygon> {
        let mut containing: Vec<&Polygon> = self
            .zones
            .iter()
            .filter(|zone| zone.contains(cx, cy))
            .collect();

        containing.sort_by(|a, b| b.priority().cmp(&a.priority()));
        containing
    }

    /// 最高优先级区域单独裁决
    fn should_include(detection: &Detection, containing: &[&Polygon]) -> bool {
        let Some(authority) = containing.first() else {
            return false;
        };

        match authority.kind() {
            PolygonType::Exclusion => false,
            PolygonType::Inclusion => authority.allows_class(detection.class_id()),
            PolygonType::Unspecified => false,
        }
    }
}
