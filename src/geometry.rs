//! 几何模块: 点与检测区域多边形
//!
//! 多边形包含判定使用射线法 (ray casting), 顶点与边上的点一律判为
//! 外部, 避免相邻区域在共享边界上同时命中同一个检测中心。

use crate::proto;

/// 顶点/边判定使用的浮点容差
const EPSILON: f64 = 1e-10;

/// 2D 坐标点
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn from_proto(p: &proto::Point) -> Self {
        Self { x: p.x, y: p.y }
    }

    pub fn to_proto(self) -> proto::Point {
        proto::Point {
            x: self.x,
            y: self.y,
        }
    }
}

/// 区域类型
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PolygonType {
    /// 未指定, 请求解码阶段会丢弃该类区域
    #[default]
    Unspecified,
    /// 包含区: 区域内的目标 (受类别列表约束) 会被保留
    Inclusion,
    /// 排除区: 区域内的目标一律丢弃
    Exclusion,
}

impl From<proto::PolygonType> for PolygonType {
    fn from(value: proto::PolygonType) -> Self {
        match value {
            proto::PolygonType::Unspecified => PolygonType::Unspecified,
            proto::PolygonType::Inclusion => PolygonType::Inclusion,
            proto::PolygonType::Exclusion => PolygonType::Exclusion,
        }
    }
}

impl From<PolygonType> for proto::PolygonType {
    fn from(value: PolygonType) -> Self {
        match value {
            PolygonType::Unspecified => proto::PolygonType::Unspecified,
            PolygonType::Inclusion => proto::PolygonType::Inclusion,
            PolygonType::Exclusion => proto::PolygonType::Exclusion,
        }
    }
}

impl PolygonType {
    /// 渲染标签使用的区域类型名称
    pub fn label(self) -> &'static str {
        match self {
            PolygonType::Unspecified => "UNSPECIFIED",
            PolygonType::Inclusion => "INCLUSION",
            PolygonType::Exclusion => "EXCLUSION",
        }
    }
}

/// 检测区域多边形
///
/// 顶点按存储顺序构成边, 末尾顶点到首顶点闭合。多边形不要求凸,
/// 也不要求简单 (self-intersecting 由射线法的奇偶规则处理)。
#[derive(Clone, Debug, Default)]
pub struct Polygon {
    vertices: Vec<Point>,
    kind: PolygonType,
    priority: i32,
    target_classes: Vec<i32>,
}

impl Polygon {
    pub fn new(
        vertices: Vec<Point>,
        kind: PolygonType,
        priority: i32,
        target_classes: Vec<i32>,
    ) -> Self {
        Self {
            vertices,
            kind,
            priority,
            target_classes,
        }
    }

    pub fn from_proto(p: &proto::Polygon) -> Self {
        let vertices = p.vertices.iter().map(Point::from_proto).collect();
        let kind = p.r#type().into();
        Self {
            vertices,
            kind,
            priority: p.priority,
            target_classes: p.target_classes.clone(),
        }
    }

    pub fn to_proto(&self) -> proto::Polygon {
        proto::Polygon {
            vertices: self.vertices.iter().map(|v| v.to_proto()).collect(),
            r#type: proto::PolygonType::from(self.kind) as i32,
            priority: self.priority,
            target_classes: self.target_classes.clone(),
        }
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn kind(&self) -> PolygonType {
        self.kind
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn target_classes(&self) -> &[i32] {
        &self.target_classes
    }

    /// 类别是否允许进入该区域。空列表表示不限类别。
    pub fn allows_class(&self, class_id: i32) -> bool {
        self.target_classes.is_empty() || self.target_classes.contains(&class_id)
    }

    /// 原地缩放每个顶点 (x 乘 sx, y 乘 sy)
    pub fn scale(&mut self, sx: f64, sy: f64) {
        for vertex in &mut self.vertices {
            vertex.x *= sx;
            vertex.y *= sy;
        }
    }

    /// 顶点集合的轴对齐包围盒 `(min_x, min_y, max_x, max_y)`
    pub fn bounding_box(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.vertices.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for v in &self.vertices[1..] {
            min_x = min_x.min(v.x);
            min_y = min_y.min(v.y);
            max_x = max_x.max(v.x);
            max_y = max_y.max(v.y);
        }
        Some((min_x, min_y, max_x, max_y))
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        self.contains(p.x, p.y)
    }

    /// 判定点是否严格位于多边形内部
    ///
    /// 顶点上和边上的点返回 false。少于 3 个顶点的多边形返回 false。
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }

        // 先检查是否正好落在顶点或边上
        for i in 0..n {
            let vi = self.vertices[i];
            if (x - vi.x).abs() < EPSILON && (y - vi.y).abs() < EPSILON {
                return false;
            }

            let vj = self.vertices[(i + 1) % n];
            if point_on_segment(x, y, vi.x, vi.y, vj.x, vj.y) {
                return false;
            }
        }

        // 射线法: 向 +x 方向发射水平射线, 统计穿越次数的奇偶性
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (xi, yi) = (self.vertices[i].x, self.vertices[i].y);
            let (xj, yj) = (self.vertices[j].x, self.vertices[j].y);

            if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
                inside = !inside;
            }
            j = i;
        }

        inside
    }
}

/// 点是否落在线段上 (包围盒粗检 + 叉积共线检查, 均带容差)
fn point_on_segment(px: f64, py: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> bool {
    let min_x = x1.min(x2);
    let max_x = x1.max(x2);
    let min_y = y1.min(y2);
    let max_y = y1.max(y2);

    if px < min_x - EPSILON || px > max_x + EPSILON || py < min_y - EPSILON || py > max_y + EPSILON
    {
        return false;
    }

    let cross = (x2 - x1) * (py - y1) - (y2 - y1) * (px - x1);
    cross.abs() < EPSILON
}
