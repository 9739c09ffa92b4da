// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// 检测结果数据结构与全局常量表

/// 检测框 (整数像素坐标, 左上角 + 宽高)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Detection {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    class_id: i32,
    confidence: f32,
}

impl Detection {
    pub fn new(x: i32, y: i32, w: i32, h: i32, class_id: i32, confidence: f32) -> Self {
        Self {
            x,
            y,
            w,
            h,
            class_id,
            confidence,
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn w(&self) -> i32 {
        self.w
    }

    pub fn h(&self) -> i32 {
        self.h
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// 检测框中心 (浮点, 用于区域包含判定)
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.w as f64 / 2.0,
            self.y as f64 + self.h as f64 / 2.0,
        )
    }

    pub fn class_id(&self) -> i32 {
        self.class_id
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn area(&self) -> f32 {
        self.w as f32 * self.h as f32
    }

    pub fn intersection_area(&self, other: &Detection) -> f32 {
        let l = self.x.max(other.x) as f32;
        let r = self.right().min(other.right()) as f32;
        let t = self.y.max(other.y) as f32;
        let b = self.bottom().min(other.bottom()) as f32;
        (r - l).max(0.0) * (b - t).max(0.0)
    }

    pub fn union(&self, other: &Detection) -> f32 {
        self.area() + other.area() - self.intersection_area(other)
    }

    pub fn iou(&self, other: &Detection) -> f32 {
        let union = self.union(other);
        if union > 0.0 {
            self.intersection_area(other) / union
        } else {
            0.0
        }
    }
}

/// COCO 数据集类别名称 (80 类)
pub const COCO_CLASSES: [&str; 80] = [
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

/// 检测框绘制调色板, 按 class_id 取模循环使用
/// 三元组按帧原生通道顺序 (BGR) 存放
pub const PALETTE: [(u8, u8, u8); 10] = [
    (255, 0, 0),     // 蓝
    (0, 255, 0),     // 绿
    (0, 0, 255),     // 红
    (255, 255, 0),   // 青
    (255, 0, 255),   // 品红
    (0, 255, 255),   // 黄
    (128, 0, 128),   // 紫
    (255, 165, 0),   // 橙
    (255, 192, 203), // 粉
    (0, 128, 0),     // 深绿
];

/// 类别名称查表, 越界时回退到 "class_{id}"
pub fn class_name(class_id: i32) -> String {
    usize::try_from(class_id)
        .ok()
        .and_then(|idx| COCO_CLASSES.get(idx))
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("class_{class_id}"))
}

/// 按类别选取绘制颜色
pub fn class_color(class_id: i32) -> (u8, u8, u8) {
    let idx = class_id.rem_euclid(PALETTE.len() as i32) as usize;
    PALETTE[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center() {
        let det = Detection::new(100, 100, 50, 50, 0, 0.9);
        assert_eq!(det.center(), (125.0, 125.0));
        assert_eq!(det.right(), 150);
        assert_eq!(det.bottom(), 150);
    }

    #[test]
    fn test_iou_overlap() {
        let a = Detection::new(0, 0, 100, 100, 0, 0.9);
        let b = Detection::new(50, 50, 100, 100, 0, 0.8);
        let iou = a.iou(&b);
        // 交 2500, 并 17500
        assert!((iou - 2500.0 / 17500.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_disjoint() {
        let a = Detection::new(0, 0, 10, 10, 0, 0.9);
        let b = Detection::new(100, 100, 10, 10, 0, 0.8);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_class_name_fallback() {
        assert_eq!(class_name(0), "person");
        assert_eq!(class_name(79), "toothbrush");
        assert_eq!(class_name(80), "class_80");
        assert_eq!(class_name(-1), "class_-1");
    }

    #[test]
    fn test_class_color_cycles() {
        assert_eq!(class_color(0), PALETTE[0]);
        assert_eq!(class_color(10), PALETTE[0]);
        assert_eq!(class_color(13), PALETTE[3]);
    }
}
