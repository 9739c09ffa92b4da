// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 检测数据结构与后处理 (输出解析 + NMS)

pub mod nms;
pub mod parser;
pub mod types;

pub use nms::non_max_suppression;
pub use parser::{parse_output, OutputShapeError};
pub use types::{class_color, class_name, Detection, COCO_CLASSES, PALETTE};
