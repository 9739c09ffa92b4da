// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod config; // 命令行参数
pub mod detection; // 检测结果与后处理
pub mod filter; // 区域过滤
pub mod frame; // 帧缓冲
pub mod geometry; // 点与多边形
pub mod letterbox; // letterbox 变换
pub mod models; // 推理算子
pub mod pipeline; // 请求流水线
pub mod renderer; // 帧标注渲染
pub mod server; // gRPC 服务

/// gRPC 协议生成代码
pub mod proto {
    tonic::include_proto!("sentinel");
}

pub use crate::config::Args;
pub use crate::detection::{
    class_color, class_name, non_max_suppression, parse_output, Detection, OutputShapeError,
    COCO_CLASSES, PALETTE,
};
pub use crate::filter::ZoneFilter;
pub use crate::frame::{swap_channels, Frame, FrameError, ELM_TYPE_8UC3};
pub use crate::geometry::{Point, Polygon, PolygonType};
pub use crate::letterbox::Letterbox;
pub use crate::models::{image_to_tensor, input_size_for_model, Model, OrtBackend, StubModel};
pub use crate::pipeline::{decode_zones, FrameProcessor, PipelineError, PipelineSettings};
pub use crate::renderer::Renderer;
pub use crate::server::DetectorService;
