//! 单请求处理流水线
//!
//! 阶段顺序固定: 区域校验 -> 帧解码 -> letterbox -> 张量构建 ->
//! 推理 -> 输出解析 -> NMS -> 逆 letterbox -> 区域过滤 -> 渲染。
//! 每个阶段返回 Result, 出错即短路; 状态码映射在 RPC 边界完成。

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::detection::{non_max_suppression, parse_output, Detection};
use crate::filter::ZoneFilter;
use crate::frame::{Frame, FrameError};
use crate::geometry::{Polygon, PolygonType};
use crate::letterbox::Letterbox;
use crate::models::{image_to_tensor, Model};
use crate::proto;
use crate::renderer::Renderer;

/// 流水线阶段错误
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no polygons provided in request")]
    NoZones,
    #[error("no valid polygons found")]
    NoValidZones,
    #[error("polygon at index {0} has fewer than 3 vertices")]
    TooFewVertices(usize),
    #[error("no frame provided in request")]
    MissingFrame,
    #[error(transparent)]
    BadFrame(#[from] FrameError),
    #[error("frame buffer is not a valid image")]
    BadFrameBuffer,
    #[error("inference failed: {0}")]
    Inference(String),
}

impl PipelineError {
    /// 错误是否由调用方输入引起 (区别于服务内部故障)
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            PipelineError::NoZones
                | PipelineError::NoValidZones
                | PipelineError::TooFewVertices(_)
                | PipelineError::MissingFrame
                | PipelineError::BadFrame(_)
                | PipelineError::BadFrameBuffer
        )
    }
}

/// 流水线参数 (进程启动时固定)
#[derive(Clone, Copy, Debug)]
pub struct PipelineSettings {
    /// 模型输入宽度
    pub model_w: u32,
    /// 模型输入高度
    pub model_h: u32,
    /// 解析与 NMS 共用的分数阈值
    pub thr: f32,
    /// NMS IoU 阈值
    pub nms: f32,
    /// 构建张量时交换 BGR->RGB
    pub swap_rb: bool,
    /// letterbox 填充灰度
    pub pad: u8,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            model_w: 640,
            model_h: 640,
            thr: 0.1,
            nms: 0.45,
            swap_rb: true,
            pad: 114,
        }
    }
}

/// 帧处理器
///
/// 推理算子是唯一的进程级共享状态, 用互斥锁串行化调用;
/// 其余阶段的数据都是请求内私有的。
#[derive(Clone)]
pub struct FrameProcessor {
    model: Arc<Mutex<Box<dyn Model>>>,
    renderer: Arc<Renderer>,
    settings: PipelineSettings,
}

impl FrameProcessor {
    pub fn new(
        model: Arc<Mutex<Box<dyn Model>>>,
        renderer: Arc<Renderer>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            model,
            renderer,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// 处理单个请求
    pub fn process(
        &self,
        request: &proto::ProcessFrameRequest,
    ) -> Result<proto::ProcessFrameResponse, PipelineError> {
        let zones = decode_zones(&request.polygons)?;

        let proto_frame = request.frame.as_ref().ok_or(PipelineError::MissingFrame)?;
        let frame = Frame::from_proto(proto_frame)?;
        let mut image = frame.to_image().ok_or(PipelineError::BadFrameBuffer)?;
        let (width, height) = image.dimensions();
        debug!("decoded frame {width}x{height}, {} zones", zones.len());

        let settings = &self.settings;
        let letterbox = Letterbox::new(width, height, settings.model_w, settings.model_h, settings.pad);
        let canvas = letterbox.apply(&image);
        let tensor = image_to_tensor(&canvas, settings.swap_rb);
        debug!("input tensor shape: {:?}", tensor.shape());

        let output = {
            let mut model = self
                .model
                .lock()
                .map_err(|_| PipelineError::Inference("model lock poisoned".to_string()))?;
            model
                .run(tensor)
                .map_err(|e| PipelineError::Inference(format!("{e:#}")))?
        };

        // 形状不符合约定时按空结果继续, 请求本身仍然成功
        let candidates = match parse_output(&output, settings.model_w, settings.model_h, settings.thr)
        {
            Ok(dets) => dets,
            Err(err) => {
                warn!("network output not parseable: {err}");
                Vec::new()
            }
        };

        let suppressed = non_max_suppression(&candidates, settings.thr, settings.nms);
        let restored: Vec<Detection> = suppressed
            .iter()
            .map(|det| letterbox.to_original(det))
            .collect();

        let kept = ZoneFilter::new(&zones).filter(&restored);

        self.renderer.render(&mut image, &zones, &kept);

        info!("processed frame successfully, found {} detections", kept.len());

        Ok(proto::ProcessFrameResponse {
            result: Some(Frame::from_image(&image, frame.elm_type()).to_proto()),
            success: true,
        })
    }
}

/// 解码并校验区域列表
///
/// Unspecified 类型的区域记告警后丢弃; 顶点不足 3 个的区域拒绝整个
/// 请求; 剩余区域按优先级降序稳定排序。
pub fn decode_zones(polygons: &[proto::Polygon]) -> Result<Vec<Polygon>, PipelineError> {
    if polygons.is_empty() {
        return Err(PipelineError::NoZones);
    }

    let mut zones = Vec::with_capacity(polygons.len());
    for (i, p) in polygons.iter().enumerate() {
        let zone = Polygon::from_proto(p);
        if zone.kind() == PolygonType::Unspecified {
            warn!("skipping polygon at index {i} with UNSPECIFIED type");
            continue;
        }
        if zone.vertices().len() < 3 {
            return Err(PipelineError::TooFewVertices(i));
        }
        zones.push(zone);
    }

    if zones.is_empty() {
        return Err(PipelineError::NoValidZones);
    }

    zones.sort_by(|a, b| b.priority().cmp(&a.priority()));
    Ok(zones)
}
