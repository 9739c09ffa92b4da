//! 端到端请求测试: 用桩模型驱动完整的 gRPC 服务处理路径

use std::sync::{Arc, Mutex};

use image::{Rgb, RgbImage};
use tonic::{Code, Request};

use sentinel_rs::frame::{Frame, ELM_TYPE_8UC3};
use sentinel_rs::models::stub::{StubAnchor, StubModel};
use sentinel_rs::models::Model;
use sentinel_rs::pipeline::PipelineSettings;
use sentinel_rs::proto;
use sentinel_rs::proto::detector_server::Detector;
use sentinel_rs::renderer::Renderer;
use sentinel_rs::server::DetectorService;
use sentinel_rs::{class_color, PolygonType};

const FRAME_W: u32 = 640;
const FRAME_H: u32 = 480;

fn service(model: StubModel) -> DetectorService {
    let model: Arc<Mutex<Box<dyn Model>>> = Arc::new(Mutex::new(Box::new(model)));
    DetectorService::new(
        model,
        Arc::new(Renderer::new(None)),
        PipelineSettings::default(),
    )
}

fn gray_frame() -> proto::Frame {
    let img = RgbImage::from_pixel(FRAME_W, FRAME_H, Rgb([40, 40, 40]));
    Frame::from_image(&img, ELM_TYPE_8UC3).to_proto()
}

fn rect_zone(
    kind: proto::PolygonType,
    priority: i32,
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    classes: Vec<i32>,
) -> proto::Polygon {
    proto::Polygon {
        vertices: vec![
            proto::Point { x: x0, y: y0 },
            proto::Point { x: x1, y: y0 },
            proto::Point { x: x1, y: y1 },
            proto::Point { x: x0, y: y1 },
        ],
        r#type: kind as i32,
        priority,
        target_classes: classes,
    }
}

fn full_frame_zone(kind: proto::PolygonType, priority: i32, classes: Vec<i32>) -> proto::Polygon {
    rect_zone(
        kind,
        priority,
        0.0,
        0.0,
        FRAME_W as f64,
        FRAME_H as f64,
        classes,
    )
}

/// 在原图 (x, y, w, h) 处放一个候选框 (640x480 帧, letterbox 到 640x640)
fn anchor_at(x: f64, y: f64, w: f64, h: f64, class_id: usize, obj: f32) -> StubAnchor {
    // scale = 1.0, dy = 80
    StubAnchor {
        cx: ((x + w / 2.0) / 640.0) as f32,
        cy: ((y + h / 2.0 + 80.0) / 640.0) as f32,
        w: (w / 640.0) as f32,
        h: (h / 640.0) as f32,
        obj,
        class_id,
        class_prob: 1.0,
    }
}

fn contains_color(frame: &proto::Frame, color: (u8, u8, u8)) -> bool {
    let img = Frame::from_proto(frame)
        .expect("valid response frame")
        .to_image()
        .expect("decodable response frame");
    img.pixels().any(|p| p.0 == [color.0, color.1, color.2])
}

#[tokio::test]
async fn health_check_returns_ok() {
    let svc = service(StubModel::empty(80));
    let response = svc.check_health(Request::new(proto::Empty {})).await;
    assert!(response.is_ok());
}

#[tokio::test]
async fn inclusion_zone_keeps_detection() {
    let stub = StubModel::from_anchors(80, &[anchor_at(100.0, 100.0, 50.0, 50.0, 0, 0.9)]);
    let svc = service(stub);

    let request = proto::ProcessFrameRequest {
        frame: Some(gray_frame()),
        polygons: vec![full_frame_zone(proto::PolygonType::Inclusion, 1, vec![])],
    };

    let response = svc
        .process_frame(Request::new(request))
        .await
        .expect("request should succeed")
        .into_inner();

    assert!(response.success);
    let result = response.result.expect("annotated frame");
    assert_eq!(result.rows, FRAME_H as i32);
    assert_eq!(result.cols, FRAME_W as i32);
    assert!(contains_color(&result, class_color(0)));
}

#[tokio::test]
async fn exclusion_zone_drops_detection() {
    let stub = StubModel::from_anchors(80, &[anchor_at(300.0, 200.0, 40.0, 40.0, 5, 0.9)]);
    let svc = service(stub);

    let request = proto::ProcessFrameRequest {
        frame: Some(gray_frame()),
        polygons: vec![full_frame_zone(proto::PolygonType::Exclusion, 1, vec![])],
    };

    let response = svc
        .process_frame(Request::new(request))
        .await
        .expect("request should succeed")
        .into_inner();

    assert!(response.success);
    let result = response.result.expect("annotated frame");
    assert!(!contains_color(&result, class_color(5)));
}

#[tokio::test]
async fn priority_adjudication_end_to_end() {
    // 包含区 (pri 5, 类别 {1}) + 排除区 (pri 3): 类别 1 检测保留
    let stub = StubModel::from_anchors(80, &[anchor_at(200.0, 200.0, 60.0, 60.0, 1, 0.9)]);
    let svc = service(stub);
    let request = proto::ProcessFrameRequest {
        frame: Some(gray_frame()),
        polygons: vec![
            full_frame_zone(proto::PolygonType::Inclusion, 5, vec![1]),
            full_frame_zone(proto::PolygonType::Exclusion, 3, vec![]),
        ],
    };
    let result = svc
        .process_frame(Request::new(request))
        .await
        .expect("request should succeed")
        .into_inner()
        .result
        .expect("annotated frame");
    assert!(contains_color(&result, class_color(1)));

    // 排除区优先级提到 7: 同一检测被丢弃
    let stub = StubModel::from_anchors(80, &[anchor_at(200.0, 200.0, 60.0, 60.0, 1, 0.9)]);
    let svc = service(stub);
    let request = proto::ProcessFrameRequest {
        frame: Some(gray_frame()),
        polygons: vec![
            full_frame_zone(proto::PolygonType::Inclusion, 5, vec![1]),
            full_frame_zone(proto::PolygonType::Exclusion, 7, vec![]),
        ],
    };
    let result = svc
        .process_frame(Request::new(request))
        .await
        .expect("request should succeed")
        .into_inner()
        .result
        .expect("annotated frame");
    assert!(!contains_color(&result, class_color(1)));
}

#[tokio::test]
async fn empty_zone_list_is_invalid_argument() {
    let svc = service(StubModel::empty(80));
    let request = proto::ProcessFrameRequest {
        frame: Some(gray_frame()),
        polygons: vec![],
    };

    let status = svc
        .process_frame(Request::new(request))
        .await
        .expect_err("request must be rejected");
    assert_eq!(status.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn unspecified_zones_are_invalid_argument() {
    let svc = service(StubModel::empty(80));
    let request = proto::ProcessFrameRequest {
        frame: Some(gray_frame()),
        polygons: vec![full_frame_zone(proto::PolygonType::Unspecified, 1, vec![])],
    };

    let status = svc
        .process_frame(Request::new(request))
        .await
        .expect_err("request must be rejected");
    assert_eq!(status.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn detection_outside_every_zone_is_dropped() {
    // 区域只盖左上角, 检测在右下
    let stub = StubModel::from_anchors(80, &[anchor_at(500.0, 400.0, 40.0, 40.0, 2, 0.9)]);
    let svc = service(stub);

    let request = proto::ProcessFrameRequest {
        frame: Some(gray_frame()),
        polygons: vec![rect_zone(
            proto::PolygonType::Inclusion,
            1,
            0.0,
            0.0,
            100.0,
            100.0,
            vec![],
        )],
    };

    let result = svc
        .process_frame(Request::new(request))
        .await
        .expect("request should succeed")
        .into_inner()
        .result
        .expect("annotated frame");
    assert!(!contains_color(&result, class_color(2)));
}

#[tokio::test]
async fn bad_frame_is_invalid_argument() {
    let svc = service(StubModel::empty(80));
    let mut frame = gray_frame();
    frame.data.pop();

    let request = proto::ProcessFrameRequest {
        frame: Some(frame),
        polygons: vec![full_frame_zone(proto::PolygonType::Inclusion, 1, vec![])],
    };

    let status = svc
        .process_frame(Request::new(request))
        .await
        .expect_err("request must be rejected");
    assert_eq!(status.code(), Code::InvalidArgument);
}

#[test]
fn polygon_type_round_trip() {
    for kind in [
        PolygonType::Unspecified,
        PolygonType::Inclusion,
        PolygonType::Exclusion,
    ] {
        let wire: proto::PolygonType = kind.into();
        let back: PolygonType = wire.into();
        assert_eq!(kind, back);
    }
}
