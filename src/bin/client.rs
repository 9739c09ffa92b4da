//! 演示客户端: 健康检查后发送一帧, 保存标注结果
//!
//! 默认附带一个覆盖整帧的包含区; 传 --exclude 时在画面中央再加一个
//! 高优先级排除区, 用来观察裁决效果。

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::info;

use sentinel_rs::frame::{swap_channels, Frame, ELM_TYPE_8UC3};
use sentinel_rs::proto;
use sentinel_rs::proto::detector_client::DetectorClient;

/// 演示客户端参数
#[derive(Parser, Debug)]
#[command(author, version, about = "检测服务演示客户端", long_about = None)]
struct Args {
    /// 服务地址 (host:port)
    #[arg(short, long, default_value = "127.0.0.1:50051")]
    address: String,

    /// 输入图片路径
    #[arg(short, long)]
    input: String,

    /// 标注结果输出路径
    #[arg(short, long, default_value = "output.png")]
    output: String,

    /// 请求级置信度阈值 (仅记录, 过滤在服务端完成)
    #[arg(short, long, default_value_t = 0.5)]
    confidence: f32,

    /// 在画面中央附加一个高优先级排除区
    #[arg(long)]
    exclude: bool,

    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(level))
        .init();

    let endpoint = format!("http://{}", args.address);
    let mut client = DetectorClient::connect(endpoint.clone())
        .await
        .with_context(|| format!("failed to connect to {endpoint}"))?;

    client
        .check_health(proto::Empty {})
        .await
        .context("health check failed")?;
    info!("health check passed");

    // 读图并转成帧的原生通道顺序 (BGR)
    let mut image = image::open(&args.input)
        .with_context(|| format!("failed to load image from: {}", args.input))?
        .to_rgb8();
    let (width, height) = image.dimensions();
    info!("loaded image: {} ({width}x{height})", args.input);
    info!("requested minimum confidence: {}", args.confidence);
    swap_channels(&mut image);

    let mut polygons = vec![rect_polygon(
        0.0,
        0.0,
        width as f64,
        height as f64,
        proto::PolygonType::Inclusion,
        1,
    )];
    if args.exclude {
        let (w, h) = (width as f64, height as f64);
        polygons.push(rect_polygon(
            w / 4.0,
            h / 4.0,
            w * 3.0 / 4.0,
            h * 3.0 / 4.0,
            proto::PolygonType::Exclusion,
            10,
        ));
    }

    let request = proto::ProcessFrameRequest {
        frame: Some(Frame::from_image(&image, ELM_TYPE_8UC3).to_proto()),
        polygons,
    };

    let response = client
        .process_frame(request)
        .await
        .context("process frame failed")?
        .into_inner();
    if !response.success {
        return Err(anyhow!("server reported failure"));
    }

    let result = response
        .result
        .ok_or_else(|| anyhow!("response contains no frame"))?;
    let mut annotated = Frame::from_proto(&result)
        .context("invalid frame in response")?
        .to_image()
        .ok_or_else(|| anyhow!("response frame is not a valid image"))?;
    swap_channels(&mut annotated);
    annotated
        .save(&args.output)
        .with_context(|| format!("failed to save result to {}", args.output))?;

    info!("annotated frame written to {}", args.output);
    Ok(())
}

fn rect_polygon(
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    kind: proto::PolygonType,
    priority: i32,
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
        target_classes: vec![],
    }
}
