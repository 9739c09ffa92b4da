//! 检测服务入口

use std::net::ToSocketAddrs;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::info;

use sentinel_rs::models::{Model, OrtBackend};
use sentinel_rs::renderer::Renderer;
use sentinel_rs::server::{serve, DetectorService};
use sentinel_rs::Args;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    args.validate()?;

    init_logging(args.verbose);

    let (model_w, model_h) = args.input_size();
    info!("🚀 哨兵检测服务启动");
    info!("📦 检测模型: {}", args.model);
    info!("📐 模型输入: {model_w}x{model_h}");
    info!("🔌 监听地址: {}", args.address);

    let backend = OrtBackend::load(&args.model).context("failed to initialize model")?;
    let model: Arc<Mutex<Box<dyn Model>>> = Arc::new(Mutex::new(Box::new(backend)));
    let renderer = Arc::new(Renderer::with_font_file(&args.font));

    let service = DetectorService::new(model, renderer, args.pipeline_settings());

    let addr = args
        .address
        .to_socket_addrs()
        .with_context(|| format!("invalid listen address: {}", args.address))?
        .next()
        .ok_or_else(|| anyhow!("listen address resolved to nothing: {}", args.address))?;

    serve(addr, service).await
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();
}
