//! gRPC 服务实现
//!
//! RPC 端点是显式的 trait 实现, 服务对象持有推理算子与渲染器;
//! 重计算放在阻塞线程池里执行, 流水线错误在这里映射成状态码。

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::Notify;
use tonic::{transport::Server, Request, Response, Status};
use tracing::{error, info, warn};

use crate::models::Model;
use crate::pipeline::{FrameProcessor, PipelineError, PipelineSettings};
use crate::proto;
use crate::proto::detector_server::{Detector, DetectorServer};
use crate::renderer::Renderer;

impl From<PipelineError> for Status {
    fn from(err: PipelineError) -> Self {
        if err.is_invalid_argument() {
            Status::invalid_argument(err.to_string())
        } else {
            Status::internal(err.to_string())
        }
    }
}

/// 检测服务
pub struct DetectorService {
    processor: FrameProcessor,
}

impl DetectorService {
    pub fn new(
        model: Arc<Mutex<Box<dyn Model>>>,
        renderer: Arc<Renderer>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            processor: FrameProcessor::new(model, renderer, settings),
        }
    }
}

#[tonic::async_trait]
impl Detector for DetectorService {
    async fn check_health(
        &self,
        _request: Request<proto::Empty>,
    ) -> Result<Response<proto::Empty>, Status> {
        info!("health check passed");
        Ok(Response::new(proto::Empty {}))
    }

    async fn process_frame(
        &self,
        request: Request<proto::ProcessFrameRequest>,
    ) -> Result<Response<proto::ProcessFrameResponse>, Status> {
        let request = request.into_inner();
        let processor = self.processor.clone();

        let response = tokio::task::spawn_blocking(move || processor.process(&request))
            .await
            .map_err(|e| {
                error!("frame processing task failed: {e}");
                Status::internal("frame processing failed")
            })?
            .map_err(|e| {
                error!("error processing frame: {e}");
                Status::from(e)
            })?;

        Ok(Response::new(response))
    }
}

/// 退出信号后等待在途请求排空的上限
const DRAIN_DEADLINE: Duration = Duration::from_millis(100);

/// 启动服务并一直运行到收到退出信号
///
/// 收到信号后停止接收新请求, 在途请求最多再等 `DRAIN_DEADLINE`。
pub async fn serve(addr: SocketAddr, service: DetectorService) -> Result<()> {
    info!("detector server listening on {addr}");

    let draining = Arc::new(Notify::new());
    let drain_started = draining.clone();

    let server = Server::builder()
        .add_service(DetectorServer::new(service))
        .serve_with_shutdown(addr, async move {
            shutdown_signal().await;
            drain_started.notify_one();
        });

    tokio::select! {
        result = server => {
            result.context("gRPC server failed")?;
        }
        _ = async {
            draining.notified().await;
            tokio::time::sleep(DRAIN_DEADLINE).await;
        } => {
            warn!("drain deadline exceeded, aborting in-flight requests");
        }
    }

    info!("server stopped");
    Ok(())
}

/// 等待 SIGINT 或 SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            error!("failed to install SIGINT handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
