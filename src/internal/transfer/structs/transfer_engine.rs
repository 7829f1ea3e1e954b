//! # TransferEngine — 传输入口
//!
//! 引擎持有注入的 [`Transport`] 与 [`EngineConfig`]，本身可 Clone，不依赖任何全局单例。
//! 每次 [`download`](TransferEngine::download) / [`upload`](TransferEngine::upload)
//! 都会在当前 tokio 运行时上启动一个协调任务，并立即返回对应的 [`TransferStream`]。
//!
//! ## 使用示例
//! ```rust,no_run
//! use futures_util::StreamExt;
//! use resumable_transfer::{HttpTransport, TransferEngine, TransferRequest};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::builder()
//!     .base_url("https://example.com/files/")?
//!     .build()?;
//! let engine = TransferEngine::new(transport);
//!
//! let mut stream = engine.download(TransferRequest::new("a.zip", "downloads/a.zip").workers(4));
//! while let Some(info) = stream.next().await {
//!     println!("{:?} {:.1}%", info.status, info.pct());
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::internal::states::snapshot_property::SnapshotProperty;
use crate::internal::transfer::aggregator::EventSink;
use crate::internal::transfer::coordinator::download_coordinator::{
    DownloadRunParams, run_download,
};
use crate::internal::transfer::coordinator::upload_coordinator::{UploadRunParams, run_upload};
use crate::internal::transport::traits::transport::Transport;

use super::engine_config::EngineConfig;
use super::transfer_info::{TransferDirection, TransferInfo};
use super::transfer_request::TransferRequest;
use super::transfer_stream::TransferStream;
use super::upload_request::UploadRequest;

#[derive(Clone)]
pub struct TransferEngine {
    transport: Arc<dyn Transport>,
    config: EngineConfig,
}

impl std::fmt::Debug for TransferEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TransferEngine {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::with_config(transport, EngineConfig::default())
    }

    pub fn with_config(transport: impl Transport + 'static, config: EngineConfig) -> Self {
        Self::from_shared(Arc::new(transport), config)
    }

    /// 多个引擎共享同一个传输实现（例如复用连接池）
    pub fn from_shared(transport: Arc<dyn Transport>, config: EngineConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 开始（或续传）一次下载。必须在 tokio 运行时内调用。
    pub fn download(&self, request: TransferRequest) -> TransferStream {
        let pending = TransferInfo::new(
            TransferDirection::Download,
            &request.url,
            request.target_path.clone(),
            request.worker_count,
        );
        let (stream, cancel_token, sink) = open_stream(pending);

        tokio::spawn(run_download(DownloadRunParams {
            transport: Arc::clone(&self.transport),
            config: self.config.clone(),
            request,
            cancel_token,
            sink,
        }));
        stream
    }

    /// 开始一次上传（总是从头发送）。必须在 tokio 运行时内调用。
    pub fn upload(&self, request: UploadRequest) -> TransferStream {
        let pending = TransferInfo::new(
            TransferDirection::Upload,
            &request.url,
            request.source_path.clone(),
            request.worker_count,
        );
        let (stream, cancel_token, sink) = open_stream(pending);

        tokio::spawn(run_upload(UploadRunParams {
            transport: Arc::clone(&self.transport),
            config: self.config.clone(),
            request,
            cancel_token,
            sink,
        }));
        stream
    }
}

/// 创建事件通道、快照与根令牌；快照初始为 Pending，Pending 不会进入事件流。
fn open_stream(pending: TransferInfo) -> (TransferStream, CancellationToken, EventSink) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let latest = SnapshotProperty::new(pending);
    let cancel_token = CancellationToken::new();
    let stream = TransferStream::new(receiver, cancel_token.clone(), latest.clone());
    (stream, cancel_token, EventSink::new(sender, latest))
}
