//! 上传协调：校验源文件 → 按本地长度规划区间 → 派发上传分片 → 聚合。上传不续传。

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::internal::transfer::aggregator::{EventSink, StatusAggregator, StatusAggregatorParams};
use crate::internal::transfer::functions::range_planner::plan;
use crate::internal::transfer::structs::{
    ByteRange, EngineConfig, TransferDirection, TransferError, TransferInfo, TransferStatus,
    UploadRequest,
};
use crate::internal::transfer::worker::WorkerReporter;
use crate::internal::transfer::worker::upload_worker::{UploadWorkerParams, run_upload_worker};
use crate::internal::transport::traits::transport::Transport;

use super::download_coordinator::join_workers;
use super::emit_terminal;
use super::validation::validate_upload;

pub(crate) struct UploadRunParams {
    pub transport: Arc<dyn Transport>,
    pub config: EngineConfig,
    pub request: UploadRequest,
    pub cancel_token: CancellationToken,
    pub sink: EventSink,
}

pub(crate) async fn run_upload(params: UploadRunParams) -> TransferInfo {
    let UploadRunParams {
        transport,
        config,
        request,
        cancel_token,
        sink,
    } = params;

    let mut info = TransferInfo::new(
        TransferDirection::Upload,
        &request.url,
        request.source_path.clone(),
        request.worker_count,
    );
    info!(
        url = %request.url,
        source = %request.source_path.display(),
        workers = request.worker_count,
        multipart = request.multipart.is_some(),
        "开始上传"
    );

    let planned: Result<Option<(u64, Vec<ByteRange>)>, TransferError> = tokio::select! {
        biased;
        _ = cancel_token.cancelled() => Ok(None),
        planned = plan_upload(&request) => planned.map(Some),
    };

    let finished = match planned {
        Err(e) => {
            warn!(url = %request.url, error = %e, "上传预检查失败");
            emit_terminal(&sink, info, TransferStatus::Failed, Some(e))
        }
        Ok(None) => emit_terminal(&sink, info, TransferStatus::Paused, None),
        Ok(Some((total, ranges))) => {
            info.total_size = total;
            let run_token = cancel_token.child_token();
            let (sender, receiver) = mpsc::unbounded_channel();

            let handles: Vec<JoinHandle<()>> = ranges
                .iter()
                .map(|range| {
                    tokio::spawn(run_upload_worker(UploadWorkerParams {
                        transport: Arc::clone(&transport),
                        url: request.url.clone(),
                        range: *range,
                        total_length: total,
                        source_path: request.source_path.clone(),
                        buffer_size: config.buffer_size,
                        multipart: request.multipart.clone(),
                        cancel_token: run_token.clone(),
                        reporter: WorkerReporter::new(range.index, sender.clone()),
                    }))
                })
                .collect();
            drop(sender);

            let finished = StatusAggregator::new(StatusAggregatorParams {
                receiver,
                initial_lengths: vec![0; ranges.len()],
                info,
                progress_interval: request
                    .progress_interval
                    .unwrap_or(config.progress_interval),
                run_token,
                sink,
                finalizer: None,
            })
            .run()
            .await;

            join_workers(handles).await;
            finished
        }
    };

    info!(
        url = %request.url,
        status = ?finished.status,
        sent = finished.cached_size,
        total = finished.total_size,
        "上传结束"
    );
    finished
}

async fn plan_upload(request: &UploadRequest) -> Result<(u64, Vec<ByteRange>), TransferError> {
    let total = validate_upload(request).await?;
    let ranges = plan(total, request.worker_count, &[])?;
    Ok((total, ranges))
}
