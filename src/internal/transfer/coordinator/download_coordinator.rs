//! 下载协调：校验 → 清缓存 → 查询远程大小 → 规划续传区间 → 派发分片 → 聚合 → 合并。

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::internal::transfer::aggregator::{
    EventSink, Finalizer, StatusAggregator, StatusAggregatorParams,
};
use crate::internal::transfer::functions::file_merge::merge;
use crate::internal::transfer::functions::slice_files::{clear_cache, file_len, slice_path};
use crate::internal::transfer::structs::{
    ByteRange, EngineConfig, TransferDirection, TransferError, TransferInfo, TransferRequest,
    TransferStatus,
};
use crate::internal::transfer::worker::WorkerReporter;
use crate::internal::transfer::worker::download_worker::{
    DownloadWorkerParams, run_download_worker,
};
use crate::internal::transport::traits::transport::Transport;

use super::emit_terminal;
use super::resume::plan_with_cache;
use super::validation::validate_download;

pub(crate) struct DownloadRunParams {
    pub transport: Arc<dyn Transport>,
    pub config: EngineConfig,
    pub request: TransferRequest,
    /// 调用方持有的根令牌
    pub cancel_token: CancellationToken,
    pub sink: EventSink,
}

/// 预检查的结论
enum Preflight {
    Cancelled,
    /// 目标文件已是完整大小
    AlreadyComplete { total: u64 },
    Ready { total: u64, ranges: Vec<ByteRange> },
}

/// 执行一次下载，推送事件直到唯一的终态，返回终态快照。
pub(crate) async fn run_download(params: DownloadRunParams) -> TransferInfo {
    let DownloadRunParams {
        transport,
        config,
        request,
        cancel_token,
        sink,
    } = params;

    let mut info = TransferInfo::new(
        TransferDirection::Download,
        &request.url,
        request.target_path.clone(),
        request.worker_count,
    );
    info!(
        url = %request.url,
        target = %request.target_path.display(),
        workers = request.worker_count,
        "开始下载"
    );

    let checked = tokio::select! {
        biased;
        _ = cancel_token.cancelled() => Ok(Preflight::Cancelled),
        checked = preflight(transport.as_ref(), &request) => checked,
    };

    let finished = match checked {
        Err(e) => {
            warn!(url = %request.url, error = %e, "下载预检查失败");
            emit_terminal(&sink, info, TransferStatus::Failed, Some(e))
        }
        Ok(Preflight::Cancelled) => emit_terminal(&sink, info, TransferStatus::Paused, None),
        Ok(Preflight::AlreadyComplete { total }) => {
            info!(target = %request.target_path.display(), total, "目标文件已完整，跳过下载");
            info.total_size = total;
            info.cached_size = total;
            emit_terminal(&sink, info, TransferStatus::Succeeded, None)
        }
        Ok(Preflight::Ready { total, ranges }) => {
            info.total_size = total;
            run_workers(RunWorkersParams {
                transport,
                config: &config,
                request: &request,
                root_token: &cancel_token,
                sink,
                info,
                ranges,
            })
            .await
        }
    };

    info!(
        url = %request.url,
        status = ?finished.status,
        cached = finished.cached_size,
        total = finished.total_size,
        "下载结束"
    );
    finished
}

async fn preflight(
    transport: &dyn Transport,
    request: &TransferRequest,
) -> Result<Preflight, TransferError> {
    validate_download(request).await?;

    let target = &request.target_path;
    if request.clear_cache_before_start {
        debug!(target = %target.display(), "清除目标文件与分片缓存");
        clear_cache(target).await?;
    }

    let total = transport.content_length(&request.url).await?;
    if total == 0 {
        return Err(TransferError::InvalidArgument(format!(
            "远程文件大小为 0: {}",
            request.url
        )));
    }

    if file_len(target).await? == total {
        return Ok(Preflight::AlreadyComplete { total });
    }

    let ranges = plan_with_cache(target, total, request.worker_count).await?;
    Ok(Preflight::Ready { total, ranges })
}

struct RunWorkersParams<'a> {
    transport: Arc<dyn Transport>,
    config: &'a EngineConfig,
    request: &'a TransferRequest,
    root_token: &'a CancellationToken,
    sink: EventSink,
    info: TransferInfo,
    ranges: Vec<ByteRange>,
}

/// 每个区间一个任务，聚合器在本任务内消费它们的消息。
async fn run_workers(params: RunWorkersParams<'_>) -> TransferInfo {
    let RunWorkersParams {
        transport,
        config,
        request,
        root_token,
        sink,
        info,
        ranges,
    } = params;

    let run_token = root_token.child_token();
    let (sender, receiver) = mpsc::unbounded_channel();
    let target = request.target_path.clone();
    let slice_paths: Vec<PathBuf> = ranges
        .iter()
        .map(|range| slice_path(&target, range.index))
        .collect();

    let handles: Vec<JoinHandle<()>> = ranges
        .iter()
        .zip(&slice_paths)
        .map(|(range, path)| {
            tokio::spawn(run_download_worker(DownloadWorkerParams {
                transport: Arc::clone(&transport),
                url: request.url.clone(),
                range: *range,
                total_length: info.total_size,
                slice_path: path.clone(),
                buffer_size: config.buffer_size,
                cancel_token: run_token.clone(),
                reporter: WorkerReporter::new(range.index, sender.clone()),
            }))
        })
        .collect();
    // 只留分片任务持有发送端，全部退出后通道关闭
    drop(sender);

    let finalizer: Finalizer = Box::pin(async move {
        debug!(target = %target.display(), slices = slice_paths.len(), "合并分片");
        merge(&slice_paths, &target, true).await
    });

    let finished = StatusAggregator::new(StatusAggregatorParams {
        receiver,
        initial_lengths: ranges.iter().map(|range| range.cached_bytes).collect(),
        info,
        progress_interval: request
            .progress_interval
            .unwrap_or(config.progress_interval),
        run_token,
        sink,
        finalizer: Some(finalizer),
    })
    .run()
    .await;

    join_workers(handles).await;
    finished
}

/// 回收任务句柄；终态已经发出，这里只记录异常退出。
pub(super) async fn join_workers(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        if let Err(e) = handle.await {
            warn!(error = %e, "分片任务异常退出");
        }
    }
}
