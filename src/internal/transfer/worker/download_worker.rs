//! 下载分片任务：一次 Range 请求，把响应体从续传位置写入自己的分片文件。

use std::io::SeekFrom;
use std::path::PathBuf;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::internal::transfer::structs::{ByteRange, TransferError};
use crate::internal::transport::traits::transport::{RangedResponse, Transport};

use super::chunk_handler::{ChunkProgress, HandleOneChunkParams, handle_one_chunk};
use super::{SliceOutcome, WorkerReporter};

/// 下载分片任务的参数（形参超过 3 个，用 struct 承载）。
pub(crate) struct DownloadWorkerParams {
    pub transport: Arc<dyn Transport>,
    pub url: String,
    pub range: ByteRange,
    /// 远程文件总大小，用于判断 200 响应是否可以接受
    pub total_length: u64,
    pub slice_path: PathBuf,
    pub buffer_size: usize,
    pub cancel_token: CancellationToken,
    pub reporter: WorkerReporter,
}

/// 执行一个下载分片，并向聚合器上报恰好一个终态。
pub(crate) async fn run_download_worker(params: DownloadWorkerParams) {
    let mut slice_len = params.range.cached_bytes;
    debug!(
        index = params.range.index,
        range = %params.range.range_header(),
        cached = slice_len,
        "下载分片开始"
    );

    let result = download_slice(&params, &mut slice_len).await;

    debug!(index = params.range.index, slice_len, ?result, "下载分片结束");
    params
        .reporter
        .finish(slice_len, result, &params.cancel_token);
}

async fn download_slice(
    params: &DownloadWorkerParams,
    slice_len: &mut u64,
) -> Result<SliceOutcome, TransferError> {
    let range = &params.range;

    // 已完整的分片不发请求
    if range.is_complete() {
        return Ok(SliceOutcome::Completed);
    }
    if params.cancel_token.is_cancelled() {
        return Ok(SliceOutcome::Cancelled);
    }

    let range_header = range.range_header();
    let response = tokio::select! {
        biased;
        _ = params.cancel_token.cancelled() => return Ok(SliceOutcome::Cancelled),
        response = params.transport.ranged_get(&params.url, &range_header) => response?,
    };

    let mut stream = match response {
        RangedResponse::RangeNotSatisfiable => return Ok(SliceOutcome::Completed),
        RangedResponse::Body { partial, stream } => {
            let whole_file =
                range.resume_start() == 0 && range.range_end + 1 == params.total_length;
            if !partial && !whole_file {
                return Err(TransferError::RangeNotSupported { index: range.index });
            }
            stream
        }
    };

    let mut file = open_slice(params).await?;
    let expected_len = range.slice_len();

    let outcome = loop {
        let next = tokio::select! {
            biased;
            _ = params.cancel_token.cancelled() => break SliceOutcome::Cancelled,
            next = stream.next() => next,
        };

        let chunk = match next {
            Some(chunk) => chunk?,
            None => break SliceOutcome::Completed,
        };

        let progress = handle_one_chunk(HandleOneChunkParams {
            chunk: &chunk,
            file: &mut file,
            slice_path: &params.slice_path,
            slice_len: &mut *slice_len,
            expected_len,
            buffer_size: params.buffer_size,
            reporter: &params.reporter,
            cancel_token: &params.cancel_token,
        })
        .await?;

        match progress {
            ChunkProgress::Continue => {}
            ChunkProgress::SliceFull => break SliceOutcome::Completed,
            ChunkProgress::Cancelled => break SliceOutcome::Cancelled,
        }
    };

    file.flush()
        .await
        .map_err(|e| TransferError::filesystem(&params.slice_path, e))?;

    if outcome == SliceOutcome::Completed && *slice_len < expected_len {
        return Err(TransferError::IncompleteSlice {
            index: range.index,
            expected: expected_len,
            actual: *slice_len,
        });
    }

    Ok(outcome)
}

/// 打开分片文件并定位到已缓存的末尾
async fn open_slice(params: &DownloadWorkerParams) -> Result<File, TransferError> {
    let path = &params.slice_path;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| TransferError::filesystem(parent, e))?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
        .await
        .map_err(|e| TransferError::filesystem(path, e))?;
    file.seek(SeekFrom::Start(params.range.cached_bytes))
        .await
        .map_err(|e| TransferError::filesystem(path, e))?;
    Ok(file)
}
