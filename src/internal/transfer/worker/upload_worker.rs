//! 上传分片任务：从源文件读出自己的区间，以流的形式交给传输层发送。

use std::io::SeekFrom;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::internal::transfer::structs::{ByteRange, TransferError};
use crate::internal::transport::structs::MultipartForm;
use crate::internal::transport::traits::transport::{Transport, UploadBody};

use super::{SliceOutcome, WorkerReporter};

/// 上传分片任务的参数（形参超过 3 个，用 struct 承载）。
pub(crate) struct UploadWorkerParams {
    pub transport: Arc<dyn Transport>,
    pub url: String,
    pub range: ByteRange,
    pub total_length: u64,
    pub source_path: PathBuf,
    pub buffer_size: usize,
    /// 有值时以表单 POST 发送，此时区间必然覆盖整个文件
    pub multipart: Option<MultipartForm>,
    pub cancel_token: CancellationToken,
    pub reporter: WorkerReporter,
}

/// 执行一个上传分片，并向聚合器上报恰好一个终态。
pub(crate) async fn run_upload_worker(params: UploadWorkerParams) {
    debug!(
        index = params.range.index,
        start = params.range.range_start,
        end = params.range.range_end,
        "上传分片开始"
    );

    let sent = Arc::new(AtomicU64::new(0));
    let result = upload_slice(&params, &sent).await;
    // 成功时整段都已交给传输层；暂停或失败时保留已上报过的字节数，进度不回退
    let slice_len = match result {
        Ok(SliceOutcome::Completed) => params.range.slice_len(),
        _ => sent.load(Ordering::SeqCst),
    };

    debug!(index = params.range.index, slice_len, ?result, "上传分片结束");
    params
        .reporter
        .finish(slice_len, result, &params.cancel_token);
}

async fn upload_slice(
    params: &UploadWorkerParams,
    sent: &Arc<AtomicU64>,
) -> Result<SliceOutcome, TransferError> {
    let range = &params.range;
    if params.cancel_token.is_cancelled() {
        return Ok(SliceOutcome::Cancelled);
    }

    let mut file = File::open(&params.source_path)
        .await
        .map_err(|e| TransferError::filesystem(&params.source_path, e))?;
    file.seek(SeekFrom::Start(range.range_start))
        .await
        .map_err(|e| TransferError::filesystem(&params.source_path, e))?;

    let body = read_range_body(BodyState {
        file,
        remaining: range.slice_len(),
        buffer_size: params.buffer_size,
        sent: Arc::clone(sent),
        reporter: params.reporter.clone(),
    });

    let form = params
        .multipart
        .clone()
        .map(|form| form.with_source_name(&params.source_path));
    let request = match &form {
        Some(form) => params
            .transport
            .post_multipart(&params.url, form, range.slice_len(), body),
        None => {
            let whole_file = range.range_start == 0 && range.range_end + 1 == params.total_length;
            let content_range = (!whole_file).then(|| range.content_range(params.total_length));
            params
                .transport
                .put_range(&params.url, content_range, range.slice_len(), body)
        }
    };

    tokio::select! {
        biased;
        _ = params.cancel_token.cancelled() => Ok(SliceOutcome::Cancelled),
        done = request => {
            done?;
            Ok(SliceOutcome::Completed)
        }
    }
}

/// 请求体读取状态，同时作为 [`read_range_body`] 的参数
struct BodyState {
    file: File,
    remaining: u64,
    buffer_size: usize,
    /// 与分片任务共享的已发送字节数
    sent: Arc<AtomicU64>,
    reporter: WorkerReporter,
}

/// 以固定缓冲区大小读取 `remaining` 字节；每交出一块就上报一次已发送的累计字节数。
fn read_range_body(mut state: BodyState) -> UploadBody {
    state.buffer_size = state.buffer_size.max(1);

    stream::unfold(state, |mut state| async move {
        if state.remaining == 0 {
            return None;
        }

        let want = (state.buffer_size as u64).min(state.remaining) as usize;
        let mut buffer = vec![0u8; want];
        match state.file.read(&mut buffer).await {
            Ok(0) => {
                state.remaining = 0;
                let eof = std::io::Error::from(std::io::ErrorKind::UnexpectedEof);
                Some((Err(eof), state))
            }
            Ok(read) => {
                buffer.truncate(read);
                state.remaining -= read as u64;
                let sent = state.sent.fetch_add(read as u64, Ordering::SeqCst) + read as u64;
                state.reporter.running(sent);
                Some((Ok(Bytes::from(buffer)), state))
            }
            Err(e) => {
                state.remaining = 0;
                Some((Err(e), state))
            }
        }
    })
    .boxed()
}
