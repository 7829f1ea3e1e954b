//! 处理单块网络数据：按固定缓冲区大小写入分片文件，每写一次上报一次进度。

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::internal::transfer::structs::TransferError;

use super::WorkerReporter;

/// 写完一块数据后分片的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ChunkProgress {
    /// 还需要更多数据
    Continue,
    /// 分片已写满，多余的数据被丢弃
    SliceFull,
    /// 两次写入之间收到取消信号
    Cancelled,
}

/// 处理单块数据时的参数（形参超过 3 个，用 struct 承载）。
pub(super) struct HandleOneChunkParams<'a> {
    pub chunk: &'a [u8],
    pub file: &'a mut File,
    pub slice_path: &'a std::path::Path,
    /// 分片当前长度，写入后原地累加
    pub slice_len: &'a mut u64,
    /// 分片应有的总长度
    pub expected_len: u64,
    pub buffer_size: usize,
    pub reporter: &'a WorkerReporter,
    pub cancel_token: &'a CancellationToken,
}

pub(super) async fn handle_one_chunk(
    params: HandleOneChunkParams<'_>,
) -> Result<ChunkProgress, TransferError> {
    let room = params.expected_len.saturating_sub(*params.slice_len);
    let usable = (params.chunk.len() as u64).min(room) as usize;

    for piece in params.chunk[..usable].chunks(params.buffer_size.max(1)) {
        if params.cancel_token.is_cancelled() {
            return Ok(ChunkProgress::Cancelled);
        }

        params
            .file
            .write_all(piece)
            .await
            .map_err(|e| TransferError::filesystem(params.slice_path, e))?;
        *params.slice_len += piece.len() as u64;
        params.reporter.running(*params.slice_len);
    }

    if *params.slice_len >= params.expected_len {
        Ok(ChunkProgress::SliceFull)
    } else {
        Ok(ChunkProgress::Continue)
    }
}
