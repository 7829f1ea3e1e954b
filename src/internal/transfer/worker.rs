//! 分片任务：每个任务只负责一个 [`ByteRange`]，通过消息向聚合器汇报，从不触碰其它分片。

mod chunk_handler;
pub(crate) mod download_worker;
pub(crate) mod upload_worker;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::internal::transfer::structs::{TransferError, WorkerEvent, WorkerResult};

/// 单个分片本地执行的结果（不含失败，失败走 `Err`）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SliceOutcome {
    Completed,
    Cancelled,
}

/// 分片任务向聚合器发消息的一端
#[derive(Debug, Clone)]
pub(crate) struct WorkerReporter {
    worker_index: usize,
    sender: mpsc::UnboundedSender<WorkerResult>,
}

impl WorkerReporter {
    pub(crate) fn new(
        worker_index: usize,
        sender: mpsc::UnboundedSender<WorkerResult>,
    ) -> Self {
        Self {
            worker_index,
            sender,
        }
    }

    fn send(&self, slice_len: u64, event: WorkerEvent) {
        // 聚合器已退出时没有人关心这条消息
        let _ = self.sender.send(WorkerResult {
            worker_index: self.worker_index,
            slice_len,
            event,
        });
    }

    fn running(&self, slice_len: u64) {
        self.send(slice_len, WorkerEvent::Running);
    }

    /// 把本地执行结果转换成终态消息。
    ///
    /// 已被取消的任务即使同时遇到 I/O 错误也上报 Paused，暂停不能被误报为失败。
    fn finish(
        &self,
        slice_len: u64,
        result: Result<SliceOutcome, TransferError>,
        cancel_token: &CancellationToken,
    ) {
        let event = match result {
            Ok(SliceOutcome::Completed) => WorkerEvent::Succeeded,
            Ok(SliceOutcome::Cancelled) => WorkerEvent::Paused,
            Err(_) if cancel_token.is_cancelled() => WorkerEvent::Paused,
            Err(e) => WorkerEvent::Failed(e),
        };
        self.send(slice_len, event);
    }
}
