//! 扇入归并器：按消息更新各分片长度，节流推送 Running，决定并推送唯一的终态。

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::internal::transfer::structs::{
    TransferError, TransferInfo, TransferStatus, WorkerEvent, WorkerResult,
};

use super::event_sink::EventSink;
use super::progress_throttle::ProgressThrottle;
use super::terminal_latch::TerminalLatch;

/// 全部分片成功后执行的收尾动作（下载时为合并分片）
pub(crate) type Finalizer = Pin<Box<dyn Future<Output = Result<(), TransferError>> + Send>>;

/// 构造聚合器的参数（形参超过 3 个，用 struct 承载）。
pub(crate) struct StatusAggregatorParams {
    pub receiver: mpsc::UnboundedReceiver<WorkerResult>,
    /// 各分片开始时的长度（续传的已缓存字节），下标即 `worker_index - 1`
    pub initial_lengths: Vec<u64>,
    /// 已填好 total_size 等字段的快照模板
    pub info: TransferInfo,
    pub progress_interval: Duration,
    /// 本次运行的令牌；出现失败或暂停时由聚合器取消
    pub run_token: CancellationToken,
    pub sink: EventSink,
    pub finalizer: Option<Finalizer>,
}

pub(crate) struct StatusAggregator {
    receiver: mpsc::UnboundedReceiver<WorkerResult>,
    slice_lens: Vec<u64>,
    finished: Vec<bool>,
    finished_count: usize,
    succeeded_count: usize,
    info: TransferInfo,
    throttle: ProgressThrottle,
    latch: TerminalLatch,
    failure: Option<TransferError>,
    run_token: CancellationToken,
    sink: EventSink,
    finalizer: Option<Finalizer>,
}

impl StatusAggregator {
    pub(crate) fn new(params: StatusAggregatorParams) -> Self {
        let worker_count = params.initial_lengths.len();
        Self {
            receiver: params.receiver,
            slice_lens: params.initial_lengths,
            finished: vec![false; worker_count],
            finished_count: 0,
            succeeded_count: 0,
            info: params.info,
            throttle: ProgressThrottle::new(params.progress_interval),
            latch: TerminalLatch::new(),
            failure: None,
            run_token: params.run_token,
            sink: params.sink,
            finalizer: params.finalizer,
        }
    }

    /// 消费消息直到得出终态，推送终态并返回终态快照。
    pub(crate) async fn run(mut self) -> TransferInfo {
        while self.finished_count < self.slice_lens.len() {
            let Some(message) = self.receiver.recv().await else {
                // 有任务没上报终态就退出了
                warn!(
                    finished = self.finished_count,
                    workers = self.slice_lens.len(),
                    "分片任务丢失"
                );
                self.fail(TransferError::WorkerLost);
                break;
            };
            self.handle(message);
        }

        self.finalize().await
    }

    fn handle(&mut self, message: WorkerResult) {
        let Some(slot) = message.worker_index.checked_sub(1) else {
            return;
        };
        if slot >= self.slice_lens.len() || self.finished[slot] {
            return;
        }
        self.slice_lens[slot] = message.slice_len;

        match message.event {
            WorkerEvent::Running => self.on_running(),
            WorkerEvent::Succeeded => {
                self.mark_finished(slot);
                self.succeeded_count += 1;
            }
            WorkerEvent::Failed(e) => {
                self.mark_finished(slot);
                warn!(worker = message.worker_index, error = %e, "分片失败");
                self.fail(e);
            }
            WorkerEvent::Paused => {
                self.mark_finished(slot);
                if self.latch.try_close(TransferStatus::Paused) {
                    debug!(worker = message.worker_index, "分片暂停，通知其它分片停止");
                    self.run_token.cancel();
                }
            }
        }
    }

    fn on_running(&mut self) {
        // 已有终态在途时只记录长度，不再推送进度
        if self.latch.is_closed() {
            return;
        }
        if self.throttle.should_emit(Instant::now()) {
            self.emit_running();
        }
    }

    fn mark_finished(&mut self, slot: usize) {
        self.finished[slot] = true;
        self.finished_count += 1;
    }

    fn fail(&mut self, error: TransferError) {
        if self.latch.try_close(TransferStatus::Failed) {
            self.failure = Some(error);
            self.run_token.cancel();
        } else {
            debug!(error = %error, "已有终态，忽略后续失败");
        }
    }

    fn cached_size(&self) -> u64 {
        self.slice_lens.iter().sum()
    }

    fn emit_running(&mut self) {
        let mut info = self.info.clone();
        info.status = TransferStatus::Running;
        info.cached_size = self.cached_size();
        self.sink.emit(info);
    }

    async fn finalize(mut self) -> TransferInfo {
        if self.throttle.take_pending() {
            self.emit_running();
        }

        if !self.latch.is_closed() && self.succeeded_count == self.slice_lens.len() {
            let finished = match self.finalizer.take() {
                Some(finalizer) => finalizer.await,
                None => Ok(()),
            };
            match finished {
                Ok(()) => {
                    self.latch.try_close(TransferStatus::Succeeded);
                }
                Err(e) => self.fail(e),
            }
        }

        let mut info = self.info.clone();
        info.cached_size = self.cached_size();
        match self.latch.closed_with() {
            Some(TransferStatus::Succeeded) => {
                info.status = TransferStatus::Succeeded;
                info.cached_size = info.total_size;
            }
            Some(TransferStatus::Paused) => info.status = TransferStatus::Paused,
            _ => {
                info.status = TransferStatus::Failed;
                let error = self.failure.take().unwrap_or(TransferError::WorkerLost);
                info.error = Some(Arc::new(error));
            }
        }

        self.sink.emit(info.clone());
        info
    }
}
