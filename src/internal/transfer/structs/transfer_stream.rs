//! 调用方拿到的事件流：一次传输对应一个流，终态事件之后流结束。

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::internal::states::snapshot_property::SnapshotProperty;

use super::transfer_info::TransferInfo;

/// 传输事件流。
///
/// 零个或多个 Running 之后，恰好一个终态（Succeeded / Failed / Paused）。
/// 取消（[`cancel`](Self::cancel) 或直接 drop）会通知所有分片任务停止，
/// 若此时还没有终态在途，最后收到的是 Paused。
pub struct TransferStream {
    receiver: mpsc::UnboundedReceiver<TransferInfo>,
    cancel_token: CancellationToken,
    latest: SnapshotProperty<TransferInfo>,
}

/// 可跨任务传递的取消句柄
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl TransferStream {
    pub(crate) fn new(
        receiver: mpsc::UnboundedReceiver<TransferInfo>,
        cancel_token: CancellationToken,
        latest: SnapshotProperty<TransferInfo>,
    ) -> Self {
        Self {
            receiver,
            cancel_token,
            latest,
        }
    }

    /// 请求暂停：取消所有分片任务，已下载的分片保留在磁盘上。
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            token: self.cancel_token.clone(),
        }
    }

    /// 最近一次推送的快照；可 `.watch()` 监听，不消费事件流。
    pub fn latest(&self) -> SnapshotProperty<TransferInfo> {
        self.latest.clone()
    }

    /// 消费整个流，返回最后一个事件（正常情况下即终态）。
    pub async fn finish(mut self) -> Option<TransferInfo> {
        let mut last = None;
        while let Some(info) = self.next().await {
            last = Some(info);
        }
        last
    }
}

impl Stream for TransferStream {
    type Item = TransferInfo;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for TransferStream {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
