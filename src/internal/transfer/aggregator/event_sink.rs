use tokio::sync::mpsc;

use crate::internal::states::snapshot_property::SnapshotProperty;
use crate::internal::transfer::structs::TransferInfo;

/// 对外推送的出口：事件流 + 最新快照，两者总是同步更新。
#[derive(Debug, Clone)]
pub(crate) struct EventSink {
    sender: mpsc::UnboundedSender<TransferInfo>,
    latest: SnapshotProperty<TransferInfo>,
}

impl EventSink {
    pub(crate) fn new(
        sender: mpsc::UnboundedSender<TransferInfo>,
        latest: SnapshotProperty<TransferInfo>,
    ) -> Self {
        Self { sender, latest }
    }

    pub(crate) fn emit(&self, info: TransferInfo) {
        self.latest.update(info.clone());
        // 调用方已丢弃事件流，快照仍然保留
        let _ = self.sender.send(info);
    }
}
