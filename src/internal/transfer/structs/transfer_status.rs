/// 传输状态。`Pending` 只作为初始快照存在，不会被推送到事件流。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Paused,
}

impl TransferStatus {
    /// 是否为终态（成功 / 失败 / 暂停）
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Paused)
    }
}
