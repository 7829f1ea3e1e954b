use super::transfer_error::TransferError;

/// 分片任务发给聚合器的消息。
#[derive(Debug)]
pub struct WorkerResult {
    pub worker_index: usize,
    /// 该分片当前的绝对字节数（已落盘或已发送），单个分片内严格递增
    pub slice_len: u64,
    pub event: WorkerEvent,
}

#[derive(Debug)]
pub enum WorkerEvent {
    Running,
    Succeeded,
    Failed(TransferError),
    /// 收到取消信号，分片文件保留以便续传
    Paused,
}
