use std::path::PathBuf;
use std::sync::Arc;

use super::transfer_error::TransferError;
use super::transfer_status::TransferStatus;

/// 传输方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    Download,
    Upload,
}

/// 一次传输的状态快照，由协调器维护并推送给调用方。
///
/// 分片任务只发送 [`WorkerResult`](super::WorkerResult) 消息，从不直接修改快照。
#[derive(Debug, Clone)]
pub struct TransferInfo {
    /// 文件总大小（字节）；预检查完成前为 0
    pub total_size: u64,
    /// 已缓存（下载）或已发送（上传）的字节数，等于各分片长度之和
    pub cached_size: u64,
    pub status: TransferStatus,
    /// 状态为 [`TransferStatus::Failed`] 时对应的错误
    pub error: Option<Arc<TransferError>>,
    /// 下载时为目标文件，上传时为源文件
    pub target_path: PathBuf,
    pub url: String,
    pub worker_count: usize,
    pub direction: TransferDirection,
}

impl TransferInfo {
    pub(crate) fn new(
        direction: TransferDirection,
        url: &str,
        target_path: PathBuf,
        worker_count: usize,
    ) -> Self {
        Self {
            total_size: 0,
            cached_size: 0,
            status: TransferStatus::Pending,
            error: None,
            target_path,
            url: url.to_string(),
            worker_count,
            direction,
        }
    }

    /// 进度百分比（0～100）；总大小未知时返回 `f64::NAN`。
    pub fn pct(&self) -> f64 {
        if self.total_size == 0 {
            return f64::NAN;
        }
        (self.cached_size as f64 / self.total_size as f64) * 100.0
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
