//! 传输相关错误类型。

use std::path::PathBuf;

use thiserror::Error;

use crate::internal::transport::structs::TransportError;

#[derive(Debug, Error)]
pub enum TransferError {
    /// 请求参数非法，不可重试
    #[error("参数错误: {0}")]
    InvalidArgument(String),

    #[error("传输失败: {0}")]
    Transport(#[from] TransportError),

    #[error("文件操作失败 {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 服务器忽略了 Range 头，返回了整份资源
    #[error("分片 {index}: 服务器不支持 Range 请求")]
    RangeNotSupported { index: usize },

    #[error("分片 {index} 数据不完整: 期望 {expected} 字节，实际 {actual} 字节")]
    IncompleteSlice {
        index: usize,
        expected: u64,
        actual: u64,
    },

    /// 分片任务在上报终态前退出（panic 或被中止）
    #[error("分片任务异常退出")]
    WorkerLost,
}

impl TransferError {
    pub(crate) fn filesystem(
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}
