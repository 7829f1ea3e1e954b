use std::path::{Path, PathBuf};
use std::time::Duration;

/// 一次下载的参数，开始传输后不再改变。
///
/// ```rust,no_run
/// use std::time::Duration;
/// use resumable_transfer::TransferRequest;
///
/// let request = TransferRequest::new("https://example.com/a.zip", "downloads/a.zip")
///     .workers(4)
///     .clear_cache(false)
///     .progress_interval(Duration::from_millis(100));
/// ```
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub url: String,
    pub target_path: PathBuf,
    pub worker_count: usize,
    /// 开始前删除目标文件与全部分片缓存
    pub clear_cache_before_start: bool,
    /// 为 `None` 时使用 [`EngineConfig::progress_interval`](super::EngineConfig)
    pub progress_interval: Option<Duration>,
}

impl TransferRequest {
    pub fn new(url: impl Into<String>, target_path: impl AsRef<Path>) -> Self {
        Self {
            url: url.into(),
            target_path: target_path.as_ref().to_path_buf(),
            worker_count: 1,
            clear_cache_before_start: false,
            progress_interval: None,
        }
    }

    /// 设置分片数（并发任务数）
    pub fn workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn clear_cache(mut self, clear: bool) -> Self {
        self.clear_cache_before_start = clear;
        self
    }

    /// Running 事件的最小间隔；`Duration::ZERO` 表示不节流
    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = Some(interval);
        self
    }
}
