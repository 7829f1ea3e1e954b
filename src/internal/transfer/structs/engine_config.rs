use std::time::Duration;

/// 默认读写缓冲区大小：8KB
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// 默认 Running 事件的最小间隔：200 毫秒
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// 每次写盘 / 读盘的最大字节数，也是进度上报的粒度
    pub buffer_size: usize,
    /// 请求未指定 progress_interval 时使用的节流间隔
    pub progress_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}
