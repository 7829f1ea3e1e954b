use std::time::Duration;

use tokio::time::Instant;

/// Running 事件节流：间隔内的更新被压下，只记一个待补发标记。
#[derive(Debug)]
pub(crate) struct ProgressThrottle {
    interval: Duration,
    last_emit: Option<Instant>,
    pending: bool,
}

impl ProgressThrottle {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: None,
            pending: false,
        }
    }

    /// 本次更新是否应当发出。第一次总是放行。
    pub(crate) fn should_emit(&mut self, now: Instant) -> bool {
        let allowed = match self.last_emit {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };
        if allowed {
            self.last_emit = Some(now);
            self.pending = false;
        } else {
            self.pending = true;
        }
        allowed
    }

    /// 取走待补发标记：终态之前调用，保证最后一次进度不会丢。
    pub(crate) fn take_pending(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }
}
