use std::sync::atomic::{AtomicU8, Ordering};

use crate::internal::transfer::structs::TransferStatus;

const OPEN: u8 = 0;

/// 一次性终态闩：第一个 `try_close` 成功后，其它终态全部被拒绝。
#[derive(Debug, Default)]
pub(crate) struct TerminalLatch {
    state: AtomicU8,
}

impl TerminalLatch {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(OPEN),
        }
    }

    /// 尝试以 `status` 关闭闩；只有第一次调用（且为终态）会返回 `true`。
    pub(crate) fn try_close(&self, status: TransferStatus) -> bool {
        let Some(code) = encode(status) else {
            return false;
        };
        self.state
            .compare_exchange(OPEN, code, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// 关闭时采用的终态；未关闭返回 `None`
    pub(crate) fn closed_with(&self) -> Option<TransferStatus> {
        match self.state.load(Ordering::Acquire) {
            1 => Some(TransferStatus::Succeeded),
            2 => Some(TransferStatus::Failed),
            3 => Some(TransferStatus::Paused),
            _ => None,
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed_with().is_some()
    }
}

fn encode(status: TransferStatus) -> Option<u8> {
    match status {
        TransferStatus::Succeeded => Some(1),
        TransferStatus::Failed => Some(2),
        TransferStatus::Paused => Some(3),
        TransferStatus::Pending | TransferStatus::Running => None,
    }
}
