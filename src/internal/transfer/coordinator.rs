//! 传输协调：参数校验、预检查（远程大小 / 已缓存判断）、派发分片任务并把聚合结果推给调用方。

pub(crate) mod download_coordinator;
mod resume;
pub(crate) mod upload_coordinator;
mod validation;

use std::sync::Arc;

use crate::internal::transfer::aggregator::EventSink;
use crate::internal::transfer::structs::{TransferError, TransferInfo, TransferStatus};

/// 预检查阶段直接得出终态时使用：推送并返回唯一的终态事件。
fn emit_terminal(
    sink: &EventSink,
    mut info: TransferInfo,
    status: TransferStatus,
    error: Option<TransferError>,
) -> TransferInfo {
    info.status = status;
    info.error = error.map(Arc::new);
    sink.emit(info.clone());
    info
}
