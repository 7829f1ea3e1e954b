//! 传输引擎领域模块。
//!
//! 使用方式：`TransferEngine::new(transport).download(request)` 得到 [`TransferStream`](structs::TransferStream)，
//! 逐个读取 [`TransferInfo`](structs::TransferInfo) 直到终态。
//! 对外导出以 [`crate::transfer`] 为准，此处仅做模块划分。

pub(crate) mod aggregator;
pub(crate) mod coordinator;
pub mod functions;
pub mod structs;
pub(crate) mod worker;
