//! 状态聚合：单消费者归并所有分片任务的消息，决定唯一的终态。

pub(crate) mod event_sink;
pub(crate) mod progress_throttle;
pub(crate) mod status_aggregator;
pub(crate) mod terminal_latch;

pub(crate) use event_sink::EventSink;
pub(crate) use status_aggregator::{Finalizer, StatusAggregator, StatusAggregatorParams};
