//! # SnapshotProperty — 最新快照属性
//!
//! 基于 [`tokio::sync::watch`] 的「只保留最新值」容器。
//! 传输协调器每向事件流推送一次 [`TransferInfo`](crate::transfer::TransferInfo)，
//! 都会同步刷新这里的快照；不想消费事件流的调用方可以随时读取或监听。
//!
//! ## 使用示例
//! ```rust,no_run
//! use resumable_transfer::states::SnapshotProperty;
//!
//! let prop = SnapshotProperty::new(0u64);
//! prop.update(1);
//! prop.update_field(|v| *v += 1);
//! assert_eq!(prop.get_current(), 2);
//! ```

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

/// 快照属性错误
#[derive(Debug, Error)]
pub enum SnapshotPropertyError {
    /// 所有属性句柄均已销毁，不会再有新值
    #[error("属性已被销毁")]
    Closed,
}

/// 最新快照属性：可 Clone，所有句柄共享同一份值。
///
/// 写入不会阻塞，也不要求存在监听者（没有监听者时值依然会被保存）。
#[derive(Clone, Debug)]
pub struct SnapshotProperty<T> {
    sender: Arc<watch::Sender<T>>,
}

impl<T> SnapshotProperty<T>
where
    T: Clone + Send + Sync,
{
    pub fn new(value: T) -> Self {
        let (sender, _) = watch::channel(value);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// 替换当前值并通知所有监听者。
    pub fn update(&self, new_value: T) {
        self.sender.send_replace(new_value);
    }

    /// 原地修改当前值的部分字段。
    pub fn update_field<F>(&self, updater: F)
    where
        F: FnOnce(&mut T),
    {
        self.sender.send_modify(updater);
    }

    /// 当前值的快照（会 clone）。
    pub fn get_current(&self) -> T {
        self.sender.borrow().clone()
    }

    /// 对当前值应用转换函数，不 clone 整个值。
    pub fn map<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.sender.borrow())
    }

    /// 创建一个监听器，只会收到创建之后的变化。
    pub fn watch(&self) -> SnapshotWatcher<T> {
        SnapshotWatcher {
            receiver: self.sender.subscribe(),
        }
    }
}

/// 快照监听器。
pub struct SnapshotWatcher<T> {
    receiver: watch::Receiver<T>,
}

impl<T> SnapshotWatcher<T>
where
    T: Clone + Send + Sync,
{
    /// 等待下一次变化并返回新值；连续多次写入只会看到最新的一次。
    pub async fn changed(&mut self) -> Result<T, SnapshotPropertyError> {
        self.receiver
            .changed()
            .await
            .map_err(|_| SnapshotPropertyError::Closed)?;
        Ok(self.receiver.borrow_and_update().clone())
    }

    pub fn borrow(&self) -> T {
        self.receiver.borrow().clone()
    }
}
