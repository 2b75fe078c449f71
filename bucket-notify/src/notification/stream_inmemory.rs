//! 内存版通知流（InMemoryNotificationStream）
//!
//! 基于 `tokio::sync::broadcast` 的轻量实现，满足 `NotificationStream` 协议：
//! - `publish`：广播一条通知给所有订阅；
//! - `subscribe`：返回 `'static` 生命周期事件流，并在流内部执行过滤条件，
//!   与真实后端在服务端过滤的行为保持一致；
//! - 典型用途：测试环境、示例与本地开发。
//!
//! 注意：订阅落后过多（lagged）时被覆盖的记录以 `NotifyError::Lagged` 报告，
//! 属于记录级错误；缓冲区中剩余的记录继续投递，订阅不会重建。

use crate::error::{NotifyError, NotifyResult as Result};
use crate::filter::SubscriptionFilter;
use crate::notification::{NotificationStream, NotificationSubscription};
use crate::record::EventRecord;
use async_trait::async_trait;
use futures_util::{StreamExt, future};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

/// 简单的内存通知流实现
#[derive(Clone)]
pub struct InMemoryNotificationStream {
    tx: broadcast::Sender<EventRecord>,
}

impl InMemoryNotificationStream {
    /// 创建一个内存通知流，`capacity` 为广播缓冲区容量
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// 广播一条通知，返回当前订阅数量（无订阅时通知被丢弃）
    pub fn publish(&self, record: EventRecord) -> usize {
        self.tx.send(record).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[async_trait]
impl NotificationStream for InMemoryNotificationStream {
    async fn subscribe(&self, filter: &SubscriptionFilter) -> Result<NotificationSubscription> {
        let filter = filter.clone();
        let stream = BroadcastStream::new(self.tx.subscribe()).filter_map(move |item| {
            let out = match item {
                Ok(record) if filter.matches(&record) => Some(Ok(record)),
                Ok(_) => None,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    Some(Err(NotifyError::Lagged { skipped }))
                }
            };
            future::ready(out)
        });
        Ok(Box::pin(stream))
    }
}
