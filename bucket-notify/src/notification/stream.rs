//! 通知流（NotificationStream）协议
//!
//! 存储后端变更事件流的抽象。分发器只依赖该接口：按过滤条件打开订阅，
//! 得到一个 'static 生命周期的事件流，以便在 tokio::spawn 中长期消费。
//!
//! 流中元素的约定：
//! - `Ok(record)`：一条匹配的通知；
//! - `Err(e)` 且 `e.is_record_level()`：单条记录无法解析，跳过即可；
//! - 其他 `Err(e)`：流级错误，需要重新订阅；
//! - 流结束（`None`）：订阅被终止，需要重新订阅。
//!
use crate::error::NotifyResult as Result;
use crate::filter::SubscriptionFilter;
use crate::record::EventRecord;
use async_trait::async_trait;
use futures_core::stream::BoxStream;

/// 一次订阅产生的事件流
pub type NotificationSubscription = BoxStream<'static, Result<EventRecord>>;

/// 通知流：负责按过滤条件打开长连接订阅
#[async_trait]
pub trait NotificationStream: Send + Sync {
    /// 打开订阅。过滤条件的执行由实现方负责。
    async fn subscribe(&self, filter: &SubscriptionFilter) -> Result<NotificationSubscription>;
}
