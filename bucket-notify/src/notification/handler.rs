//! 通知处理器（NotificationHandler）
//!
//! 处理器对匹配的存储变更通知执行应用逻辑。每次投递调用一次，
//! 返回错误只会使当前这条通知处理失败。
//!
use crate::record::EventRecord;
use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// 通知处理器：处理一条存储变更通知
#[async_trait]
pub trait NotificationHandler: Send + Sync {
    async fn handle(&self, record: &EventRecord) -> anyhow::Result<()>;
}

/// 将闭包适配为处理器
struct FnHandler<F, Fut, R> {
    f: F,
    _marker: PhantomData<fn() -> (Fut, R)>,
}

#[async_trait]
impl<F, Fut, R> NotificationHandler for FnHandler<F, Fut, R>
where
    F: Fn(EventRecord) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: HandlerOutcome + 'static,
{
    async fn handle(&self, record: &EventRecord) -> anyhow::Result<()> {
        (self.f)(record.clone()).await.into_result()
    }
}

/// 以闭包创建处理器
pub fn handler_fn<F, Fut, R>(f: F) -> Arc<dyn NotificationHandler>
where
    F: Fn(EventRecord) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: HandlerOutcome + 'static,
{
    Arc::new(FnHandler {
        f,
        _marker: PhantomData,
    })
}

/// 处理器方法允许的返回值：`()` 或 `Result<(), E>`
pub trait HandlerOutcome: Send {
    fn into_result(self) -> anyhow::Result<()>;
}

impl HandlerOutcome for () {
    fn into_result(self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<E> HandlerOutcome for Result<(), E>
where
    E: Into<anyhow::Error> + Send,
{
    fn into_result(self) -> anyhow::Result<()> {
        self.map_err(Into::into)
    }
}
