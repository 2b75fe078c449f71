//! 监听 worker（ListenerWorker）
//!
//! 每个处理器对应一个 worker，独占自己的订阅与重试状态：
//! - Connecting：首次打开订阅，尚未成功；
//! - Listening：消费通知流，逐条顺序调用处理器；
//! - Retrying：订阅打开失败、流级错误或流结束后，按退避策略重新订阅；
//! - Stopped：收到取消信号后退出。
//!
//! 处理器返回错误或 panic 只会丢失当前这条通知；记录级错误（解析失败、订阅落后）直接跳过；
//! 所有错误都在 worker 内部消化，不会传播到分发器或其他 worker。
//!
use super::{HandlerDescriptor, NotificationStream, NotificationSubscription};
use crate::config::RetryPolicy;
use crate::error::NotifyError;
use crate::record::EventRecord;
use futures_util::{FutureExt, StreamExt};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// worker 所处状态
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WorkerState {
    #[default]
    Connecting,
    Listening,
    Retrying,
    Stopped,
}

/// worker 运行状况快照
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkerStatus {
    pub state: WorkerState,
    /// 最近一次错误（处理器或通知流）
    pub last_error: Option<String>,
    /// 处理成功的通知数
    pub delivered: u64,
    /// 处理失败的通知数
    pub failed: u64,
    /// 因解析失败或订阅落后被跳过的记录数
    pub skipped: u64,
    /// 重新订阅次数
    pub reconnects: u64,
}

/// 一次订阅的结束方式
enum SubscriptionEnd {
    Cancelled,
    Interrupted { progressed: bool, reason: String },
}

pub struct ListenerWorker {
    descriptor: HandlerDescriptor,
    stream: Arc<dyn NotificationStream>,
    retry: RetryPolicy,
    status: watch::Sender<WorkerStatus>,
}

impl ListenerWorker {
    pub fn new(
        descriptor: HandlerDescriptor,
        stream: Arc<dyn NotificationStream>,
        retry: RetryPolicy,
    ) -> (Self, watch::Receiver<WorkerStatus>) {
        let (status, rx) = watch::channel(WorkerStatus::default());
        let worker = Self {
            descriptor,
            stream,
            retry,
            status,
        };
        (worker, rx)
    }

    pub fn descriptor(&self) -> &HandlerDescriptor {
        &self.descriptor
    }

    /// 持续监听直到取消
    pub async fn run(self, token: CancellationToken) {
        let span = tracing::info_span!(
            "notification_listener",
            component = %self.descriptor.component(),
            handler = %self.descriptor.handler_name(),
            filter = %self.descriptor.filter(),
        );
        self.listen(token).instrument(span).await
    }

    async fn listen(self, token: CancellationToken) {
        tracing::info!("notification listener started");
        let mut attempt: u32 = 0;

        loop {
            let opened = tokio::select! {
                _ = token.cancelled() => break,
                opened = self.stream.subscribe(self.descriptor.filter()) => opened,
            };

            let (progressed, reason) = match opened {
                Ok(subscription) => {
                    self.set_state(WorkerState::Listening);
                    match self.consume(subscription, &token).await {
                        SubscriptionEnd::Cancelled => break,
                        SubscriptionEnd::Interrupted { progressed, reason } => (progressed, reason),
                    }
                }
                Err(e) => (false, e.to_string()),
            };

            attempt = if progressed {
                1
            } else {
                attempt.saturating_add(1)
            };
            let delay = self.retry.delay_for_attempt(attempt);

            tracing::warn!(
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %reason,
                "notification subscription lost, re-subscribing"
            );
            self.status.send_modify(|s| {
                s.state = WorkerState::Retrying;
                s.reconnects += 1;
                s.last_error = Some(reason);
            });

            if delay.is_zero() {
                // 立即重连时也让出调度，避免在不可达的后端上空转占满线程
                tokio::task::yield_now().await;
            } else {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        self.set_state(WorkerState::Stopped);
        tracing::info!("notification listener stopped");
    }

    async fn consume(
        &self,
        mut subscription: NotificationSubscription,
        token: &CancellationToken,
    ) -> SubscriptionEnd {
        let mut progressed = false;

        loop {
            let item = tokio::select! {
                _ = token.cancelled() => return SubscriptionEnd::Cancelled,
                item = subscription.next() => item,
            };

            match item {
                Some(Ok(record)) => {
                    progressed = true;
                    self.deliver(&record).await;
                }
                Some(Err(e)) if e.is_record_level() => {
                    let skipped = e.skipped_records();
                    tracing::warn!(skipped, error = %e, "skipping unreadable notification records");
                    self.status.send_modify(|s| s.skipped += skipped);
                }
                Some(Err(e)) => {
                    return SubscriptionEnd::Interrupted {
                        progressed,
                        reason: e.to_string(),
                    };
                }
                None => {
                    return SubscriptionEnd::Interrupted {
                        progressed,
                        reason: "notification stream terminated".to_string(),
                    };
                }
            }
        }
    }

    async fn deliver(&self, record: &EventRecord) {
        tracing::debug!(
            key = record.key(),
            event_type = record.event_type(),
            "notification received"
        );

        let outcome = AssertUnwindSafe(self.descriptor.invoke(record))
            .catch_unwind()
            .await;

        let reason = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(format!("{e:#}")),
            Err(panic) => Some(panic_message(&*panic)),
        };

        match reason {
            None => self.status.send_modify(|s| s.delivered += 1),
            Some(reason) => {
                let err = NotifyError::Handler {
                    handler: self.descriptor.identity(),
                    reason,
                };
                tracing::error!(
                    bucket = record.bucket(),
                    key = record.key(),
                    event_type = record.event_type(),
                    error = %err,
                    "notification handler failed"
                );
                self.status.send_modify(|s| {
                    s.failed += 1;
                    s.last_error = Some(err.to_string());
                });
            }
        }
    }

    fn set_state(&self, state: WorkerState) {
        self.status.send_if_modified(|s| {
            let changed = s.state != state;
            s.state = state;
            changed
        });
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("handler panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("handler panicked: {s}")
    } else {
        "handler panicked".to_string()
    }
}
