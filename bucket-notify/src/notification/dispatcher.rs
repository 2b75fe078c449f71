//! 通知分发器（Dispatcher）
//!
//! 组合根：为每个处理器描述启动一个独立的 `ListenerWorker`，
//! 启动后立即返回可用于关闭/等待/查看状态的 `DispatcherHandle`。
//! 分发器不观察也不汇总单个 worker 的错误。
//!
use super::registry::HandlerRegistry;
use super::worker::{ListenerWorker, WorkerStatus};
use super::{HandlerDescriptor, NotificationComponent, NotificationStream};
use crate::config::NotifyConfig;
use crate::error::NotifyResult as Result;
use crate::filter::SubscriptionFilter;
use bon::Builder;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Builder)]
pub struct Dispatcher {
    stream: Arc<dyn NotificationStream>,
    #[builder(default)]
    config: NotifyConfig,
}

impl Dispatcher {
    pub fn config(&self) -> &NotifyConfig {
        &self.config
    }

    /// 发现全部组件的处理器并启动监听；存在配置错误时不会启动任何 worker
    pub fn bootstrap(
        &self,
        components: &[Arc<dyn NotificationComponent>],
    ) -> Result<DispatcherHandle> {
        let descriptors = HandlerRegistry::new(&self.config).discover(components)?;
        Ok(self.start(descriptors))
    }

    /// 为每个处理器描述启动一个 worker，不等待其运行结束
    pub fn start(&self, descriptors: Vec<HandlerDescriptor>) -> DispatcherHandle {
        let token = CancellationToken::new();
        let mut workers = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            let component = descriptor.component().to_string();
            let handler = descriptor.handler_name().to_string();
            let filter = descriptor.filter().clone();

            let (worker, status) =
                ListenerWorker::new(descriptor, self.stream.clone(), self.config.retry);
            let task = tokio::spawn(worker.run(token.child_token()));

            workers.push(WorkerHandle {
                component,
                handler,
                filter,
                status,
                task,
            });
        }

        tracing::info!(workers = workers.len(), "notification dispatcher started");

        DispatcherHandle { token, workers }
    }
}

struct WorkerHandle {
    component: String,
    handler: String,
    filter: SubscriptionFilter,
    status: watch::Receiver<WorkerStatus>,
    task: JoinHandle<()>,
}

/// 某个 worker 的状态快照
#[derive(Clone, Debug)]
pub struct WorkerSnapshot {
    pub component: String,
    pub handler: String,
    pub filter: SubscriptionFilter,
    pub status: WorkerStatus,
}

/// 分发器运行句柄：用于关闭、等待与查看各 worker 状态
pub struct DispatcherHandle {
    token: CancellationToken,
    workers: Vec<WorkerHandle>,
}

impl DispatcherHandle {
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn statuses(&self) -> Vec<WorkerSnapshot> {
        self.workers
            .iter()
            .map(|w| WorkerSnapshot {
                component: w.component.clone(),
                handler: w.handler.clone(),
                filter: w.filter.clone(),
                status: w.status.borrow().clone(),
            })
            .collect()
    }

    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub async fn join(mut self) {
        let workers = std::mem::take(&mut self.workers);

        for w in workers {
            if let Err(e) = w.task.await {
                tracing::error!(
                    component = %w.component,
                    handler = %w.handler,
                    error = %e,
                    "notification listener task aborted"
                );
            }
        }
    }
}

impl Drop for DispatcherHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{InMemoryNotificationStream, WorkerState, handler_fn};
    use crate::record::EventRecord;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn dispatcher(source: &InMemoryNotificationStream) -> Dispatcher {
        Dispatcher::builder()
            .stream(Arc::new(source.clone()))
            .config(NotifyConfig::builder().default_bucket("data").build())
            .build()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn start_with_no_descriptors_spawns_nothing() {
        let source = InMemoryNotificationStream::new(8);
        let handle = dispatcher(&source).start(Vec::new());

        assert_eq!(handle.worker_count(), 0);
        assert!(handle.statuses().is_empty());
        handle.shutdown();
        handle.join().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn shutdown_stops_every_worker() {
        let source = InMemoryNotificationStream::new(8);
        let hits = Arc::new(AtomicUsize::new(0));
        let descriptors = (0..3)
            .map(|i| {
                let hits = hits.clone();
                HandlerDescriptor::new(
                    "Counter",
                    format!("handler_{i}"),
                    SubscriptionFilter::for_bucket("data", ["created"]).expect("valid filter"),
                    handler_fn(move |_record: EventRecord| {
                        let hits = hits.clone();
                        async move {
                            hits.fetch_add(1, Ordering::SeqCst);
                        }
                    }),
                )
            })
            .collect();

        let handle = dispatcher(&source).start(descriptors);
        assert_eq!(handle.worker_count(), 3);

        tokio::time::timeout(Duration::from_secs(2), async {
            while source.subscriber_count() < 3 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("workers subscribed");

        source.publish(
            EventRecord::builder()
                .bucket("data")
                .key("k")
                .event_type("created")
                .build(),
        );

        tokio::time::timeout(Duration::from_secs(2), async {
            while hits.load(Ordering::SeqCst) < 3 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("all handlers invoked");

        let snapshots = handle.statuses();
        handle.shutdown();
        assert!(snapshots.iter().all(|s| s.component == "Counter"));

        let receivers: Vec<_> = handle.workers.iter().map(|w| w.status.clone()).collect();
        handle.join().await;

        for rx in &receivers {
            assert_eq!(rx.borrow().state, WorkerState::Stopped);
            assert_eq!(rx.borrow().delivered, 1);
        }
        assert_eq!(source.subscriber_count(), 0);
    }
}
