/// 内存通知流示例
/// 不借助宏，直接以闭包构造处理器描述并启动分发器；
/// 展示扇出投递、处理器失败隔离以及 worker 状态查看
use anyhow::Result as AnyResult;
use bucket_notify::config::NotifyConfig;
use bucket_notify::filter::SubscriptionFilter;
use bucket_notify::notification::{
    Dispatcher, HandlerDescriptor, InMemoryNotificationStream, handler_fn,
};
use bucket_notify::record::EventRecord;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> AnyResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bucket_notify=debug".into()),
        )
        .init();

    let source = InMemoryNotificationStream::new(128);

    let descriptors = vec![
        HandlerDescriptor::new(
            "Gallery",
            "make_thumbnail",
            SubscriptionFilter::new("photos", "img/", ".jpg", ["s3:ObjectCreated:*"])?,
            handler_fn(|record: EventRecord| async move {
                println!("thumbnail <- {}/{}", record.bucket(), record.key());
            }),
        ),
        HandlerDescriptor::new(
            "Gallery",
            "reject_raw",
            SubscriptionFilter::new("photos", "img/", ".raw", ["s3:ObjectCreated:*"])?,
            handler_fn(|record: EventRecord| async move {
                Err::<(), _>(anyhow::anyhow!(
                    "raw images are not supported: {}",
                    record.key()
                ))
            }),
        ),
        HandlerDescriptor::new(
            "Audit",
            "log_everything",
            SubscriptionFilter::for_bucket("photos", ["s3:ObjectCreated:*", "s3:ObjectRemoved:*"])?,
            handler_fn(|record: EventRecord| async move {
                println!("audit     <- {} {}", record.event_type(), record.key());
            }),
        ),
    ];

    let dispatcher = Dispatcher::builder()
        .stream(Arc::new(source.clone()))
        .config(NotifyConfig::default())
        .build();
    let handle = dispatcher.start(descriptors);

    while source.subscriber_count() < handle.worker_count() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    for (key, event_type) in [
        ("img/cat.jpg", "s3:ObjectCreated:Put"),
        ("img/dog.raw", "s3:ObjectCreated:Put"),
        ("img/cat.jpg", "s3:ObjectRemoved:Delete"),
    ] {
        source.publish(
            EventRecord::builder()
                .bucket("photos")
                .key(key)
                .event_type(event_type)
                .size(1024)
                .build(),
        );
    }

    tokio::time::sleep(Duration::from_millis(200)).await;

    for snapshot in handle.statuses() {
        println!(
            "{}::{} [{}] delivered={} failed={} last_error={:?}",
            snapshot.component,
            snapshot.handler,
            snapshot.filter,
            snapshot.status.delivered,
            snapshot.status.failed,
            snapshot.status.last_error,
        );
    }

    handle.shutdown();
    handle.join().await;
    Ok(())
}
