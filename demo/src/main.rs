use bucket_notify::config::NotifyConfig;
use bucket_notify::notification::{
    Dispatcher, InMemoryNotificationStream, NotificationComponent, WorkerState,
};
use bucket_notify::notification_handlers;
use bucket_notify::record::EventRecord;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
enum MediaError {
    #[error("object {0} is empty")]
    Empty(String),
    #[error("thumbnail index unavailable")]
    IndexUnavailable,
}

/// 为上传的图片生成缩略图，并维护一个简单的索引
#[derive(Default)]
struct MediaLibrary {
    thumbnails: Mutex<HashMap<String, u64>>,
}

#[notification_handlers]
impl MediaLibrary {
    #[notification(events = ["s3:ObjectCreated:*"], prefix = "uploads/", suffix = ".png")]
    async fn make_thumbnail(&self, record: EventRecord) -> Result<(), MediaError> {
        let size = record.size().unwrap_or_default();
        if size == 0 {
            return Err(MediaError::Empty(record.key().to_string()));
        }

        // 模拟缩放耗时
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.thumbnails
            .lock()
            .map_err(|_| MediaError::IndexUnavailable)?
            .insert(record.key().to_string(), size / 10);
        tracing::info!(key = record.key(), "thumbnail generated");
        Ok(())
    }

    #[notification(events = ["s3:ObjectRemoved:*"], prefix = "uploads/")]
    fn drop_thumbnail(&self, record: &EventRecord) {
        if let Ok(mut index) = self.thumbnails.lock() {
            index.remove(record.key());
        }
    }
}

/// 记录归档桶中的全部变更
struct ArchiveAudit;

#[notification_handlers(name = "archive-audit")]
impl ArchiveAudit {
    #[notification(events = ["s3:ObjectCreated:*", "s3:ObjectRemoved:*"], bucket = "archive")]
    fn record_change(&self, record: &EventRecord) {
        tracing::info!(
            bucket = record.bucket(),
            key = record.key(),
            event_type = record.event_type(),
            "archive changed"
        );
    }
}

// 从环境变量读取 JSON 配置，例如 {"default_bucket": "media"}
fn load_config() -> anyhow::Result<NotifyConfig> {
    match std::env::var("BUCKET_NOTIFY_CONFIG") {
        Ok(raw) => Ok(serde_json::from_str(&raw)?),
        Err(_) => Ok(NotifyConfig::builder().default_bucket("media").build()),
    }
}

fn event(bucket: &str, key: &str, event_type: &str, size: u64) -> EventRecord {
    EventRecord::builder()
        .bucket(bucket)
        .key(key)
        .event_type(event_type)
        .size(size)
        .build()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = load_config()?;
    let bucket = config.default_bucket.clone().unwrap_or_else(|| "media".into());
    let source = InMemoryNotificationStream::new(256);

    let library = Arc::new(MediaLibrary::default());
    let components: Vec<Arc<dyn NotificationComponent>> =
        vec![library.clone(), Arc::new(ArchiveAudit)];

    let handle = Dispatcher::builder()
        .stream(Arc::new(source.clone()))
        .config(config)
        .build()
        .bootstrap(&components)?;

    while source.subscriber_count() < handle.worker_count() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    source.publish(event(&bucket, "uploads/cat.png", "s3:ObjectCreated:Put", 4096));
    source.publish(event(&bucket, "uploads/empty.png", "s3:ObjectCreated:Put", 0));
    source.publish(event(&bucket, "uploads/notes.txt", "s3:ObjectCreated:Put", 120));
    source.publish(event(&bucket, "uploads/dog.png", "s3:ObjectCreated:Put", 8192));
    source.publish(event(&bucket, "uploads/cat.png", "s3:ObjectRemoved:Delete", 0));
    source.publish(event("archive", "2024/report.pdf", "s3:ObjectCreated:Copy", 2048));

    tokio::time::sleep(Duration::from_millis(300)).await;

    for snapshot in handle.statuses() {
        let state = match snapshot.status.state {
            WorkerState::Connecting => "connecting",
            WorkerState::Listening => "listening",
            WorkerState::Retrying => "retrying",
            WorkerState::Stopped => "stopped",
        };
        println!(
            "{:<14} {:<16} {:<9} delivered={} failed={} ({})",
            snapshot.component,
            snapshot.handler,
            state,
            snapshot.status.delivered,
            snapshot.status.failed,
            snapshot.filter,
        );
    }

    if let Ok(index) = library.thumbnails.lock() {
        println!("thumbnails: {:?}", index.keys().collect::<Vec<_>>());
    }

    handle.shutdown();
    handle.join().await;
    Ok(())
}
