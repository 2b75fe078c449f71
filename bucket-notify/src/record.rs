//! 存储变更通知记录（EventRecord）
//!
//! 描述一次对象存储变更：桶、对象键、事件类型及对象元数据。
//! 记录由外部通知流产生，原样传递给处理器，本库不做任何修改。
//!
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(on(String, into))]
pub struct EventRecord {
    /// 事件所属的桶
    bucket: String,
    /// 对象键
    key: String,
    /// 事件类型，例如 `s3:ObjectCreated:Put`
    event_type: String,
    /// 事件发生时间
    #[builder(default = Utc::now())]
    event_time: DateTime<Utc>,
    /// 对象大小（删除类事件可能缺失）
    size: Option<u64>,
    etag: Option<String>,
    version_id: Option<String>,
    /// 同一对象键上事件的排序标识
    sequencer: Option<String>,
    /// 用户自定义元数据
    #[builder(default)]
    #[serde(default)]
    user_metadata: HashMap<String, String>,
}

impl EventRecord {
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn event_time(&self) -> DateTime<Utc> {
        self.event_time
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    pub fn version_id(&self) -> Option<&str> {
        self.version_id.as_deref()
    }

    pub fn sequencer(&self) -> Option<&str> {
        self.sequencer.as_deref()
    }

    pub fn user_metadata(&self) -> &HashMap<String, String> {
        &self.user_metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fills_defaults() {
        let record = EventRecord::builder()
            .bucket("data")
            .key("img/a.jpg")
            .event_type("s3:ObjectCreated:Put")
            .size(42)
            .build();

        assert_eq!(record.bucket(), "data");
        assert_eq!(record.key(), "img/a.jpg");
        assert_eq!(record.event_type(), "s3:ObjectCreated:Put");
        assert_eq!(record.size(), Some(42));
        assert_eq!(record.etag(), None);
        assert!(record.user_metadata().is_empty());
    }

    #[test]
    fn deserializes_without_user_metadata() {
        let raw = serde_json::json!({
            "bucket": "data",
            "key": "doc/b.txt",
            "event_type": "s3:ObjectRemoved:Delete",
            "event_time": "2024-05-01T10:00:00Z",
            "size": null,
            "etag": null,
            "version_id": null,
            "sequencer": "17C0B0F5"
        });

        let record: EventRecord = serde_json::from_value(raw).expect("deserialize record");
        assert_eq!(record.key(), "doc/b.txt");
        assert_eq!(record.sequencer(), Some("17C0B0F5"));
        assert!(record.user_metadata().is_empty());
    }
}
