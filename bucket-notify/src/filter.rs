//! 订阅过滤条件（SubscriptionFilter）
//!
//! 描述一个监听者关心的事件范围：桶、对象键前缀/后缀与事件类型集合。
//! 构造时完成校验，之后不可变。
//!
use crate::error::{NotifyError, NotifyResult};
use crate::record::EventRecord;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionFilter {
    bucket: String,
    prefix: String,
    suffix: String,
    event_types: BTreeSet<String>,
}

impl SubscriptionFilter {
    /// 创建并校验过滤条件
    pub fn new<I, S>(
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
        event_types: I,
    ) -> NotifyResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let filter = Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
            suffix: suffix.into(),
            event_types: event_types.into_iter().map(Into::into).collect(),
        };
        filter.validate()?;
        Ok(filter)
    }

    /// 不限定前缀/后缀的过滤条件
    pub fn for_bucket<I, S>(bucket: impl Into<String>, event_types: I) -> NotifyResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(bucket, "", "", event_types)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn event_types(&self) -> &BTreeSet<String> {
        &self.event_types
    }

    /// 按 S3 兼容后端的语义判断记录是否落在过滤范围内。
    ///
    /// 事件类型支持末尾通配，例如 `s3:ObjectCreated:*`。
    /// 该方法供通知流实现使用，分发器本身不会对记录做二次过滤。
    pub fn matches(&self, record: &EventRecord) -> bool {
        record.bucket() == self.bucket
            && record.key().starts_with(&self.prefix)
            && record.key().ends_with(&self.suffix)
            && self
                .event_types
                .iter()
                .any(|pattern| event_type_matches(pattern, record.event_type()))
    }
}

fn event_type_matches(pattern: &str, event_type: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(head) => event_type.starts_with(head),
        None => pattern == event_type,
    }
}

impl SubscriptionFilter {
    fn validate(&self) -> NotifyResult<()> {
        if self.bucket.trim().is_empty() {
            return Err(NotifyError::invalid_filter("bucket must not be empty"));
        }
        if self.event_types.is_empty() {
            return Err(NotifyError::invalid_filter("event types must not be empty"));
        }
        if self.event_types.iter().any(|t| t.trim().is_empty()) {
            return Err(NotifyError::invalid_filter("event type must not be blank"));
        }
        Ok(())
    }
}

impl fmt::Display for SubscriptionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types: Vec<&str> = self.event_types.iter().map(String::as_str).collect();
        write!(
            f,
            "bucket={} prefix={:?} suffix={:?} events=[{}]",
            self.bucket,
            self.prefix,
            self.suffix,
            types.join(",")
        )
    }
}
