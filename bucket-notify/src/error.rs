//! 通知子系统统一错误定义
//!
//! 按照错误的处置方式划分：
//! - 配置错误：在处理器发现阶段立即失败，阻止启动；
//! - 通知流错误：在监听 worker 内部恢复（跳过单条记录或重新订阅）；
//! - 处理器错误：仅丢失当前事件，不影响后续投递。
//!
use thiserror::Error;

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum NotifyError {
    // --- 配置 ---
    #[error("invalid handler configuration: component={component}, handler={handler}, reason={reason}")]
    Configuration {
        component: String,
        handler: String,
        reason: String,
    },
    #[error("invalid subscription filter: {reason}")]
    InvalidFilter { reason: String },

    // --- 通知流 ---
    #[error("subscribe failed: bucket={bucket}, reason={reason}")]
    Subscribe { bucket: String, reason: String },
    #[error("notification stream error: {reason}")]
    Stream { reason: String },
    #[error("malformed notification record: {reason}")]
    MalformedRecord { reason: String },
    #[error("notification subscription lagged: skipped={skipped}")]
    Lagged { skipped: u64 },

    // --- 处理器 ---
    #[error("notification handler error: handler={handler}, reason={reason}")]
    Handler { handler: String, reason: String },

    // --- 序列化 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
}

impl NotifyError {
    pub fn stream(reason: impl Into<String>) -> Self {
        Self::Stream {
            reason: reason.into(),
        }
    }

    pub fn malformed_record(reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            reason: reason.into(),
        }
    }

    pub fn invalid_filter(reason: impl Into<String>) -> Self {
        Self::InvalidFilter {
            reason: reason.into(),
        }
    }

    /// 仅影响单条记录的错误：跳过该记录，订阅保持打开
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            Self::MalformedRecord { .. } | Self::Lagged { .. } | Self::Serde { .. }
        )
    }

    /// 记录级错误所丢失的记录数
    pub fn skipped_records(&self) -> u64 {
        match self {
            Self::Lagged { skipped } => *skipped,
            _ if self.is_record_level() => 1,
            _ => 0,
        }
    }
}

/// 统一 Result 类型别名
pub type NotifyResult<T> = Result<T, NotifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_level_errors_are_distinguished_from_stream_errors() {
        assert!(NotifyError::malformed_record("bad json").is_record_level());
        assert!(NotifyError::Lagged { skipped: 3 }.is_record_level());
        assert!(!NotifyError::stream("connection reset").is_record_level());
        assert!(
            !NotifyError::Subscribe {
                bucket: "data".into(),
                reason: "refused".into(),
            }
            .is_record_level()
        );
    }

    #[test]
    fn skipped_record_counts() {
        assert_eq!(NotifyError::Lagged { skipped: 3 }.skipped_records(), 3);
        assert_eq!(NotifyError::malformed_record("bad json").skipped_records(), 1);
        assert_eq!(NotifyError::stream("connection reset").skipped_records(), 0);
    }

    #[test]
    fn configuration_error_names_component_and_handler() {
        let err = NotifyError::Configuration {
            component: "Thumbnails".into(),
            handler: "on_upload".into(),
            reason: "event types must not be empty".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("component=Thumbnails"));
        assert!(msg.contains("handler=on_upload"));
    }
}
