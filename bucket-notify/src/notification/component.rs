//! 通知组件（NotificationComponent）
//!
//! 应用组件通过显式登记的方式声明自己的通知处理器：每个组件返回一组
//! `(NotificationMarker, handler)` 声明，由 `HandlerRegistry` 在启动时统一收集。
//! 通常由 `#[notification_handlers]` 宏根据带 `#[notification(...)]` 标记的方法生成。
//!
use super::NotificationHandler;
use bon::Builder;
use std::fmt;
use std::sync::Arc;

/// 处理器标记：订阅的事件类型、对象键前缀/后缀以及可选的桶
#[derive(Clone, Debug, PartialEq, Eq, Builder)]
pub struct NotificationMarker {
    event_types: Vec<String>,
    #[builder(default, into)]
    prefix: String,
    #[builder(default, into)]
    suffix: String,
    /// 未指定时使用配置中的默认桶
    #[builder(into)]
    bucket: Option<String>,
}

impl NotificationMarker {
    pub fn event_types(&self) -> &[String] {
        &self.event_types
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }
}

/// 一个处理器声明
#[derive(Clone)]
pub struct HandlerDeclaration {
    name: String,
    marker: NotificationMarker,
    handler: Arc<dyn NotificationHandler>,
}

impl HandlerDeclaration {
    pub fn new(
        name: impl Into<String>,
        marker: NotificationMarker,
        handler: Arc<dyn NotificationHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            marker,
            handler,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn marker(&self) -> &NotificationMarker {
        &self.marker
    }

    pub(crate) fn into_parts(self) -> (String, NotificationMarker, Arc<dyn NotificationHandler>) {
        (self.name, self.marker, self.handler)
    }
}

impl fmt::Debug for HandlerDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDeclaration")
            .field("name", &self.name)
            .field("marker", &self.marker)
            .finish_non_exhaustive()
    }
}

/// 持有通知处理器的应用组件
pub trait NotificationComponent: Send + Sync + 'static {
    /// 组件名称（用于日志与错误定位）
    fn component_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// 返回组件声明的全部处理器。
    ///
    /// 处理器闭包持有组件的 `Arc`，组件因此与其处理器同生命周期。
    fn notification_handlers(self: Arc<Self>) -> Vec<HandlerDeclaration>;
}
