//! 处理器注册表（HandlerRegistry）
//!
//! 启动时对全部组件执行一次发现：收集每个组件声明的处理器，校验标记并
//! 解析出订阅过滤条件，得到 `HandlerDescriptor` 列表。
//!
//! 任何配置错误都会立即返回，阻止分发器启动；重叠的过滤条件不做去重，
//! 每个处理器拥有独立的订阅（扇出投递）。
//!
use super::{NotificationComponent, NotificationHandler};
use crate::config::NotifyConfig;
use crate::error::{NotifyError, NotifyResult as Result};
use crate::filter::SubscriptionFilter;
use crate::record::EventRecord;
use std::fmt;
use std::sync::Arc;

/// 已发现的处理器：绑定所属组件、调用入口与过滤条件
#[derive(Clone)]
pub struct HandlerDescriptor {
    component: String,
    handler_name: String,
    filter: SubscriptionFilter,
    handler: Arc<dyn NotificationHandler>,
}

impl HandlerDescriptor {
    pub fn new(
        component: impl Into<String>,
        handler_name: impl Into<String>,
        filter: SubscriptionFilter,
        handler: Arc<dyn NotificationHandler>,
    ) -> Self {
        Self {
            component: component.into(),
            handler_name: handler_name.into(),
            filter,
            handler,
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn handler_name(&self) -> &str {
        &self.handler_name
    }

    pub fn filter(&self) -> &SubscriptionFilter {
        &self.filter
    }

    /// `组件::处理器`
    pub fn identity(&self) -> String {
        format!("{}::{}", self.component, self.handler_name)
    }

    pub async fn invoke(&self, record: &EventRecord) -> anyhow::Result<()> {
        self.handler.handle(record).await
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("component", &self.component)
            .field("handler_name", &self.handler_name)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

/// 处理器注册表
#[derive(Clone, Debug, Default)]
pub struct HandlerRegistry {
    default_bucket: Option<String>,
}

impl HandlerRegistry {
    pub fn new(config: &NotifyConfig) -> Self {
        Self {
            default_bucket: config.default_bucket.clone(),
        }
    }

    /// 扫描全部组件，返回处理器描述列表；遇到第一个配置错误即失败
    pub fn discover(
        &self,
        components: &[Arc<dyn NotificationComponent>],
    ) -> Result<Vec<HandlerDescriptor>> {
        let mut descriptors = Vec::new();

        for component in components {
            let component_name = component.component_name().to_string();

            for declaration in Arc::clone(component).notification_handlers() {
                let (name, marker, handler) = declaration.into_parts();
                let config_error = |reason: String| NotifyError::Configuration {
                    component: component_name.clone(),
                    handler: name.clone(),
                    reason,
                };

                if name.trim().is_empty() {
                    return Err(config_error("handler name must not be empty".into()));
                }

                let bucket = marker
                    .bucket()
                    .or(self.default_bucket.as_deref())
                    .ok_or_else(|| {
                        config_error("no bucket on marker and no default bucket configured".into())
                    })?;

                let filter = SubscriptionFilter::new(
                    bucket,
                    marker.prefix(),
                    marker.suffix(),
                    marker.event_types().iter().cloned(),
                )
                .map_err(|e| config_error(e.to_string()))?;

                tracing::info!(
                    component = %component_name,
                    handler = %name,
                    filter = %filter,
                    "registered notification handler"
                );

                descriptors.push(HandlerDescriptor::new(
                    component_name.clone(),
                    name,
                    filter,
                    handler,
                ));
            }
        }

        Ok(descriptors)
    }
}
