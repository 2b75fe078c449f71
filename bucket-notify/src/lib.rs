//! 对象存储事件通知分发库（bucket-notify）
//!
//! 将对象存储后端的变更通知（对象创建、删除等）持续投递给应用组件中声明的处理器：
//! - 记录与过滤条件（`record`、`filter`）：通知的不可变值与订阅范围；
//! - 通知分发（`notification`）：外部通知流协议、处理器登记与发现、
//!   每处理器一个的监听 worker 以及负责启动/关闭的分发器；
//! - 配置（`config`）：默认桶与重连退避策略；
//! - 错误（`error`）：配置错误在启动时失败，流与处理器错误在 worker 内部恢复。
//!
//! 典型用法：
//! 1. 在组件的 `impl` 块上使用 `#[notification_handlers]`，并以
//!    `#[notification(events = [...], prefix = "...", suffix = "...")]` 标记处理方法；
//! 2. 为存储后端实现 `NotificationStream`（测试与本地开发可用 `InMemoryNotificationStream`）；
//! 3. 通过 `Dispatcher::bootstrap` 发现处理器并启动监听，持有返回的句柄直至进程退出。
//!
pub mod config;
pub mod error;
pub mod filter;
pub mod notification;
pub mod record;

pub use bucket_notify_macros::notification_handlers;

// 允许在本 crate 内部通过 ::bucket_notify 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::bucket_notify 路径。
extern crate self as bucket_notify;
