//! 通知分发子系统（notification）
//!
//! 将存储后端的变更通知投递给应用组件声明的处理器：
//! - `NotificationStream`：按过滤条件打开长连接订阅的外部协议；
//! - `NotificationComponent`：组件显式登记自己的处理器；
//! - `HandlerRegistry`：启动时发现并校验处理器，生成 `HandlerDescriptor`；
//! - `ListenerWorker`：每个处理器一个，负责订阅、投递与重连；
//! - `Dispatcher`：为每个处理器启动 worker，并返回可关闭的 `DispatcherHandle`。
//!
//! 同一条通知会被投递给每个过滤条件匹配的处理器（扇出），处理器之间互不影响。
//!
pub mod component;
pub mod dispatcher;
pub mod handler;
pub mod registry;
pub mod stream;
pub mod stream_inmemory;
pub mod worker;

pub use component::{HandlerDeclaration, NotificationComponent, NotificationMarker};
pub use dispatcher::{Dispatcher, DispatcherHandle, WorkerSnapshot};
pub use handler::{HandlerOutcome, NotificationHandler, handler_fn};
pub use registry::{HandlerDescriptor, HandlerRegistry};
pub use stream::{NotificationStream, NotificationSubscription};
pub use stream_inmemory::InMemoryNotificationStream;
pub use worker::{ListenerWorker, WorkerState, WorkerStatus};
