use proc_macro::TokenStream;

mod handlers;

/// 通知处理器登记宏
/// - 用于组件的 `impl` 块，收集带 `#[notification(...)]` 标记的方法
/// - 自动为目标类型实现 `::bucket_notify::notification::NotificationComponent`
/// - 方法签名必须为 `&self` 加恰好一个 `EventRecord` 或 `&EventRecord` 参数，可为 `async`
/// - 返回值为 `()` 或 `Result<(), E>`（`E: Into<anyhow::Error>`）
///
/// 标记参数：
/// - `events = ["s3:ObjectCreated:*", ...]`（必填，可写单个字符串）
/// - `prefix = "..."` / `suffix = "..."`（可选，默认空）
/// - `bucket = "..."`（可选，未指定时使用配置中的默认桶）
///
/// 宏参数：`#[notification_handlers(name = "...")]` 覆写组件名称，默认取类型名
#[proc_macro_attribute]
pub fn notification_handlers(attr: TokenStream, item: TokenStream) -> TokenStream {
    handlers::expand(attr, item)
}
