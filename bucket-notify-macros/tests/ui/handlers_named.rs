use bucket_notify::notification::NotificationComponent;
use bucket_notify::notification_handlers;
use std::sync::Arc;

struct Audit;

#[notification_handlers(name = "audit-log")]
impl Audit {}

fn main() {
    let component: Arc<dyn NotificationComponent> = Arc::new(Audit);
    assert_eq!(component.component_name(), "audit-log");
    assert!(Arc::clone(&component).notification_handlers().is_empty());
}
