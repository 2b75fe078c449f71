use bucket_notify::notification::NotificationComponent;
use bucket_notify::notification_handlers;
use bucket_notify::record::EventRecord;
use std::sync::Arc;

struct Thumbnails {
    width: u32,
}

#[notification_handlers]
impl Thumbnails {
    #[notification(events = ["s3:ObjectCreated:*"], prefix = "img/", suffix = ".jpg")]
    async fn on_image(&self, record: EventRecord) -> anyhow::Result<()> {
        let _ = (self.width, record.key());
        Ok(())
    }

    #[notification(events = "s3:ObjectRemoved:*", bucket = "archive")]
    fn on_removed(&self, record: &EventRecord) {
        let _ = record.bucket();
    }

    fn helper(&self) -> u32 {
        self.width
    }
}

fn main() {
    let component = Arc::new(Thumbnails { width: 64 });
    assert_eq!(component.helper(), 64);
    assert_eq!(component.component_name(), "Thumbnails");

    let declarations = component.notification_handlers();
    assert_eq!(declarations.len(), 2);
    assert_eq!(declarations[0].name(), "on_image");
    assert_eq!(declarations[0].marker().prefix(), "img/");
    assert_eq!(declarations[1].marker().bucket(), Some("archive"));
}
