//! 错误通知
//!
//! 在 body 末尾追加 `div.dpt-error-notification`，固定时间后移除。

use std::rc::Rc;

use markup5ever_rcdom::Handle;

use crate::parsers::html::dom::{create_element, set_text_content};
use crate::parsers::html::Document;
use crate::translation::config::constants;

#[derive(Clone)]
pub struct Notifier {
    document: Rc<Document>,
}

impl Notifier {
    pub fn new(document: Rc<Document>) -> Self {
        Self { document }
    }

    /// 显示通知；文档没有 body 时只记录日志。需要在 `LocalSet` 中调用。
    pub fn show_error(&self, message: &str) -> Option<Handle> {
        tracing::warn!("{}", message);

        let body = self.document.body()?;
        let notification = create_element("div", &[("class", constants::ERROR_NOTIFICATION_CLASS)]);
        set_text_content(&notification, message);
        self.document.append_child(&body, notification.clone());

        let document = Rc::clone(&self.document);
        let node = notification.clone();
        tokio::task::spawn_local(async move {
            tokio::time::sleep(constants::NOTIFICATION_DURATION).await;
            document.remove(&node);
        });

        Some(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::dom::{find_by_class, text_content};
    use std::time::Duration;
    use tokio::task::LocalSet;

    #[tokio::test(start_paused = true)]
    async fn test_notification_is_removed_after_three_seconds() {
        LocalSet::new()
            .run_until(async {
                let document = Rc::new(Document::parse("<body><p>content</p></body>"));
                let notifier = Notifier::new(document.clone());

                notifier.show_error("Translation error");
                let shown = find_by_class(&document.root(), "dpt-error-notification");
                assert_eq!(shown.len(), 1);
                assert_eq!(text_content(&shown[0]), "Translation error");

                tokio::time::sleep(Duration::from_millis(2900)).await;
                assert_eq!(find_by_class(&document.root(), "dpt-error-notification").len(), 1);

                tokio::time::sleep(Duration::from_millis(200)).await;
                assert!(find_by_class(&document.root(), "dpt-error-notification").is_empty());
            })
            .await;
    }
}
