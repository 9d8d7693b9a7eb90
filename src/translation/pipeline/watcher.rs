//! 动态内容观察
//!
//! 对 body 子树中新插入的元素提取文本并入队。入队后不会触发调度，
//! 队列要等下一次其它来源的 `drain()` 才会被处理。

use std::rc::Rc;

use crate::parsers::html::dom::{is_element, text_content};
use crate::parsers::html::{MutationObserver, MutationRecord};
use crate::translation::language::CurrentLanguage;

use super::collector::TextCollector;
use super::queue::{TranslationQueue, TranslationRequest};

pub struct MutationWatcher {
    queue: Rc<TranslationQueue>,
    collector: TextCollector,
    default_lang: String,
    current_language: CurrentLanguage,
}

impl MutationWatcher {
    pub fn new(
        queue: Rc<TranslationQueue>,
        default_lang: &str,
        current_language: CurrentLanguage,
    ) -> Self {
        Self {
            queue,
            collector: TextCollector::new(),
            default_lang: default_lang.to_string(),
            current_language,
        }
    }
}

impl MutationObserver for MutationWatcher {
    fn on_mutations(&self, records: &[MutationRecord]) {
        let target_lang = self.current_language.get();

        for node in records.iter().flat_map(|record| record.added_nodes.iter()) {
            if !is_element(node) {
                continue;
            }

            let mut queued = 0;
            for text_node in self.collector.collect_text_nodes(node) {
                let content = text_content(&text_node);
                let request =
                    TranslationRequest::for_node(text_node, &content, &self.default_lang, &target_lang);
                if self.queue.push(request) {
                    queued += 1;
                }
            }

            if queued > 0 {
                tracing::debug!("动态内容入队 {} 条，队列长度 {}", queued, self.queue.len());
            }
        }
    }
}
