//! 翻译管道模块
//!
//! 提供动态内容的翻译管道：文本收集、队列、DOM 变更观察和批次调度

pub mod batch;
pub mod collector;
pub mod queue;
pub mod watcher;

// 重新导出主要类型
pub use batch::{BatchDispatcher, DispatchStats};
pub use collector::TextCollector;
pub use queue::{PreloadedTranslation, TranslationQueue, TranslationRequest};
pub use watcher::MutationWatcher;

use std::rc::Rc;

use markup5ever_rcdom::Handle;

use crate::network::Transport;
use crate::parsers::html::Document;
use crate::translation::client::RemoteTranslationClient;

/// 队列、客户端和调度器的组合
#[derive(Clone)]
pub struct TranslationPipeline {
    pub queue: Rc<TranslationQueue>,
    pub client: Rc<RemoteTranslationClient>,
    pub dispatcher: Rc<BatchDispatcher>,
}

impl TranslationPipeline {
    pub fn new(transport: Rc<dyn Transport>, document: Rc<Document>, nonce: &str) -> Self {
        let queue = Rc::new(TranslationQueue::new());
        let client = Rc::new(RemoteTranslationClient::new(transport, document, nonce));
        let dispatcher = BatchDispatcher::new(queue.clone(), client.clone());
        Self {
            queue,
            client,
            dispatcher,
        }
    }

    /// 整页翻译：纯文本元素入队并开始调度，返回入队数量
    pub fn translate_page_content(&self, root: &Handle, source_lang: &str, target_lang: &str) -> usize {
        let queued = crate::translation::queue_page_content(&self.queue, root, source_lang, target_lang);
        tracing::info!("整页翻译入队 {} 个元素 ({} -> {})", queued, source_lang, target_lang);
        self.dispatcher.drain();
        queued
    }

    /// 预加载的动态翻译入队并开始调度，返回入队数量
    pub fn process_preloaded(&self, items: &[PreloadedTranslation]) -> usize {
        let queued = crate::translation::queue_preloaded(&self.queue, items);
        tracing::debug!("预加载翻译入队 {} 条", queued);
        self.dispatcher.drain();
        queued
    }
}
