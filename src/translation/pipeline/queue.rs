//! 翻译队列
//!
//! 先进先出、无上限。请求在入队时创建，在批次调度取出时移除。

use std::cell::RefCell;
use std::collections::VecDeque;

use markup5ever_rcdom::Handle;
use serde::{Deserialize, Serialize};

use crate::translation::config::constants;

/// 一条待翻译请求
///
/// 有 `element_ref` 时直接修补该节点，否则在整个文档中按内容匹配修补。
/// 持有 `Handle` 会让节点一直存活到响应返回。
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub element_ref: Option<Handle>,
    pub content: String,
    pub source_lang: String,
    pub target_lang: String,
    pub cache_key: Option<String>,
}

impl TranslationRequest {
    pub fn for_node(node: Handle, content: &str, source_lang: &str, target_lang: &str) -> Self {
        Self {
            element_ref: Some(node),
            content: content.trim().to_string(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            cache_key: None,
        }
    }

    pub fn detached(content: &str, source_lang: &str, target_lang: &str) -> Self {
        Self {
            element_ref: None,
            content: content.trim().to_string(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            cache_key: None,
        }
    }

    pub fn with_cache_key(mut self, cache_key: impl Into<String>) -> Self {
        self.cache_key = Some(cache_key.into());
        self
    }

    pub fn is_direct(&self) -> bool {
        self.element_ref.is_some()
    }
}

/// 页面预加载的动态翻译条目
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PreloadedTranslation {
    pub content: String,
    pub source_lang: String,
    pub target_lang: String,
    #[serde(default)]
    pub cache_key: Option<String>,
}

impl From<PreloadedTranslation> for TranslationRequest {
    fn from(item: PreloadedTranslation) -> Self {
        let request = TranslationRequest::detached(&item.content, &item.source_lang, &item.target_lang);
        match item.cache_key {
            Some(cache_key) => request.with_cache_key(cache_key),
            None => request,
        }
    }
}

/// 文本是否值得翻译：修剪后的 UTF-16 编码单元数大于阈值，
/// 与缓存键使用同一计数单位
pub fn is_meaningful(text: &str) -> bool {
    text.trim().encode_utf16().count() > constants::MIN_TEXT_LENGTH
}

#[derive(Debug, Default)]
pub struct TranslationQueue {
    items: RefCell<VecDeque<TranslationRequest>>,
}

impl TranslationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 入队；内容过短时拒绝并返回 `false`
    pub fn push(&self, mut request: TranslationRequest) -> bool {
        if !is_meaningful(&request.content) {
            tracing::trace!("跳过过短的文本: {:?}", request.content);
            return false;
        }
        if request.content.len() != request.content.trim().len() {
            request.content = request.content.trim().to_string();
        }
        self.items.borrow_mut().push_back(request);
        true
    }

    /// 取出最多 `max` 条最早的请求
    pub fn take_batch(&self, max: usize) -> Vec<TranslationRequest> {
        let mut items = self.items.borrow_mut();
        let count = max.min(items.len());
        items.drain(..count).collect()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.items.borrow_mut().clear();
    }

    /// 队列中内容的快照（按顺序）
    pub fn contents(&self) -> Vec<String> {
        self.items.borrow().iter().map(|item| item.content.clone()).collect()
    }
}
