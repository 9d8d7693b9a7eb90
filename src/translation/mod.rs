//! 翻译模块
//!
//! 动态内容翻译管道，采用清晰的模块化架构：
//! - **pipeline**: 文本收集、翻译队列、DOM 变更观察、批次调度
//! - **client**: 与后端交换请求并把结果写回文档
//! - **storage**: 缓存键生成
//! - **config**: 前端配置和固定策略常量
//! - **language**: 会话内共享的当前语言
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,ignore
//! let queue = Rc::new(TranslationQueue::new());
//! let client = Rc::new(RemoteTranslationClient::new(transport, document.clone(), &config.nonce));
//! let dispatcher = BatchDispatcher::new(queue.clone(), client);
//!
//! for (element, text) in TextCollector::new().collect_page_elements(&document.root()) {
//!     queue.push(TranslationRequest::for_node(element, &text, "en", "it"));
//! }
//! dispatcher.drain();
//! ```

// ============================================================================
// 子模块声明
// ============================================================================

/// 远程翻译客户端
pub mod client;

/// 配置管理模块 - 前端配置加载、验证和常量
pub mod config;

/// 错误处理模块 - 统一的错误类型和处理机制
pub mod error;

/// 当前语言
pub mod language;

/// 文本处理管道模块 - 收集、排队、观察和批次调度
pub mod pipeline;

/// 存储模块 - 缓存键
pub mod storage;

// ============================================================================
// 核心API导出
// ============================================================================

pub use client::{PatchOutcome, RemoteTranslationClient};
pub use config::{constants, ConfigManager, CustomPosition, FrontendConfig, InsertMethod, UiStrings};
pub use error::{ErrorSeverity, TranslationError, TranslationResult};
pub use language::CurrentLanguage;
pub use pipeline::{
    BatchDispatcher, DispatchStats, MutationWatcher, PreloadedTranslation, TextCollector,
    TranslationPipeline, TranslationQueue, TranslationRequest,
};
pub use storage::CacheKey;

// ============================================================================
// 便利函数
// ============================================================================

/// 把整页的纯文本元素加入队列，返回入队数量
pub fn queue_page_content(
    queue: &TranslationQueue,
    root: &markup5ever_rcdom::Handle,
    source_lang: &str,
    target_lang: &str,
) -> usize {
    TextCollector::new()
        .collect_page_elements(root)
        .into_iter()
        .map(|(element, text)| {
            queue.push(TranslationRequest::for_node(element, &text, source_lang, target_lang))
        })
        .filter(|queued| *queued)
        .count()
}

/// 把预加载的动态翻译加入队列，返回入队数量
pub fn queue_preloaded(queue: &TranslationQueue, items: &[PreloadedTranslation]) -> usize {
    items
        .iter()
        .map(|item| queue.push(TranslationRequest::from(item.clone())))
        .filter(|queued| *queued)
        .count()
}
