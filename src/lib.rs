//! # Dynamic Translator Library
//!
//! 网站语言切换器的行为层：切换器外壳、语言切换流程，
//! 以及通过后端 AJAX 接口翻译页面文本的动态翻译管道。
//!
//! ## 模块组织
//!
//! - `core` - 翻译会话（启动、事件分发、公共接口）
//! - `switcher` - 切换器外壳、语言切换控制器、事件总线
//! - `translation` - 文本收集、翻译队列、批次调度和远程客户端
//! - `parsers` - HTML 文档解析、DOM 操作和选择器
//! - `network` - AJAX 传输层和 cookie
//! - `utils` - 工具函数和实用程序
//! - `env` - 环境变量

pub mod core;
pub mod env;
pub mod network;
pub mod parsers;
pub mod switcher;
pub mod translation;
pub mod utils;

// Re-export commonly used items for convenience
pub use core::{Bootstrap, DynamicTranslator};
pub use network::{AjaxRequest, AjaxResponse, HttpTransport, Transport};
pub use parsers::html::Document;
pub use switcher::{Event, EventEnvelope, KeyEvent, SwitchOutcome};
pub use translation::{FrontendConfig, TranslationError, TranslationResult};
