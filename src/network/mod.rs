//! # 网络模块
//!
//! 这个模块包含与后端通信以及页面状态相关的网络功能：
//!
//! - AJAX 请求/响应类型和传输抽象
//! - 基于 reqwest 的 HTTP 传输
//! - Cookie 处理和管理
//!
//! # 模块组织
//!
//! - `transport` - 请求类型、`Transport` 特性、HTTP 实现
//! - `cookies` - Cookie 构造、存储和解析

pub mod cookies;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

// Re-export commonly used items for convenience
pub use cookies::{parse_cookie_header, Cookie, CookieJar};
pub use transport::{
    AjaxRequest, AjaxResponse, ChangeLanguageData, HttpTransport, TranslationData, Transport,
};
