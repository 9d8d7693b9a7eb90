//! 存储模块
//!
//! 提供翻译缓存键生成。缓存本身由后端维护。

pub mod cache;

pub use cache::CacheKey;
