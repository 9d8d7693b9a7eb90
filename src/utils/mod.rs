//! # 工具模块
//!
//! 这个模块包含各种工具函数和实用程序：
//!
//! - URL查询参数读写
//!
//! # 模块组织
//!
//! - `url` - URL处理工具函数

pub mod url;

// Re-export commonly used items for convenience
pub use self::url::{get_query_param, set_query_param, Url};
