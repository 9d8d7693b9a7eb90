//! 前端配置管理模块
//!
//! 提供配置结构、加载（文件、环境变量、默认值）以及固定的管道策略常量

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, CustomPosition, FrontendConfig, InsertMethod, UiStrings};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 批次调度（固定策略，不可按调用配置）
    pub const BATCH_SIZE: usize = 5;
    pub const BATCH_INTERVAL: Duration = Duration::from_millis(1000);

    // 文本过滤：修剪后长度必须大于该值
    pub const MIN_TEXT_LENGTH: usize = 3;

    // 后端 action 名称
    pub const ACTION_CHANGE_LANGUAGE: &str = "dpt_change_language";
    pub const ACTION_TRANSLATE_ELEMENT: &str = "dpt_translate_element";

    // 语言持久化
    pub const COOKIE_NAME: &str = "dpt_current_lang";
    pub const COOKIE_PATH: &str = "/";
    pub const COOKIE_MAX_AGE_SECS: u64 = 30 * 24 * 60 * 60;
    pub const META_LANGUAGE_NAME: &str = "dpt-current-language";
    pub const LANG_QUERY_PARAM: &str = "lang";

    // 界面时序
    pub const NOTIFICATION_DURATION: Duration = Duration::from_secs(3);
    pub const CIRCLE_STAGGER: Duration = Duration::from_millis(50);
    pub const CIRCLE_CLOSE_DELAY: Duration = Duration::from_millis(300);

    // 切换器结构
    pub const SWITCHER_ID: &str = "dpt-language-switcher";
    pub const SWITCHER_CLASS: &str = "dpt-language-switcher";
    pub const LANGUAGE_OPTION_CLASSES: &[&str] = &["dpt-lang-option", "dpt-lang-link", "dpt-lang-card"];
    pub const ERROR_NOTIFICATION_CLASS: &str = "dpt-error-notification";

    // 整页翻译时选取的块级/文本元素
    pub const BULK_TEXT_TAGS: &[&str] = &[
        "h1", "h2", "h3", "h4", "h5", "h6", "p", "li", "td", "th", "span", "div",
    ];
    pub const BULK_EXCLUDED_CLASSES: &[&str] = &["dpt-language-switcher", "dpt-flag-switcher"];

    // 文本提取时不进入的元素
    pub const SKIP_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

    // 默认值
    pub const DEFAULT_LANGUAGE: &str = "en";
    pub const DEFAULT_AJAX_URL: &str = "http://localhost/wp-admin/admin-ajax.php";
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "dpt-config.toml",
        ".dpt-config.toml",
        "dpt-config.json",
        "~/.config/dynamic-translator/config.toml",
        "/etc/dynamic-translator/config.toml",
    ];
}
