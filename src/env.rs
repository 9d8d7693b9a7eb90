//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问，用于覆盖前端配置

use std::env;
use std::fmt;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    /// 变量是否被显式设置
    fn is_set() -> bool {
        env::var_os(Self::NAME).is_some()
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "DPT_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }

    /// 禁用颜色输出
    pub struct NoColor;
    impl EnvVar<bool> for NoColor {
        const NAME: &'static str = "NO_COLOR";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str = "Disable colored output when set to any value";

        fn parse(value: &str) -> EnvResult<bool> {
            // NO_COLOR 遵循标准：任何值都表示禁用颜色
            Ok(!value.is_empty())
        }
    }
}

/// 前端配置相关环境变量
pub mod frontend {
    use super::*;

    /// AJAX 端点
    pub struct AjaxUrl;
    impl EnvVar<String> for AjaxUrl {
        const NAME: &'static str = "DPT_AJAX_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Backend AJAX endpoint (admin-ajax.php)";

        fn parse(value: &str) -> EnvResult<String> {
            let url = value.trim();
            if url.starts_with("http://") || url.starts_with("https://") {
                Ok(url.to_string())
            } else {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "AJAX URL must start with http:// or https://".to_string(),
                })
            }
        }
    }

    /// 请求 nonce
    pub struct Nonce;
    impl EnvVar<String> for Nonce {
        const NAME: &'static str = "DPT_NONCE";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Request nonce sent with every AJAX call";

        fn parse(value: &str) -> EnvResult<String> {
            Ok(value.trim().to_string())
        }
    }

    /// 站点默认语言
    pub struct DefaultLang;
    impl EnvVar<String> for DefaultLang {
        const NAME: &'static str = "DPT_DEFAULT_LANG";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Site default (source) language code";

        fn parse(value: &str) -> EnvResult<String> {
            parse_language_code(value, Self::NAME)
        }
    }

    /// 当前语言
    pub struct CurrentLang;
    impl EnvVar<String> for CurrentLang {
        const NAME: &'static str = "DPT_CURRENT_LANG";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Language the page is currently rendered in";

        fn parse(value: &str) -> EnvResult<String> {
            parse_language_code(value, Self::NAME)
        }
    }

    /// 切换语言后是否自动翻译整页
    pub struct AutoTranslate;
    impl EnvVar<bool> for AutoTranslate {
        const NAME: &'static str = "DPT_AUTO_TRANSLATE";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str = "Translate page content after a language switch";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }

    /// 切换器位置
    pub struct FlagPosition;
    impl EnvVar<String> for FlagPosition {
        const NAME: &'static str = "DPT_FLAG_POSITION";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Switcher position ('custom' enables mount points)";

        fn parse(value: &str) -> EnvResult<String> {
            Ok(value.trim().to_lowercase())
        }
    }

    /// HTTP 请求超时
    pub struct RequestTimeout;
    impl EnvVar<Duration> for RequestTimeout {
        const NAME: &'static str = "DPT_REQUEST_TIMEOUT";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(30));
        const DESCRIPTION: &'static str = "HTTP request timeout in seconds (1-600)";

        fn parse(value: &str) -> EnvResult<Duration> {
            let secs: u64 = value.trim().parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: format!("Invalid timeout '{}'", value),
            })?;
            if !(1..=600).contains(&secs) {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Timeout must be between 1 and 600 seconds".to_string(),
                });
            }
            Ok(Duration::from_secs(secs))
        }
    }
}

fn parse_bool(value: &str, name: &str) -> EnvResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(EnvError {
            variable: name.to_string(),
            message: format!("Invalid boolean '{}'. Use: true/false, 1/0, yes/no, on/off", value),
        }),
    }
}

/// 语言代码：`it`、`pt-br`、`zh_CN` 之类
fn parse_language_code(value: &str, name: &str) -> EnvResult<String> {
    let code = value.trim();
    let mut parts = code.splitn(2, |c| c == '-' || c == '_');
    let primary = parts.next().unwrap_or_default();
    let region_ok = parts
        .next()
        .map_or(true, |region| !region.is_empty() && region.chars().all(|c| c.is_ascii_alphanumeric()));

    if (2..=3).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_alphabetic()) && region_ok {
        Ok(code.to_string())
    } else {
        Err(EnvError {
            variable: name.to_string(),
            message: format!("Invalid language code '{}'", value),
        })
    }
}

/// 环境变量配置汇总
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub log_level: String,
    pub no_color: bool,
    pub ajax_url: Option<String>,
    pub nonce: Option<String>,
    pub default_lang: Option<String>,
    pub current_lang: Option<String>,
    pub auto_translate: bool,
    pub flag_position: Option<String>,
    pub request_timeout: Duration,
}

impl EnvConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> EnvResult<Self> {
        Ok(Self {
            log_level: core::LogLevel::get()?,
            no_color: core::NoColor::get()?,
            ajax_url: optional::<frontend::AjaxUrl, _>()?,
            nonce: optional::<frontend::Nonce, _>()?,
            default_lang: optional::<frontend::DefaultLang, _>()?,
            current_lang: optional::<frontend::CurrentLang, _>()?,
            auto_translate: frontend::AutoTranslate::get()?,
            flag_position: optional::<frontend::FlagPosition, _>()?,
            request_timeout: frontend::RequestTimeout::get()?,
        })
    }
}

/// 未设置时返回 `None`，设置了但无效时返回错误
fn optional<V: EnvVar<T>, T>() -> EnvResult<Option<T>> {
    if V::is_set() {
        V::get().map(Some)
    } else {
        Ok(None)
    }
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables Documentation\n\n");

    docs.push_str("## Core Configuration\n\n");
    docs.push_str(&format!(
        "- `{}`: {}\n",
        core::LogLevel::NAME,
        core::LogLevel::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        core::NoColor::NAME,
        core::NoColor::DESCRIPTION,
        core::NoColor::DEFAULT
    ));

    docs.push_str("\n## Frontend Configuration\n\n");
    for (name, description) in [
        (frontend::AjaxUrl::NAME, frontend::AjaxUrl::DESCRIPTION),
        (frontend::Nonce::NAME, frontend::Nonce::DESCRIPTION),
        (frontend::DefaultLang::NAME, frontend::DefaultLang::DESCRIPTION),
        (frontend::CurrentLang::NAME, frontend::CurrentLang::DESCRIPTION),
        (frontend::AutoTranslate::NAME, frontend::AutoTranslate::DESCRIPTION),
        (frontend::FlagPosition::NAME, frontend::FlagPosition::DESCRIPTION),
        (frontend::RequestTimeout::NAME, frontend::RequestTimeout::DESCRIPTION),
    ] {
        docs.push_str(&format!("- `{}`: {}\n", name, description));
    }

    docs
}
