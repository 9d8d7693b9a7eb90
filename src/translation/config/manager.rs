//! 配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::constants;
use crate::translation::error::helpers::config_error;
use crate::translation::error::{TranslationError, TranslationResult};

/// 插入方式（自定义挂载点）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertMethod {
    Append,
    Prepend,
    After,
    Before,
}

/// 自定义挂载点
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CustomPosition {
    pub selector: String,
    pub method: InsertMethod,
}

/// 面向用户的文案
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct UiStrings {
    pub translation_error: String,
    pub select_language: String,
    pub change_language: String,
}

impl Default for UiStrings {
    fn default() -> Self {
        Self {
            translation_error: "Translation error".to_string(),
            select_language: "Select language".to_string(),
            change_language: "Change language".to_string(),
        }
    }
}

/// 前端配置（对应页面注入的引导对象）
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FrontendConfig {
    pub ajax_url: String,
    pub nonce: String,
    pub default_lang: String,
    pub current_lang: String,
    pub auto_translate: bool,
    pub flag_position: String,
    pub custom_positions: Vec<CustomPosition>,
    pub strings: UiStrings,
    pub request_timeout_secs: u64,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            ajax_url: constants::DEFAULT_AJAX_URL.to_string(),
            nonce: String::new(),
            default_lang: constants::DEFAULT_LANGUAGE.to_string(),
            current_lang: constants::DEFAULT_LANGUAGE.to_string(),
            auto_translate: false,
            flag_position: String::new(),
            custom_positions: Vec::new(),
            strings: UiStrings::default(),
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl FrontendConfig {
    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        let url = Url::parse(&self.ajax_url)
            .map_err(|e| config_error(format!("AJAX URL 无效: {}", e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(config_error("AJAX URL 必须是 http 或 https"));
        }

        if self.default_lang.trim().is_empty() {
            return Err(config_error("默认语言不能为空"));
        }

        if self.current_lang.trim().is_empty() {
            return Err(config_error("当前语言不能为空"));
        }

        if self.request_timeout_secs == 0 {
            return Err(config_error("请求超时不能为0"));
        }

        Ok(())
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{frontend, EnvVar};

        if frontend::AjaxUrl::is_set() {
            match frontend::AjaxUrl::get() {
                Ok(ajax_url) => {
                    self.ajax_url = ajax_url;
                    tracing::info!("环境变量覆盖 AJAX URL: {}", self.ajax_url);
                }
                Err(e) => tracing::warn!("忽略环境变量: {}", e),
            }
        }

        if let Ok(nonce) = frontend::Nonce::get() {
            self.nonce = nonce;
        }

        if let Ok(default_lang) = frontend::DefaultLang::get() {
            self.default_lang = default_lang;
        }

        if let Ok(current_lang) = frontend::CurrentLang::get() {
            self.current_lang = current_lang;
        }

        if frontend::AutoTranslate::is_set() {
            if let Ok(auto_translate) = frontend::AutoTranslate::get() {
                self.auto_translate = auto_translate;
            }
        }

        if let Ok(flag_position) = frontend::FlagPosition::get() {
            self.flag_position = flag_position;
        }

        if frontend::RequestTimeout::is_set() {
            if let Ok(timeout) = frontend::RequestTimeout::get() {
                self.request_timeout_secs = timeout.as_secs();
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 是否启用自定义挂载点
    pub fn uses_custom_positions(&self) -> bool {
        self.flag_position == "custom" && !self.custom_positions.is_empty()
    }
}

/// 配置管理器
pub struct ConfigManager {
    config: FrontendConfig,
    source: Option<String>,
}

impl ConfigManager {
    /// 创建新的配置管理器：.env → 配置文件 → 环境变量 → 验证
    pub fn new() -> TranslationResult<Self> {
        Self::load_dotenv();
        let (mut config, source) = Self::load_config()?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config, source })
    }

    /// 从指定文件创建（仍然应用环境变量覆盖）
    pub fn from_file(path: &str) -> TranslationResult<Self> {
        Self::load_dotenv();
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self {
            config,
            source: Some(path.to_string()),
        })
    }

    /// 获取配置
    pub fn get_config(&self) -> &FrontendConfig {
        &self.config
    }

    pub fn into_config(self) -> FrontendConfig {
        self.config
    }

    /// 配置来源文件（使用默认配置时为 `None`）
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn load_config() -> TranslationResult<(FrontendConfig, Option<String>)> {
        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                let config = Self::load_from_file(&expanded_path)?;
                return Ok((config, Some(expanded_path.to_string())));
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok((FrontendConfig::default(), None))
    }

    /// 从指定文件加载配置
    fn load_from_file(path: &str) -> TranslationResult<FrontendConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslationError::ConfigError(format!("读取配置文件失败: {}", e)))?;
        Self::parse_content(path, &content)
    }

    /// 按扩展名解析：`.json` 为 JSON，其余按 TOML
    pub fn parse_content(path: &str, content: &str) -> TranslationResult<FrontendConfig> {
        if path.ends_with(".json") {
            serde_json::from_str(content)
                .map_err(|e| TranslationError::ConfigError(format!("解析JSON配置失败: {}", e)))
        } else {
            toml::from_str(content)
                .map_err(|e| TranslationError::ConfigError(format!("解析TOML配置失败: {}", e)))
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslationResult<()> {
        let mut config = FrontendConfig::default();
        config.custom_positions.push(CustomPosition {
            selector: "header .site-branding".to_string(),
            method: InsertMethod::Append,
        });
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}
