//! AJAX 传输层
//!
//! 后端只有一个端点（`admin-ajax.php` 风格），通过表单字段 `action` 区分操作，
//! 响应统一为 `{ "success": bool, "data": ... }`。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::translation::config::constants;
use crate::translation::error::{TranslationError, TranslationResult};

/// 发往后端的请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AjaxRequest {
    ChangeLanguage {
        language: String,
        nonce: String,
    },
    TranslateElement {
        content: String,
        source_lang: String,
        target_lang: String,
        cache_key: Option<String>,
        nonce: String,
    },
}

impl AjaxRequest {
    pub fn action(&self) -> &'static str {
        match self {
            AjaxRequest::ChangeLanguage { .. } => constants::ACTION_CHANGE_LANGUAGE,
            AjaxRequest::TranslateElement { .. } => constants::ACTION_TRANSLATE_ELEMENT,
        }
    }

    /// 表单编码字段，顺序固定，`action` 在最前
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("action", self.action().to_string())];

        match self {
            AjaxRequest::ChangeLanguage { language, nonce } => {
                fields.push(("language", language.clone()));
                fields.push(("nonce", nonce.clone()));
            }
            AjaxRequest::TranslateElement {
                content,
                source_lang,
                target_lang,
                cache_key,
                nonce,
            } => {
                fields.push(("content", content.clone()));
                fields.push(("source_lang", source_lang.clone()));
                fields.push(("target_lang", target_lang.clone()));
                if let Some(cache_key) = cache_key {
                    fields.push(("cache_key", cache_key.clone()));
                }
                fields.push(("nonce", nonce.clone()));
            }
        }

        fields
    }
}

/// 后端响应
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AjaxResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Value,
}

impl AjaxResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data,
        }
    }

    pub fn error(data: Value) -> Self {
        Self {
            success: false,
            data,
        }
    }

    /// 把 `data` 解析为具体类型
    pub fn data_as<T: DeserializeOwned>(&self) -> TranslationResult<T> {
        serde_json::from_value(self.data.clone())
            .map_err(|e| TranslationError::ParseError(format!("响应数据格式错误: {}", e)))
    }

    /// 错误消息：`data.message`，或者 `data` 本身是字符串
    pub fn message(&self) -> Option<String> {
        match &self.data {
            Value::String(message) if !message.is_empty() => Some(message.clone()),
            Value::Object(map) => map
                .get("message")
                .and_then(Value::as_str)
                .filter(|message| !message.is_empty())
                .map(str::to_string),
            _ => None,
        }
    }
}

/// `dpt_change_language` 成功时的数据
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChangeLanguageData {
    #[serde(default)]
    pub reload: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// `dpt_translate_element` 成功时的数据
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TranslationData {
    pub translation: String,
}

/// 请求/响应交换的抽象，便于在测试中替换
#[async_trait(?Send)]
pub trait Transport {
    async fn send(&self, request: &AjaxRequest) -> TranslationResult<AjaxResponse>;
}

/// 基于 reqwest 的 HTTP 传输
pub struct HttpTransport {
    client: Client,
    ajax_url: String,
}

impl HttpTransport {
    pub fn new(ajax_url: &str, timeout: Duration) -> TranslationResult<Self> {
        url::Url::parse(ajax_url)?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TranslationError::ConfigError(format!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self {
            client,
            ajax_url: ajax_url.to_string(),
        })
    }

    pub fn ajax_url(&self) -> &str {
        &self.ajax_url
    }
}

#[async_trait(?Send)]
impl Transport for HttpTransport {
    async fn send(&self, request: &AjaxRequest) -> TranslationResult<AjaxResponse> {
        tracing::debug!("POST {} action={}", self.ajax_url, request.action());

        let response = self
            .client
            .post(&self.ajax_url)
            .form(&request.form_fields())
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            TranslationError::ParseError(format!("响应不是有效的JSON: {}", e))
                .with_context(request.action())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_change_language_fields() {
        let request = AjaxRequest::ChangeLanguage {
            language: "it".to_string(),
            nonce: "n0nce".to_string(),
        };
        assert_eq!(
            request.form_fields(),
            vec![
                ("action", "dpt_change_language".to_string()),
                ("language", "it".to_string()),
                ("nonce", "n0nce".to_string()),
            ]
        );
    }

    #[test]
    fn test_translate_fields_omit_missing_cache_key() {
        let request = AjaxRequest::TranslateElement {
            content: "Hello world".to_string(),
            source_lang: "en".to_string(),
            target_lang: "it".to_string(),
            cache_key: None,
            nonce: "n".to_string(),
        };
        let fields = request.form_fields();
        assert_eq!(fields[0], ("action", "dpt_translate_element".to_string()));
        assert!(fields.iter().all(|(name, _)| *name != "cache_key"));
    }

    #[test]
    fn test_response_parsing() {
        let response: AjaxResponse =
            serde_json::from_str(r#"{"success":true,"data":{"translation":"Ciao mondo"}}"#).unwrap();
        let data: TranslationData = response.data_as().unwrap();
        assert_eq!(data.translation, "Ciao mondo");

        let response: AjaxResponse = serde_json::from_str(r#"{"success":false}"#).unwrap();
        assert!(!response.success);
        assert_eq!(response.message(), None);
    }

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            AjaxResponse::error(json!({"message": "Lingua non valida"})).message(),
            Some("Lingua non valida".to_string())
        );
        assert_eq!(
            AjaxResponse::error(json!("Nonce scaduto")).message(),
            Some("Nonce scaduto".to_string())
        );
        assert_eq!(AjaxResponse::error(json!({"message": ""})).message(), None);
    }

    #[test]
    fn test_change_language_data_defaults() {
        let data: ChangeLanguageData = AjaxResponse::ok(json!({})).data_as().unwrap();
        assert!(!data.reload);
        assert!(data.message.is_none());
    }
}
