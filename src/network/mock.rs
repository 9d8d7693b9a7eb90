//! 测试用传输实现

use std::cell::RefCell;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use super::transport::{AjaxRequest, AjaxResponse, Transport};
use crate::translation::error::TranslationResult;

type Responder = Box<dyn Fn(&AjaxRequest) -> TranslationResult<AjaxResponse>>;

pub struct MockTransport {
    requests: RefCell<Vec<AjaxRequest>>,
    responder: Responder,
    latency: Duration,
}

impl MockTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&AjaxRequest) -> TranslationResult<AjaxResponse> + 'static,
    {
        Self {
            requests: RefCell::new(Vec::new()),
            responder: Box::new(responder),
            latency: Duration::ZERO,
        }
    }

    /// 翻译请求返回 `[lang] content`，切换语言总是成功且不刷新
    pub fn echo() -> Self {
        Self::new(|request| {
            Ok(match request {
                AjaxRequest::TranslateElement {
                    content,
                    target_lang,
                    ..
                } => AjaxResponse::ok(json!({ "translation": format!("[{}] {}", target_lang, content) })),
                AjaxRequest::ChangeLanguage { .. } => AjaxResponse::ok(json!({ "reload": false })),
            })
        })
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn requests(&self) -> Vec<AjaxRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

#[async_trait(?Send)]
impl Transport for MockTransport {
    async fn send(&self, request: &AjaxRequest) -> TranslationResult<AjaxResponse> {
        self.requests.borrow_mut().push(request.clone());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        (self.responder)(request)
    }
}
