//! 远程翻译客户端
//!
//! 把单条请求发给后端，并把结果写回文档：有节点引用时直接修补该节点，
//! 否则把所有修剪后内容与原文相同的文本节点替换掉。

use std::rc::Rc;

use markup5ever_rcdom::Handle;

use crate::network::{AjaxRequest, AjaxResponse, TranslationData, Transport};
use crate::parsers::html::dom::{set_text_content, text_content};
use crate::parsers::html::Document;
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::pipeline::collector::all_text_nodes;
use crate::translation::pipeline::TranslationRequest;
use crate::translation::storage::CacheKey;

/// 修补方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// 写入了请求携带的节点
    Direct,
    /// 按内容匹配替换了 n 个文本节点（可能为 0）
    ContentMatch(usize),
}

pub struct RemoteTranslationClient {
    transport: Rc<dyn Transport>,
    document: Rc<Document>,
    nonce: String,
}

impl RemoteTranslationClient {
    pub fn new(transport: Rc<dyn Transport>, document: Rc<Document>, nonce: &str) -> Self {
        Self {
            transport,
            document,
            nonce: nonce.to_string(),
        }
    }

    /// 请求翻译并写回文档
    pub async fn translate(&self, request: TranslationRequest) -> TranslationResult<PatchOutcome> {
        let translation = self.fetch_translation(&request).await?;
        Ok(self.apply(&request, &translation))
    }

    /// 只请求翻译，不修改文档。缓存键缺失时现场计算。
    pub async fn fetch_translation(&self, request: &TranslationRequest) -> TranslationResult<String> {
        let cache_key = match &request.cache_key {
            Some(cache_key) => cache_key.clone(),
            None => {
                CacheKey::generate(&request.content, &request.source_lang, &request.target_lang)
                    .into_string()
            }
        };

        self.request_translation(AjaxRequest::TranslateElement {
            content: request.content.clone(),
            source_lang: request.source_lang.clone(),
            target_lang: request.target_lang.clone(),
            cache_key: Some(cache_key),
            nonce: self.nonce.clone(),
        })
        .await
    }

    /// 一次性翻译任意文本，不带缓存键
    pub async fn translate_text(
        &self,
        content: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> TranslationResult<String> {
        self.request_translation(AjaxRequest::TranslateElement {
            content: content.to_string(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            cache_key: None,
            nonce: self.nonce.clone(),
        })
        .await
    }

    async fn request_translation(&self, request: AjaxRequest) -> TranslationResult<String> {
        let response = self.transport.send(&request).await?;
        Self::extract_translation(response)
    }

    fn extract_translation(response: AjaxResponse) -> TranslationResult<String> {
        if !response.success {
            return Err(TranslationError::BackendRejected(
                response.message().unwrap_or_else(|| "success: false".to_string()),
            ));
        }
        let data: TranslationData = response.data_as()?;
        Ok(data.translation)
    }

    /// 把译文写回文档
    pub fn apply(&self, request: &TranslationRequest, translation: &str) -> PatchOutcome {
        match &request.element_ref {
            Some(node) => {
                patch_node(node, translation);
                PatchOutcome::Direct
            }
            None => PatchOutcome::ContentMatch(self.update_content_in_page(&request.content, translation)),
        }
    }

    /// 替换所有修剪后内容等于 `original` 的文本节点，返回替换数量
    pub fn update_content_in_page(&self, original: &str, translation: &str) -> usize {
        let matches: Vec<Handle> = all_text_nodes(&self.document.root())
            .into_iter()
            .filter(|node| text_content(node).trim() == original)
            .collect();

        for node in &matches {
            patch_node(node, translation);
        }
        matches.len()
    }
}

fn patch_node(node: &Handle, translation: &str) {
    set_text_content(node, translation);
}
