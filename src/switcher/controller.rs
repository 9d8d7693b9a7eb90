//! 语言切换控制器
//!
//! 处理用户选择语言：请求后端切换，成功后持久化（cookie、meta、URL）、
//! 刷新切换器状态并发布事件；失败时显示错误通知。加载状态总会被清除。

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use markup5ever_rcdom::Handle;
use tokio::task::JoinHandle;

use crate::network::{AjaxRequest, ChangeLanguageData, Cookie, Transport};
use crate::parsers::html::dom::{
    add_class, deep_clone, find_by_class, find_descendants, find_first_by_class, get_node_attr,
    get_node_name, remove_class, set_node_attr, set_style_property, set_text_content, text_content,
};
use crate::parsers::html::Document;
use crate::translation::config::{constants, FrontendConfig};
use crate::translation::error::{helpers, TranslationError, TranslationResult};
use crate::translation::language::CurrentLanguage;
use crate::translation::pipeline::TranslationPipeline;

use super::events::{Event, EventBus};
use super::notify::Notifier;
use super::page::PageState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchState {
    Idle,
    Switching,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// 空代码或与当前语言相同，未发请求
    Unchanged,
    Switched { reload: bool },
}

pub struct LanguageSwitchController {
    config: Rc<FrontendConfig>,
    document: Rc<Document>,
    transport: Rc<dyn Transport>,
    page: Rc<PageState>,
    current_language: CurrentLanguage,
    pipeline: TranslationPipeline,
    events: EventBus,
    notifier: Notifier,
    state: Cell<SwitchState>,
}

impl LanguageSwitchController {
    pub fn new(
        config: Rc<FrontendConfig>,
        document: Rc<Document>,
        transport: Rc<dyn Transport>,
        page: Rc<PageState>,
        current_language: CurrentLanguage,
        pipeline: TranslationPipeline,
        events: EventBus,
    ) -> Self {
        let notifier = Notifier::new(document.clone());
        Self {
            config,
            document,
            transport,
            page,
            current_language,
            pipeline,
            events,
            notifier,
            state: Cell::new(SwitchState::Idle),
        }
    }

    pub fn state(&self) -> SwitchState {
        self.state.get()
    }

    pub fn current_language(&self) -> String {
        self.current_language.get()
    }

    /// 切换语言
    ///
    /// 切换进行中再次调用返回 `SwitchInProgress`。传输失败或后端拒绝时显示通知并返回错误，
    /// 当前语言保持不变。需要在 `LocalSet` 中调用。
    pub async fn change_language(&self, language: &str) -> TranslationResult<SwitchOutcome> {
        let language = language.trim();
        if language.is_empty() || self.current_language.is(language) {
            return Ok(SwitchOutcome::Unchanged);
        }
        if self.state.get() == SwitchState::Switching {
            return Err(TranslationError::SwitchInProgress);
        }

        self.state.set(SwitchState::Switching);
        self.show_loading_state();

        let outcome = match self.request_change(language).await {
            Ok(data) => Ok(self.apply_switch(language, data)),
            Err(e) => {
                let message = match &e {
                    TranslationError::BackendRejected(message) => message.clone(),
                    _ => self.config.strings.translation_error.clone(),
                };
                self.notifier.show_error(&message);
                Err(e)
            }
        };

        self.hide_loading_state();
        self.state.set(SwitchState::Idle);
        outcome
    }

    async fn request_change(&self, language: &str) -> TranslationResult<ChangeLanguageData> {
        let request = AjaxRequest::ChangeLanguage {
            language: language.to_string(),
            nonce: self.config.nonce.clone(),
        };
        let response = self.transport.send(&request).await?;

        if !response.success {
            let message = response
                .message()
                .unwrap_or_else(|| self.config.strings.translation_error.clone());
            return Err(TranslationError::BackendRejected(message));
        }

        Ok(response.data_as().unwrap_or_default())
    }

    fn apply_switch(&self, language: &str, data: ChangeLanguageData) -> SwitchOutcome {
        let old_language = self.current_language.replace(language);

        self.page.set_cookie(
            Cookie::new(constants::COOKIE_NAME, language)
                .with_path(constants::COOKIE_PATH)
                .with_max_age(Duration::from_secs(constants::COOKIE_MAX_AGE_SECS)),
        );
        self.update_meta_tag(language);
        self.page.replace_query_param(constants::LANG_QUERY_PARAM, language);

        if self.config.auto_translate {
            self.translate_page_content(language);
        }

        self.update_language_switcher(language);

        self.events.publish(Event::LanguageChanged {
            new_language: language.to_string(),
            old_language: old_language.clone(),
        });

        tracing::info!("语言已切换: {} -> {}", old_language, language);
        if data.reload {
            tracing::info!("后端要求刷新页面");
            self.page.request_reload();
        }

        SwitchOutcome::Switched {
            reload: data.reload,
        }
    }

    /// 整页翻译到目标语言
    pub fn translate_page_content(&self, target_lang: &str) -> usize {
        self.pipeline
            .translate_page_content(&self.document.root(), &self.config.default_lang, target_lang)
    }

    fn update_meta_tag(&self, language: &str) {
        let metas = find_descendants(&self.document.root(), |node| {
            get_node_name(node) == Some("meta")
                && get_node_attr(node, "name").as_deref() == Some(constants::META_LANGUAGE_NAME)
        });
        for meta in metas {
            set_node_attr(&meta, "content", Some(language.to_string()));
        }
    }

    /// 刷新切换器：标记当前语言选项，并更新下拉触发器的旗帜和名称
    pub fn update_language_switcher(&self, language: &str) {
        let root = self.document.root();
        let options = find_by_class(&root, "dpt-lang-option");

        for option in &options {
            remove_class(option, "active");
            set_node_attr(option, "aria-current", None);
        }

        let selected: Vec<&Handle> = options
            .iter()
            .filter(|option| get_node_attr(option, "data-lang").as_deref() == Some(language))
            .collect();
        for option in &selected {
            add_class(option, "active");
            set_node_attr(option, "aria-current", Some("page".to_string()));
        }

        let triggers = find_by_class(&root, "dpt-dropdown-trigger");
        if triggers.is_empty() {
            return;
        }

        let new_flag = selected
            .first()
            .and_then(|option| find_first_by_class(option, "dpt-flag"));
        let new_label = selected
            .first()
            .and_then(|option| find_first_by_class(option, "dpt-lang-label"))
            .map(|label| text_content(&label))
            .unwrap_or_default();

        for trigger in &triggers {
            for flag in find_by_class(trigger, "dpt-flag") {
                if let Some(new_flag) = &new_flag {
                    self.document.insert_before(&flag, deep_clone(new_flag));
                }
                self.document.remove(&flag);
            }
            for label in find_by_class(trigger, "dpt-lang-label") {
                set_text_content(&label, &new_label);
            }
        }
    }

    fn show_loading_state(&self) {
        for switcher in find_by_class(&self.document.root(), constants::SWITCHER_CLASS) {
            add_class(&switcher, "loading");
        }
        if let Some(body) = self.document.body() {
            set_style_property(&body, "cursor", Some("wait"));
        }
    }

    fn hide_loading_state(&self) {
        for switcher in find_by_class(&self.document.root(), constants::SWITCHER_CLASS) {
            remove_class(&switcher, "loading");
        }
        if let Some(body) = self.document.body() {
            set_style_property(&body, "cursor", None);
        }
    }

    /// 语言选项被点击：读取 `data-lang` 并在后台切换。
    /// 没有代码或代码与当前语言相同时不启动任务。
    pub fn handle_option_click(
        self: &Rc<Self>,
        option: &Handle,
    ) -> Option<JoinHandle<TranslationResult<SwitchOutcome>>> {
        let language = get_node_attr(option, "data-lang")?;
        let language = language.trim().to_string();
        if language.is_empty() || self.current_language.is(&language) {
            return None;
        }

        let this = Rc::clone(self);
        Some(tokio::task::spawn_local(async move {
            let result = this.change_language(&language).await;
            if let Err(e) = &result {
                helpers::log_error(e);
            }
            result
        }))
    }
}
