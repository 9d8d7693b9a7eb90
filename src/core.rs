//! 翻译会话
//!
//! `DynamicTranslator` 把文档、传输层、配置和页面状态组合成一个会话：
//! 启动时绑定切换器外壳、注册变更观察器、处理自定义位置和无障碍属性，
//! 之后接收点击和按键事件，并对外提供语言切换和一次性翻译接口。
//!
//! 会话内部使用 `Rc`，所有异步操作都需要在 `tokio::task::LocalSet` 中运行。

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use markup5ever_rcdom::Handle;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tokio::task::JoinHandle;

use crate::network::{CookieJar, Transport};
use crate::parsers::html::dom::{closest, has_class, show};
use crate::parsers::html::Document;
use crate::switcher::{
    find_shortcut_trigger, find_switcher, setup_accessibility, setup_custom_positions, Event,
    EventBus, EventEnvelope, KeyEvent, LanguageSwitchController, PageState, Propagation,
    ShellContext, ShellKind, ShellRegistry, SwitchOutcome,
};
use crate::translation::config::{constants, FrontendConfig};
use crate::translation::error::TranslationResult;
use crate::translation::{
    CurrentLanguage, DispatchStats, MutationWatcher, PreloadedTranslation, TranslationPipeline,
};
use crate::utils::url::Url;

/// 页面注入的可选启动数据
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Bootstrap {
    /// 旗帜模块配置；存在时发布 `initFlags` 事件
    pub flags: Option<Value>,
    /// 服务端预先收集的动态内容
    pub dynamic_translations: Option<Vec<PreloadedTranslation>>,
}

pub struct DynamicTranslator {
    config: Rc<FrontendConfig>,
    document: Rc<Document>,
    page: Rc<PageState>,
    current_language: CurrentLanguage,
    pipeline: TranslationPipeline,
    controller: Rc<LanguageSwitchController>,
    events: EventBus,
    shells: RefCell<ShellRegistry>,
    initialized: Cell<bool>,
}

impl DynamicTranslator {
    pub fn new(
        config: FrontendConfig,
        document: Document,
        transport: Rc<dyn Transport>,
        page_url: Url,
    ) -> Self {
        Self::with_page(config, document, transport, PageState::new(page_url))
    }

    /// 使用已有的页面状态（例如带着请求 cookie）
    pub fn with_page(
        config: FrontendConfig,
        document: Document,
        transport: Rc<dyn Transport>,
        page: PageState,
    ) -> Self {
        let config = Rc::new(config);
        let document = Rc::new(document);
        let page = Rc::new(page);
        let current_language = CurrentLanguage::new(&config.current_lang);
        let pipeline = TranslationPipeline::new(transport.clone(), document.clone(), &config.nonce);
        let events = EventBus::new();

        let controller = Rc::new(LanguageSwitchController::new(
            config.clone(),
            document.clone(),
            transport,
            page.clone(),
            current_language.clone(),
            pipeline.clone(),
            events.clone(),
        ));

        Self {
            config,
            document,
            page,
            current_language,
            pipeline,
            controller,
            events,
            shells: RefCell::new(ShellRegistry::new()),
            initialized: Cell::new(false),
        }
    }

    /// 启动会话，重复调用无效
    pub fn init(&self, bootstrap: Bootstrap) {
        if self.initialized.replace(true) {
            tracing::debug!("会话已初始化，跳过");
            return;
        }

        let switcher = find_switcher(&self.document);
        if let Some(ref switcher) = switcher {
            self.shells.borrow_mut().extend(ShellRegistry::bind(switcher));
            show(switcher);
        } else {
            tracing::debug!("页面没有 #{}", constants::SWITCHER_ID);
        }

        self.document.observe(Rc::new(MutationWatcher::new(
            self.pipeline.queue.clone(),
            &self.config.default_lang,
            self.current_language.clone(),
        )));

        if let Some(ref switcher) = switcher {
            for clone in setup_custom_positions(&self.document, switcher, &self.config) {
                self.shells.borrow_mut().extend(ShellRegistry::bind(&clone));
            }
        }

        setup_accessibility(&self.document, &self.config.strings);

        if let Some(flags) = bootstrap.flags {
            self.events.publish(Event::FlagsInitialized { flags });
        }

        if let Some(items) = bootstrap.dynamic_translations {
            if self.current_language.is(&self.config.default_lang) {
                tracing::debug!("当前语言即默认语言，忽略预加载翻译");
            } else {
                self.pipeline.process_preloaded(&items);
            }
        }

        tracing::info!(
            "翻译会话已启动: 当前语言 {}，外壳 {:?}",
            self.current_language.get(),
            self.shells.borrow().kinds()
        );
    }

    fn shell_context(&self) -> ShellContext {
        ShellContext {
            document: self.document.clone(),
            focus: self.page.focus().clone(),
        }
    }

    /// 点击事件
    ///
    /// 先交给外壳的元素级处理；没有停止冒泡时再做文档级处理，
    /// 然后把语言选项的点击交给控制器。启动了语言切换时返回其任务。
    pub fn click(&self, target: &Handle) -> Option<JoinHandle<TranslationResult<SwitchOutcome>>> {
        let ctx = self.shell_context();
        {
            let shells = self.shells.borrow();
            if shells.dispatch_click(&ctx, target) == Propagation::Stop {
                return None;
            }
            shells.dispatch_document_click(&ctx, target);
        }

        let option = closest(target, |node| {
            constants::LANGUAGE_OPTION_CLASSES
                .iter()
                .any(|class_name| has_class(node, class_name))
        })?;
        self.controller.handle_option_click(&option)
    }

    /// 按键事件；Alt+L 点击第一个触发器
    pub fn key_down(&self, event: &KeyEvent) {
        if event.alt && event.key == "l" {
            if let Some(trigger) = find_shortcut_trigger(&self.document.root()) {
                self.click(&trigger);
            }
            return;
        }
        self.shells.borrow().dispatch_key(&self.shell_context(), event);
    }

    pub async fn change_language(&self, language: &str) -> TranslationResult<SwitchOutcome> {
        self.controller.change_language(language).await
    }

    pub fn current_language(&self) -> String {
        self.current_language.get()
    }

    /// 一次性翻译文本，源语言为默认语言，目标语言缺省为当前语言
    pub async fn translate_text(&self, text: &str, target_lang: Option<&str>) -> TranslationResult<String> {
        let target_lang = target_lang
            .map(str::to_string)
            .unwrap_or_else(|| self.current_language.get());
        self.pipeline
            .client
            .translate_text(text, &self.config.default_lang, &target_lang)
            .await
    }

    pub fn subscribe(&self) -> Receiver<EventEnvelope> {
        self.events.subscribe()
    }

    /// 注册事件回调，`kind` 为 `languageChanged` 或 `initFlags`
    pub fn on<F>(&self, kind: &str, callback: F) -> JoinHandle<()>
    where
        F: Fn(&Event) + 'static,
    {
        let kind = kind.to_string();
        let mut receiver = self.events.subscribe();
        tokio::task::spawn_local(async move {
            loop {
                match receiver.recv().await {
                    Ok(envelope) if envelope.event.kind() == kind => callback(&envelope.event),
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("事件回调落后，丢失 {} 个事件", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// 等到翻译调度空闲
    pub async fn wait_idle(&self) {
        self.pipeline.dispatcher.wait_idle().await;
    }

    /// 开始一次调度周期，返回发出的请求数
    pub fn flush(&self) -> usize {
        self.pipeline.dispatcher.drain()
    }

    pub fn pending(&self) -> usize {
        self.pipeline.queue.len()
    }

    pub fn stats(&self) -> DispatchStats {
        self.pipeline.dispatcher.stats()
    }

    pub fn document(&self) -> &Rc<Document> {
        &self.document
    }

    pub fn page(&self) -> &Rc<PageState> {
        &self.page
    }

    pub fn config(&self) -> &FrontendConfig {
        &self.config
    }

    pub fn shell_kinds(&self) -> Vec<ShellKind> {
        self.shells.borrow().kinds()
    }

    pub fn cookies(&self) -> CookieJar {
        self.page.cookies()
    }

    pub fn serialize(&self) -> std::io::Result<Vec<u8>> {
        self.document.serialize()
    }

    /// 按指定字符集输出，空字符串为 UTF-8
    pub fn serialize_with_encoding(&self, document_encoding: &str) -> std::io::Result<Vec<u8>> {
        self.document.serialize_with_encoding(document_encoding.to_string())
    }
}
