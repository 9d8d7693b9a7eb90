// 集成测试公共模块
//
// HTML 页面夹具、记录请求的传输实现和会话构建器

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use dynamic_translator::network::{AjaxRequest, AjaxResponse, Transport};
use dynamic_translator::parsers::html::dom::{find_by_id, find_descendants, get_node_name};
use dynamic_translator::translation::{FrontendConfig, TranslationResult};
use dynamic_translator::utils::url::Url;
use dynamic_translator::{Document, DynamicTranslator};

use markup5ever_rcdom::Handle;

type Responder = Box<dyn Fn(&AjaxRequest) -> TranslationResult<AjaxResponse>>;

/// 记录所有请求并按闭包应答的传输实现
pub struct RecordingTransport {
    requests: RefCell<Vec<AjaxRequest>>,
    responder: Responder,
    latency: Duration,
}

impl RecordingTransport {
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

    /// 切换语言成功（不刷新），翻译返回 `[lang] content`
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

    pub fn translated_contents(&self) -> Vec<String> {
        self.requests
            .borrow()
            .iter()
            .filter_map(|request| match request {
                AjaxRequest::TranslateElement { content, .. } => Some(content.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait(?Send)]
impl Transport for RecordingTransport {
    async fn send(&self, request: &AjaxRequest) -> TranslationResult<AjaxResponse> {
        self.requests.borrow_mut().push(request.clone());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        (self.responder)(request)
    }
}

/// HTML 夹具
pub struct HtmlTestHelper;

impl HtmlTestHelper {
    /// 带下拉切换器的商店页面
    pub fn dropdown_page() -> &'static str {
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="dpt-current-language" content="en">
  <title>Shop</title>
</head>
<body>
  <header id="site-header"><div class="site-branding">Shop</div></header>
  <div id="dpt-language-switcher" class="dpt-language-switcher">
    <div class="dpt-dropdown-container">
      <button id="dropdown-trigger" class="dpt-dropdown-trigger" aria-expanded="false"><span class="dpt-flag">EN</span><span class="dpt-lang-label">English</span></button>
      <ul id="dropdown-menu" class="dpt-dropdown-menu" style="display: none">
        <li id="opt-en" class="dpt-lang-option active" data-lang="en"><span class="dpt-flag">EN</span><span class="dpt-lang-label">English</span></li>
        <li id="opt-it" class="dpt-lang-option" data-lang="it"><span class="dpt-flag">IT</span><span class="dpt-lang-label">Italiano</span></li>
        <li id="opt-de" class="dpt-lang-option" data-lang="de"><span class="dpt-flag">DE</span><span class="dpt-lang-label">Deutsch</span></li>
      </ul>
    </div>
  </div>
  <main id="content">
    <h1 id="title">Hello world</h1>
    <p id="intro">Our products are handmade</p>
    <p id="short">OK</p>
    <div id="comments"></div>
  </main>
  <script>var hidden = "Not translated text";</script>
</body>
</html>"#
    }

    /// 弹出层和侧边栏切换器
    pub fn popup_sidebar_page() -> &'static str {
        r#"<html><body>
  <div id="dpt-language-switcher" class="dpt-language-switcher">
    <button id="popup-trigger" class="dpt-popup-trigger">Languages</button>
    <div id="popup-overlay" class="dpt-popup-overlay" style="display: none">
      <div class="dpt-popup-content">
        <button id="popup-close" class="dpt-popup-close">x</button>
        <a id="card-fr" class="dpt-lang-card" data-lang="fr">Français</a>
        <a id="card-es" class="dpt-lang-card" data-lang="es">Español</a>
      </div>
    </div>
    <button id="sidebar-trigger" class="dpt-sidebar-trigger">Menu</button>
    <div id="sidebar-overlay" class="dpt-sidebar-overlay" style="display: none"></div>
    <div id="sidebar" class="dpt-sidebar-panel" style="transform: translateX(-100%)">
      <button id="sidebar-close" class="dpt-sidebar-close">x</button>
      <a id="sidebar-it" class="dpt-sidebar-option dpt-lang-link" data-lang="it">Italiano</a>
    </div>
  </div>
  <p id="text">Welcome back</p>
</body></html>"#
    }
}

/// 会话构建器
pub struct TestEnvironment {
    pub translator: DynamicTranslator,
    pub transport: Rc<RecordingTransport>,
}

impl TestEnvironment {
    pub fn new(html: &str, transport: RecordingTransport, config: FrontendConfig) -> Self {
        let transport = Rc::new(transport);
        let translator = DynamicTranslator::new(
            config,
            Document::parse(html),
            transport.clone(),
            Url::parse("https://shop.example/catalog?page=2").expect("page url"),
        );
        Self {
            translator,
            transport,
        }
    }

    pub fn dropdown(transport: RecordingTransport) -> Self {
        Self::new(HtmlTestHelper::dropdown_page(), transport, test_config())
    }

    pub fn node(&self, id: &str) -> Handle {
        find_by_id(&self.translator.document().root(), id)
            .unwrap_or_else(|| panic!("no element with id {}", id))
    }

    pub fn elements(&self, tag: &str) -> Vec<Handle> {
        find_descendants(&self.translator.document().root(), |node| {
            get_node_name(node) == Some(tag)
        })
    }
}

pub fn test_config() -> FrontendConfig {
    FrontendConfig {
        ajax_url: "https://shop.example/wp-admin/admin-ajax.php".to_string(),
        nonce: "nonce-123".to_string(),
        default_lang: "en".to_string(),
        current_lang: "en".to_string(),
        ..FrontendConfig::default()
    }
}
