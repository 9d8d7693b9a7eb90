//! 页面级状态
//!
//! 浏览器中由 `location`、`document.cookie`、`history` 和焦点提供的状态，
//! 在这里显式保存，便于检查和测试。

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use markup5ever_rcdom::Handle;

use crate::network::{Cookie, CookieJar};
use crate::utils::url::{set_query_param, Url};

/// 当前获得焦点的元素
#[derive(Debug, Clone, Default)]
pub struct FocusTracker(Rc<RefCell<Option<Handle>>>);

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus(&self, node: &Handle) {
        *self.0.borrow_mut() = Some(node.clone());
    }

    pub fn blur(&self) {
        *self.0.borrow_mut() = None;
    }

    pub fn focused(&self) -> Option<Handle> {
        self.0.borrow().clone()
    }

    pub fn is_focused(&self, node: &Handle) -> bool {
        self.0
            .borrow()
            .as_ref()
            .map_or(false, |focused| Rc::ptr_eq(focused, node))
    }
}

#[derive(Debug)]
pub struct PageState {
    url: RefCell<Url>,
    cookies: RefCell<CookieJar>,
    reload_requested: Cell<bool>,
    focus: FocusTracker,
}

impl PageState {
    pub fn new(url: Url) -> Self {
        Self {
            url: RefCell::new(url),
            cookies: RefCell::new(CookieJar::new()),
            reload_requested: Cell::new(false),
            focus: FocusTracker::new(),
        }
    }

    pub fn with_cookies(self, cookies: CookieJar) -> Self {
        *self.cookies.borrow_mut() = cookies;
        self
    }

    pub fn url(&self) -> Url {
        self.url.borrow().clone()
    }

    /// 原地替换查询参数（不产生新的历史记录）
    pub fn replace_query_param(&self, name: &str, value: &str) {
        let updated = set_query_param(&self.url.borrow(), name, value);
        *self.url.borrow_mut() = updated;
    }

    pub fn set_cookie(&self, cookie: Cookie) {
        tracing::debug!("设置 cookie: {}", cookie);
        self.cookies.borrow_mut().set(cookie);
    }

    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.borrow().value(name).map(str::to_string)
    }

    pub fn cookies(&self) -> CookieJar {
        self.cookies.borrow().clone()
    }

    pub fn request_reload(&self) {
        self.reload_requested.set(true);
    }

    pub fn reload_requested(&self) -> bool {
        self.reload_requested.get()
    }

    pub fn focus(&self) -> &FocusTracker {
        &self.focus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::dom::create_element;

    #[test]
    fn test_query_param_replacement() {
        let page = PageState::new(Url::parse("https://example.com/blog?lang=en&page=2").unwrap());
        page.replace_query_param("lang", "it");
        assert_eq!(page.url().as_str(), "https://example.com/blog?lang=it&page=2");
    }

    #[test]
    fn test_focus_tracking() {
        let focus = FocusTracker::new();
        let a = create_element("a", &[]);
        let b = create_element("a", &[]);
        focus.focus(&a);
        assert!(focus.is_focused(&a));
        assert!(!focus.is_focused(&b));
        focus.blur();
        assert!(focus.focused().is_none());
    }
}
