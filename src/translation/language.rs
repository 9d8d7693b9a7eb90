//! 当前语言
//!
//! 会话内共享的可变语言代码。只有语言切换成功后才会被修改。

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct CurrentLanguage(Rc<RefCell<String>>);

impl CurrentLanguage {
    pub fn new(code: &str) -> Self {
        Self(Rc::new(RefCell::new(code.to_string())))
    }

    pub fn get(&self) -> String {
        self.0.borrow().clone()
    }

    pub fn is(&self, code: &str) -> bool {
        *self.0.borrow() == code
    }

    /// 替换并返回旧值
    pub fn replace(&self, code: &str) -> String {
        self.0.replace(code.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let language = CurrentLanguage::new("en");
        let other = language.clone();
        assert_eq!(other.replace("it"), "en");
        assert!(language.is("it"));
        assert_eq!(language.get(), "it");
    }
}
