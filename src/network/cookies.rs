//! Cookie 处理
//!
//! 页面级 cookie 存储：按名称保存当前值，并能渲染出
//! `document.cookie` 赋值所用的字符串。

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub max_age: Option<Duration>,
}

impl Cookie {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            path: "/".to_string(),
            max_age: None,
        }
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}; path={}", self.name, self.value, self.path)?;
        if let Some(max_age) = self.max_age {
            write!(f, "; max-age={}", max_age.as_secs())?;
        }
        Ok(())
    }
}

/// 以名称为键的 cookie 集合，后写覆盖先写
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: BTreeMap<String, Cookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, cookie: Cookie) {
        self.cookies.insert(cookie.name.clone(), cookie);
    }

    pub fn get(&self, name: &str) -> Option<&Cookie> {
        self.cookies.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(|cookie| cookie.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// `document.cookie` 读取形式：`a=1; b=2`
    pub fn header_value(&self) -> String {
        self.cookies
            .values()
            .map(|cookie| format!("{}={}", cookie.name, cookie.value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// 解析 `name=value; name2=value2` 形式的 cookie 串
pub fn parse_cookie_header(header: &str) -> CookieJar {
    let mut jar = CookieJar::new();
    for pair in header.split(';') {
        if let Some((name, value)) = pair.split_once('=') {
            let name = name.trim();
            if !name.is_empty() {
                jar.set(Cookie::new(name, value.trim()));
            }
        }
    }
    jar
}
