//! URL 工具函数

pub use ::url::Url;

/// 设置查询参数：替换第一个同名参数并删除其余同名参数，不存在时追加到末尾
pub fn set_query_param(url: &Url, name: &str, value: &str) -> Url {
    let mut found = false;
    let mut pairs: Vec<(String, String)> = Vec::new();

    for (key, current) in url.query_pairs().into_owned() {
        if key == name {
            if !found {
                found = true;
                pairs.push((key, value.to_string()));
            }
        } else {
            pairs.push((key, current));
        }
    }

    if !found {
        pairs.push((name.to_string(), value.to_string()));
    }

    let mut result = url.clone();
    result.query_pairs_mut().clear().extend_pairs(pairs);
    result
}

/// 读取第一个同名查询参数
pub fn get_query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_missing_param() {
        let url = Url::parse("https://example.com/shop/").unwrap();
        let updated = set_query_param(&url, "lang", "it");
        assert_eq!(updated.as_str(), "https://example.com/shop/?lang=it");
    }

    #[test]
    fn test_replaces_in_place_and_keeps_fragment() {
        let url = Url::parse("https://example.com/?a=1&lang=en&b=2&lang=fr#top").unwrap();
        let updated = set_query_param(&url, "lang", "de");
        assert_eq!(updated.as_str(), "https://example.com/?a=1&lang=de&b=2#top");
        assert_eq!(get_query_param(&updated, "lang").as_deref(), Some("de"));
    }

    #[test]
    fn test_get_missing_param() {
        let url = Url::parse("https://example.com/?q=x").unwrap();
        assert_eq!(get_query_param(&url, "lang"), None);
    }
}
