//! 翻译缓存键
//!
//! 后端按缓存键查找已有的翻译结果，键必须和站点其它客户端生成的完全一致：
//! 对 `content + source_lang + target_lang` 的 UTF-16 编码单元做 32 位滚动哈希，
//! 取绝对值后以 36 进制输出。

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// 生成缓存键
    pub fn generate(content: &str, source_lang: &str, target_lang: &str) -> Self {
        let hash = [content, source_lang, target_lang]
            .iter()
            .flat_map(|part| part.encode_utf16())
            .fold(0i32, |hash, unit| {
                hash.wrapping_shl(5)
                    .wrapping_sub(hash)
                    .wrapping_add(i32::from(unit))
            });

        Self(to_base36(i64::from(hash).unsigned_abs()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        // "a" = 97 → "2p"
        assert_eq!(CacheKey::generate("a", "", "").as_str(), "2p");
        // "abc" = 96354 → "22ci"
        assert_eq!(CacheKey::generate("ab", "c", "").as_str(), "22ci");
        assert_eq!(CacheKey::generate("", "", "").as_str(), "0");
    }

    #[test]
    fn test_wrapping_and_negative_hashes() {
        // 长文本会溢出 32 位并可能得到负值，结果仍然是非负的 36 进制串
        let key = CacheKey::generate(&"Lorem ipsum dolor sit amet ".repeat(20), "en", "it");
        assert!(key.as_str().chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert!(key.as_str().len() <= 7);
    }

    #[test]
    fn test_deterministic_and_order_sensitive() {
        let a = CacheKey::generate("Hello world", "en", "it");
        let b = CacheKey::generate("Hello world", "en", "it");
        let c = CacheKey::generate("Hello world", "it", "en");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_utf16_units() {
        // 非 BMP 字符按两个代理项计算
        let emoji = CacheKey::generate("😀", "", "");
        let expected = {
            let hi = 0xD83Di64;
            let lo = 0xDE00i64;
            to_base36((hi * 31 + lo) as u64)
        };
        assert_eq!(emoji.as_str(), expected);
    }
}
