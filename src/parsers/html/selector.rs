//! 简单 CSS 选择器
//!
//! 支持复合简单选择器（`tag`、`#id`、`.class`、`[attr]`、`[attr="v"]`）、
//! 后代和子元素组合符（`header nav`、`#main > nav`）以及逗号分隔的选择器列表。
//! 不支持兄弟组合符和伪类。

use std::fmt;
use std::sync::OnceLock;

use markup5ever_rcdom::Handle;
use regex::Regex;

use super::dom::{find_descendants, get_node_attr, get_node_name, get_parent_node, has_class};

/// 选择器解析错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorError {
    pub selector: String,
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported selector '{}'", self.selector)
    }
}

impl std::error::Error for SelectorError {}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    Id(String),
    Class(String),
    HasAttr(String),
    AttrEquals(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// 由组合符连接的复合选择器，从左到右排列；
/// 每一步的组合符描述它和前一步的关系，第一步的组合符不使用
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    steps: Vec<(Combinator, Compound)>,
}

/// 已解析的选择器列表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

fn compound_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^(\*|[A-Za-z][A-Za-z0-9-]*)?((?:[#.][A-Za-z0-9_-]+|\[[A-Za-z0-9_:-]+(?:=(?:"[^"]*"|'[^']*'|[^\]"']*))?\])*)$"#,
        )
        .expect("compound selector pattern")
    })
}

fn condition_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"([#.])([A-Za-z0-9_-]+)|\[([A-Za-z0-9_:-]+)(?:=("[^"]*"|'[^']*'|[^\]"']*))?\]"#)
            .expect("selector condition pattern")
    })
}

impl Compound {
    fn parse(part: &str) -> Option<Self> {
        let captures = compound_regex().captures(part)?;
        let tag = captures
            .get(1)
            .map(|m| m.as_str().to_ascii_lowercase())
            .filter(|tag| tag != "*");
        let tail = captures.get(2).map_or("", |m| m.as_str());

        let conditions = condition_regex()
            .captures_iter(tail)
            .map(|c| match (c.get(1), c.get(2), c.get(3), c.get(4)) {
                (Some(kind), Some(name), _, _) if kind.as_str() == "#" => {
                    Condition::Id(name.as_str().to_string())
                }
                (Some(_), Some(name), _, _) => Condition::Class(name.as_str().to_string()),
                (_, _, Some(attr), Some(value)) => Condition::AttrEquals(
                    attr.as_str().to_string(),
                    value.as_str().trim_matches(|c| c == '"' || c == '\'').to_string(),
                ),
                (_, _, Some(attr), None) => Condition::HasAttr(attr.as_str().to_string()),
                _ => Condition::HasAttr(String::new()),
            })
            .collect::<Vec<_>>();

        if tag.is_none() && conditions.is_empty() && !part.starts_with('*') {
            return None;
        }
        Some(Self { tag, conditions })
    }

    fn matches(&self, node: &Handle) -> bool {
        let Some(name) = get_node_name(node) else {
            return false;
        };
        if let Some(ref tag) = self.tag {
            if !name.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        self.conditions.iter().all(|condition| match condition {
            Condition::Id(id) => get_node_attr(node, "id").as_deref() == Some(id.as_str()),
            Condition::Class(class) => has_class(node, class),
            Condition::HasAttr(attr) => get_node_attr(node, attr).is_some(),
            Condition::AttrEquals(attr, value) => {
                get_node_attr(node, attr).as_deref() == Some(value.as_str())
            }
        })
    }
}

/// 按空白和 `>` 切分；方括号内的内容（包括引号中的值）原样保留
fn split_steps(part: &str) -> Option<Vec<(Combinator, String)>> {
    let mut steps: Vec<(Combinator, String)> = Vec::new();
    let mut current = String::new();
    let mut pending: Option<Combinator> = None;
    let mut in_brackets = false;
    let mut quote: Option<char> = None;

    fn flush(
        steps: &mut Vec<(Combinator, String)>,
        current: &mut String,
        pending: &mut Option<Combinator>,
    ) -> Option<()> {
        if current.is_empty() {
            return Some(());
        }
        let combinator = if steps.is_empty() {
            Combinator::Descendant
        } else {
            pending.take()?
        };
        steps.push((combinator, std::mem::take(current)));
        Some(())
    }

    for c in part.chars() {
        if let Some(q) = quote {
            current.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' if in_brackets => {
                quote = Some(c);
                current.push(c);
            }
            '[' => {
                in_brackets = true;
                current.push(c);
            }
            ']' => {
                in_brackets = false;
                current.push(c);
            }
            '>' if !in_brackets => {
                flush(&mut steps, &mut current, &mut pending)?;
                if steps.is_empty() || pending == Some(Combinator::Child) {
                    return None;
                }
                pending = Some(Combinator::Child);
            }
            c if c.is_whitespace() && !in_brackets => {
                flush(&mut steps, &mut current, &mut pending)?;
                if !steps.is_empty() && pending.is_none() {
                    pending = Some(Combinator::Descendant);
                }
            }
            c => current.push(c),
        }
    }

    if in_brackets || quote.is_some() {
        return None;
    }
    flush(&mut steps, &mut current, &mut pending)?;
    if steps.is_empty() || pending == Some(Combinator::Child) {
        return None;
    }
    Some(steps)
}

impl Complex {
    fn parse(part: &str) -> Option<Self> {
        let steps = split_steps(part)?
            .into_iter()
            .map(|(combinator, text)| Compound::parse(&text).map(|compound| (combinator, compound)))
            .collect::<Option<Vec<_>>>()?;
        Some(Self { steps })
    }

    fn matches(&self, node: &Handle) -> bool {
        Self::matches_steps(&self.steps, node)
    }

    /// 从最右侧开始向祖先方向匹配
    fn matches_steps(steps: &[(Combinator, Compound)], node: &Handle) -> bool {
        let Some(((combinator, compound), rest)) = steps.split_last() else {
            return true;
        };
        if !compound.matches(node) {
            return false;
        }
        if rest.is_empty() {
            return true;
        }

        match combinator {
            Combinator::Child => {
                get_parent_node(node).is_some_and(|parent| Self::matches_steps(rest, &parent))
            }
            Combinator::Descendant => {
                let mut ancestor = get_parent_node(node);
                while let Some(current) = ancestor {
                    if Self::matches_steps(rest, &current) {
                        return true;
                    }
                    ancestor = get_parent_node(&current);
                }
                false
            }
        }
    }
}

impl Selector {
    pub fn parse(selector: &str) -> Result<Self, SelectorError> {
        let error = || SelectorError {
            selector: selector.to_string(),
        };

        let mut alternatives = Vec::new();
        for part in selector.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(error());
            }
            alternatives.push(Complex::parse(part).ok_or_else(error)?);
        }

        Ok(Self { alternatives })
    }

    /// 元素是否匹配任一备选项
    pub fn matches(&self, node: &Handle) -> bool {
        self.alternatives.iter().any(|complex| complex.matches(node))
    }

    /// 文档顺序返回 `root` 下所有匹配的后代元素
    pub fn select_all(&self, root: &Handle) -> Vec<Handle> {
        find_descendants(root, |node| self.matches(node))
    }

    pub fn select_first(&self, root: &Handle) -> Option<Handle> {
        self.select_all(root).into_iter().next()
    }
}
