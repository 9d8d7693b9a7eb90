//! 文本收集器模块
//!
//! 从DOM子树中收集可翻译的文本节点，以及整页翻译时的纯文本元素

use markup5ever_rcdom::{Handle, NodeData};

use super::queue::is_meaningful;
use crate::parsers::html::dom::{
    element_children, find_descendants, get_node_name, has_class, text_content,
};
use crate::translation::config::constants;

#[derive(Debug, Clone)]
pub struct TextCollector {
    skip_elements: Vec<String>,
}

impl Default for TextCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl TextCollector {
    pub fn new() -> Self {
        Self {
            skip_elements: constants::SKIP_ELEMENTS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// 深度优先、文档顺序地收集 `root` 下修剪后长度足够的文本节点
    pub fn collect_text_nodes(&self, root: &Handle) -> Vec<Handle> {
        let mut nodes = Vec::new();
        if self.should_skip(root) {
            return nodes;
        }
        self.walk(root, &mut nodes);
        nodes
    }

    fn walk(&self, node: &Handle, nodes: &mut Vec<Handle>) {
        for child in node.children.borrow().iter() {
            match child.data {
                NodeData::Text { ref contents } => {
                    if is_meaningful(&contents.borrow()) {
                        nodes.push(child.clone());
                    }
                }
                NodeData::Element { .. } => {
                    if !self.should_skip(child) {
                        self.walk(child, nodes);
                    }
                }
                _ => {}
            }
        }
    }

    fn should_skip(&self, node: &Handle) -> bool {
        get_node_name(node).map_or(false, |name| self.skip_elements.iter().any(|skip| skip == name))
    }

    /// 整页翻译的候选元素：常见文本标签、不是切换器本身、没有子元素且文本足够长。
    /// 返回元素及其修剪后的文本。
    pub fn collect_page_elements(&self, root: &Handle) -> Vec<(Handle, String)> {
        find_descendants(root, |node| {
            get_node_name(node).map_or(false, |name| constants::BULK_TEXT_TAGS.contains(&name))
                && !constants::BULK_EXCLUDED_CLASSES
                    .iter()
                    .any(|class| has_class(node, class))
                && element_children(node).is_empty()
        })
        .into_iter()
        .filter_map(|node| {
            let text = text_content(&node).trim().to_string();
            is_meaningful(&text).then_some((node, text))
        })
        .collect()
    }
}

/// 文档中所有文本节点（不过滤）
pub fn all_text_nodes(root: &Handle) -> Vec<Handle> {
    let mut nodes = Vec::new();
    collect_all(root, &mut nodes);
    nodes
}

fn collect_all(node: &Handle, nodes: &mut Vec<Handle>) {
    for child in node.children.borrow().iter() {
        if let NodeData::Text { .. } = child.data {
            nodes.push(child.clone());
        } else {
            collect_all(child, nodes);
        }
    }
}
