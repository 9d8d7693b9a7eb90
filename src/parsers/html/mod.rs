//! HTML解析和处理模块
//!
//! - `dom`: 基础DOM操作（属性、class、样式、文本）
//! - `document`: 可观察的文档包装，分发结构变更记录
//! - `selector`: 简单 CSS 选择器
//! - `serializer`: 序列化功能

pub mod document;
pub mod dom;
pub mod selector;
pub mod serializer;

pub use document::{Document, MutationObserver, MutationRecord};
pub use dom::{
    add_class, closest, create_element, create_text_node, deep_clone, element_children, find_by_class,
    find_by_id, find_descendants, find_first_by_class, find_nodes, get_child_node_by_name,
    get_node_attr, get_node_name, get_parent_node, has_class, hide, html_to_dom, is_element,
    is_inclusive_descendant, is_text, is_visible, remove_class, set_node_attr, set_style_property,
    set_text_content, show, text_content,
};
pub use selector::{Selector, SelectorError};
pub use serializer::serialize_document;
