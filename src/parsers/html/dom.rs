use std::cell::RefCell;

use encoding_rs::Encoding;
use html5ever::interface::{Attribute, QualName};
use html5ever::parse_document;
use html5ever::tendril::{format_tendril, StrTendril, TendrilSink};
use html5ever::{namespace_url, ns, LocalName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom};

/// 将 HTML 字节转换为 DOM
pub fn html_to_dom(data: &[u8], document_encoding: String) -> RcDom {
    let s: String = if let Some(encoding) = Encoding::for_label(document_encoding.as_bytes()) {
        let (string, _, _) = encoding.decode(data);
        string.to_string()
    } else {
        String::from_utf8_lossy(data).to_string()
    };

    parse_document(RcDom::default(), Default::default()).one(s)
}

/// 查找指定路径的DOM节点
pub fn find_nodes(node: &Handle, node_names: Vec<&str>) -> Vec<Handle> {
    let mut found_nodes = Vec::new();
    let Some(node_name) = node_names.first().copied() else {
        return found_nodes;
    };

    if node_names.len() == 1 {
        if let NodeData::Element { ref name, .. } = node.data {
            if &*name.local == node_name {
                found_nodes.push(node.clone());
            }
        }

        for child_node in node.children.borrow().iter() {
            found_nodes.append(&mut find_nodes(child_node, node_names.clone()));
        }
    } else if let NodeData::Element { ref name, .. } = node.data {
        if &*name.local == node_name {
            let mut new_node_names = node_names;
            new_node_names.remove(0);
            found_nodes.append(&mut find_nodes(node, new_node_names));
        } else {
            for child_node in node.children.borrow().iter() {
                found_nodes.append(&mut find_nodes(child_node, node_names.clone()));
            }
        }
    } else {
        for child_node in node.children.borrow().iter() {
            found_nodes.append(&mut find_nodes(child_node, node_names.clone()));
        }
    }

    found_nodes
}

/// 根据名称获取子节点
pub fn get_child_node_by_name(parent: &Handle, node_name: &str) -> Option<Handle> {
    let children = parent.children.borrow();
    let matching_children = children.iter().find(|child| match child.data {
        NodeData::Element { ref name, .. } => &*name.local == node_name,
        _ => false,
    });
    matching_children.cloned()
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => {
            for attr in attrs.borrow().iter() {
                if &*attr.name.local == attr_name {
                    return Some(attr.value.to_string());
                }
            }
            None
        }
        _ => None,
    }
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 获取父节点
///
/// rcdom 把父指针存在 `Cell` 里，读取时需要先取出再放回。
pub fn get_parent_node(child: &Handle) -> Option<Handle> {
    let weak = child.parent.take();
    let parent = weak.as_ref().and_then(|node| node.upgrade());
    child.parent.set(weak);
    parent
}

/// 设置节点属性
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: Option<String>) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let attrs_mut = &mut attrs.borrow_mut();
        let mut i = 0;
        let mut found_existing_attr: bool = false;

        while i < attrs_mut.len() {
            if &attrs_mut[i].name.local == attr_name {
                found_existing_attr = true;

                if let Some(attr_value) = attr_value.clone() {
                    attrs_mut[i].value.clear();
                    attrs_mut[i].value.push_slice(attr_value.as_str());
                } else {
                    // Remove attr completely if attr_value is not defined
                    attrs_mut.remove(i);
                    continue;
                }
            }

            i += 1;
        }

        if !found_existing_attr {
            if let Some(attr_value) = attr_value {
                let name = LocalName::from(attr_name);

                attrs_mut.push(Attribute {
                    name: QualName::new(None, ns!(), name),
                    value: format_tendril!("{}", attr_value),
                });
            }
        }
    };
}

pub fn is_element(node: &Handle) -> bool {
    matches!(node.data, NodeData::Element { .. })
}

pub fn is_text(node: &Handle) -> bool {
    matches!(node.data, NodeData::Text { .. })
}

/// 子元素（不含文本、注释节点）
pub fn element_children(node: &Handle) -> Vec<Handle> {
    node.children
        .borrow()
        .iter()
        .filter(|child| is_element(child))
        .cloned()
        .collect()
}

/// 节点是否为 `ancestor` 本身或其后代
pub fn is_inclusive_descendant(node: &Handle, ancestor: &Handle) -> bool {
    let mut current = Some(node.clone());
    while let Some(candidate) = current {
        if std::rc::Rc::ptr_eq(&candidate, ancestor) {
            return true;
        }
        current = get_parent_node(&candidate);
    }
    false
}

// ============================================================================
// class / style 辅助函数
// ============================================================================

pub fn has_class(node: &Handle, class_name: &str) -> bool {
    get_node_attr(node, "class")
        .map(|classes| classes.split_whitespace().any(|c| c == class_name))
        .unwrap_or(false)
}

pub fn add_class(node: &Handle, class_name: &str) {
    if !is_element(node) || has_class(node, class_name) {
        return;
    }
    let classes = match get_node_attr(node, "class") {
        Some(existing) if !existing.trim().is_empty() => {
            format!("{} {}", existing.trim(), class_name)
        }
        _ => class_name.to_string(),
    };
    set_node_attr(node, "class", Some(classes));
}

pub fn remove_class(node: &Handle, class_name: &str) {
    if let Some(existing) = get_node_attr(node, "class") {
        let remaining: Vec<&str> = existing
            .split_whitespace()
            .filter(|c| *c != class_name)
            .collect();
        set_node_attr(node, "class", Some(remaining.join(" ")));
    }
}

/// 读取内联样式中的属性值
pub fn get_style_property(node: &Handle, property: &str) -> Option<String> {
    let style = get_node_attr(node, "style")?;
    style.split(';').find_map(|declaration| {
        let (name, value) = declaration.split_once(':')?;
        if name.trim().eq_ignore_ascii_case(property) {
            Some(value.trim().to_string())
        } else {
            None
        }
    })
}

/// 设置或移除（`None`）内联样式属性，保留其余声明的顺序
pub fn set_style_property(node: &Handle, property: &str, value: Option<&str>) {
    if !is_element(node) {
        return;
    }

    let mut declarations: Vec<(String, String)> = get_node_attr(node, "style")
        .unwrap_or_default()
        .split(';')
        .filter_map(|declaration| {
            let (name, value) = declaration.split_once(':')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .collect();

    let position = declarations
        .iter()
        .position(|(name, _)| name.eq_ignore_ascii_case(property));

    match (position, value) {
        (Some(i), Some(v)) => declarations[i].1 = v.to_string(),
        (Some(i), None) => {
            declarations.remove(i);
        }
        (None, Some(v)) => declarations.push((property.to_string(), v.to_string())),
        (None, None) => {}
    }

    if declarations.is_empty() {
        set_node_attr(node, "style", None);
    } else {
        let style = declarations
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect::<Vec<_>>()
            .join("; ");
        set_node_attr(node, "style", Some(style));
    }
}

/// `display: none` 或 `hidden` 属性视为不可见
pub fn is_visible(node: &Handle) -> bool {
    if get_node_attr(node, "hidden").is_some() {
        return false;
    }
    get_style_property(node, "display").map_or(true, |display| display != "none")
}

pub fn show(node: &Handle) {
    set_node_attr(node, "hidden", None);
    set_style_property(node, "display", None);
}

pub fn hide(node: &Handle) {
    set_style_property(node, "display", Some("none"));
}

pub fn toggle(node: &Handle) {
    if is_visible(node) {
        hide(node);
    } else {
        show(node);
    }
}

// ============================================================================
// 文本内容
// ============================================================================

/// 与 `textContent` 相同：拼接所有后代文本节点
pub fn text_content(node: &Handle) -> String {
    let mut buf = String::new();
    collect_text(node, &mut buf);
    buf
}

fn collect_text(node: &Handle, buf: &mut String) {
    match node.data {
        NodeData::Text { ref contents } => buf.push_str(&contents.borrow()),
        _ => {
            for child in node.children.borrow().iter() {
                collect_text(child, buf);
            }
        }
    }
}

/// 覆盖节点文本：文本节点直接替换内容，元素节点替换为单个文本子节点
pub fn set_text_content(node: &Handle, text: &str) {
    match node.data {
        NodeData::Text { ref contents } => {
            let mut content_ref = contents.borrow_mut();
            content_ref.clear();
            content_ref.push_slice(text);
        }
        NodeData::Element { .. } => {
            for child in node.children.borrow_mut().drain(..) {
                child.parent.set(None);
            }
            if !text.is_empty() {
                let text_node = create_text_node(text);
                text_node.parent.set(Some(std::rc::Rc::downgrade(node)));
                node.children.borrow_mut().push(text_node);
            }
        }
        _ => {}
    }
}

// ============================================================================
// 节点构造
// ============================================================================

pub fn create_text_node(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from_slice(text)),
    })
}

pub fn create_element(tag_name: &str, attrs: &[(&str, &str)]) -> Handle {
    Node::new(NodeData::Element {
        name: QualName::new(None, ns!(html), LocalName::from(tag_name)),
        attrs: RefCell::new(
            attrs
                .iter()
                .map(|(name, value)| Attribute {
                    name: QualName::new(None, ns!(), LocalName::from(*name)),
                    value: format_tendril!("{}", value),
                })
                .collect(),
        ),
        template_contents: RefCell::new(None),
        mathml_annotation_xml_integration_point: false,
    })
}

/// 深拷贝一个子树（新子树没有父节点）
pub fn deep_clone(node: &Handle) -> Handle {
    let copy = match node.data {
        NodeData::Element {
            ref name,
            ref attrs,
            ref template_contents,
            mathml_annotation_xml_integration_point,
        } => Node::new(NodeData::Element {
            name: name.clone(),
            attrs: RefCell::new(attrs.borrow().clone()),
            template_contents: RefCell::new(
                template_contents.borrow().as_ref().map(deep_clone),
            ),
            mathml_annotation_xml_integration_point,
        }),
        NodeData::Text { ref contents } => Node::new(NodeData::Text {
            contents: RefCell::new(contents.borrow().clone()),
        }),
        NodeData::Comment { ref contents } => Node::new(NodeData::Comment {
            contents: contents.clone(),
        }),
        NodeData::Doctype {
            ref name,
            ref public_id,
            ref system_id,
        } => Node::new(NodeData::Doctype {
            name: name.clone(),
            public_id: public_id.clone(),
            system_id: system_id.clone(),
        }),
        NodeData::ProcessingInstruction {
            ref target,
            ref contents,
        } => Node::new(NodeData::ProcessingInstruction {
            target: target.clone(),
            contents: contents.clone(),
        }),
        NodeData::Document => Node::new(NodeData::Document),
    };

    for child in node.children.borrow().iter() {
        let child_copy = deep_clone(child);
        child_copy.parent.set(Some(std::rc::Rc::downgrade(&copy)));
        copy.children.borrow_mut().push(child_copy);
    }

    copy
}

// ============================================================================
// 查询
// ============================================================================

/// 深度优先、文档顺序地收集满足条件的后代元素（不含 `root` 本身）
pub fn find_descendants<F>(root: &Handle, predicate: F) -> Vec<Handle>
where
    F: Fn(&Handle) -> bool,
{
    let mut found = Vec::new();
    walk_descendants(root, &predicate, &mut found);
    found
}

fn walk_descendants<F>(node: &Handle, predicate: &F, found: &mut Vec<Handle>)
where
    F: Fn(&Handle) -> bool,
{
    for child in node.children.borrow().iter() {
        if is_element(child) && predicate(child) {
            found.push(child.clone());
        }
        walk_descendants(child, predicate, found);
    }
}

pub fn find_by_class(root: &Handle, class_name: &str) -> Vec<Handle> {
    find_descendants(root, |node| has_class(node, class_name))
}

pub fn find_first_by_class(root: &Handle, class_name: &str) -> Option<Handle> {
    find_by_class(root, class_name).into_iter().next()
}

/// 从 `node` 本身开始向上查找第一个满足条件的元素
pub fn closest<F>(node: &Handle, predicate: F) -> Option<Handle>
where
    F: Fn(&Handle) -> bool,
{
    let mut current = Some(node.clone());
    while let Some(candidate) = current {
        if is_element(&candidate) && predicate(&candidate) {
            return Some(candidate);
        }
        current = get_parent_node(&candidate);
    }
    None
}

pub fn find_by_id(root: &Handle, id: &str) -> Option<Handle> {
    find_descendants(root, |node| get_node_attr(node, "id").as_deref() == Some(id))
        .into_iter()
        .next()
}
