//! 可观察的文档
//!
//! 包装 `RcDom`，所有结构性修改都通过这里进行，
//! 并把插入/移除记录分发给已注册的观察者（相当于浏览器的 MutationObserver）。

use std::cell::RefCell;
use std::rc::Rc;

use markup5ever_rcdom::{Handle, RcDom};

use super::dom::{
    get_child_node_by_name, get_parent_node, html_to_dom, is_inclusive_descendant,
};
use super::serializer::serialize_document;

/// 一次结构修改的记录
#[derive(Debug, Clone)]
pub struct MutationRecord {
    /// 子节点列表发生变化的节点
    pub target: Handle,
    pub added_nodes: Vec<Handle>,
    pub removed_nodes: Vec<Handle>,
}

/// DOM 变更观察者
pub trait MutationObserver {
    fn on_mutations(&self, records: &[MutationRecord]);
}

pub struct Document {
    dom: RcDom,
    observers: RefCell<Vec<Rc<dyn MutationObserver>>>,
}

impl Document {
    pub fn from_dom(dom: RcDom) -> Self {
        Self {
            dom,
            observers: RefCell::new(Vec::new()),
        }
    }

    pub fn parse(html: &str) -> Self {
        Self::from_dom(html_to_dom(html.as_bytes(), "utf-8".to_string()))
    }

    pub fn from_bytes(data: &[u8], document_encoding: String) -> Self {
        Self::from_dom(html_to_dom(data, document_encoding))
    }

    /// 文档根节点
    pub fn root(&self) -> Handle {
        self.dom.document.clone()
    }

    pub fn html(&self) -> Option<Handle> {
        get_child_node_by_name(&self.dom.document, "html")
    }

    pub fn head(&self) -> Option<Handle> {
        self.html().and_then(|html| get_child_node_by_name(&html, "head"))
    }

    pub fn body(&self) -> Option<Handle> {
        self.html().and_then(|html| get_child_node_by_name(&html, "body"))
    }

    /// 注册观察者；只有 body 子树内的变更会被分发
    pub fn observe(&self, observer: Rc<dyn MutationObserver>) {
        self.observers.borrow_mut().push(observer);
    }

    pub fn append_child(&self, parent: &Handle, child: Handle) {
        self.insert_at(parent, None, child);
    }

    pub fn prepend_child(&self, parent: &Handle, child: Handle) {
        self.insert_at(parent, Some(0), child);
    }

    /// 插入到 `reference` 之前；`reference` 没有父节点时不做任何事
    pub fn insert_before(&self, reference: &Handle, node: Handle) {
        if Rc::ptr_eq(reference, &node) {
            return;
        }
        if let Some(parent) = get_parent_node(reference) {
            // 位置要在摘除之后计算，同一父节点内后移时下标会变
            Self::detach(&node);
            let index = Self::index_in_parent(&parent, reference);
            self.insert_at(&parent, index, node);
        }
    }

    pub fn insert_after(&self, reference: &Handle, node: Handle) {
        if Rc::ptr_eq(reference, &node) {
            return;
        }
        if let Some(parent) = get_parent_node(reference) {
            Self::detach(&node);
            let index = Self::index_in_parent(&parent, reference).map(|i| i + 1);
            self.insert_at(&parent, index, node);
        }
    }

    pub fn remove(&self, node: &Handle) {
        let Some(parent) = get_parent_node(node) else {
            return;
        };
        let Some(index) = Self::index_in_parent(&parent, node) else {
            return;
        };
        let removed = parent.children.borrow_mut().remove(index);
        removed.parent.set(None);

        self.notify(MutationRecord {
            target: parent,
            added_nodes: Vec::new(),
            removed_nodes: vec![removed],
        });
    }

    pub fn serialize(&self) -> std::io::Result<Vec<u8>> {
        serialize_document(&self.dom, String::new())
    }

    pub fn serialize_with_encoding(&self, document_encoding: String) -> std::io::Result<Vec<u8>> {
        serialize_document(&self.dom, document_encoding)
    }

    fn index_in_parent(parent: &Handle, child: &Handle) -> Option<usize> {
        parent
            .children
            .borrow()
            .iter()
            .position(|c| Rc::ptr_eq(c, child))
    }

    /// 从旧位置摘除，不通知观察者
    fn detach(child: &Handle) {
        if let Some(old_parent) = get_parent_node(child) {
            if let Some(i) = Self::index_in_parent(&old_parent, child) {
                old_parent.children.borrow_mut().remove(i);
            }
        }
        child.parent.set(None);
    }

    fn insert_at(&self, parent: &Handle, index: Option<usize>, child: Handle) {
        Self::detach(&child);

        child.parent.set(Some(Rc::downgrade(parent)));
        {
            let mut children = parent.children.borrow_mut();
            let index = index.unwrap_or(children.len()).min(children.len());
            children.insert(index, child.clone());
        }

        self.notify(MutationRecord {
            target: parent.clone(),
            added_nodes: vec![child],
            removed_nodes: Vec::new(),
        });
    }

    fn notify(&self, record: MutationRecord) {
        let Some(body) = self.body() else {
            return;
        };
        if !is_inclusive_descendant(&record.target, &body) {
            return;
        }

        // 回调中可能再次修改文档，先释放借用
        let observers: Vec<Rc<dyn MutationObserver>> = self.observers.borrow().clone();
        let records = [record];
        for observer in observers {
            observer.on_mutations(&records);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::dom::{create_element, find_by_id, get_node_attr, get_node_name};
    use std::cell::Cell;

    #[derive(Default)]
    struct Counter {
        added: Cell<usize>,
        removed: Cell<usize>,
    }

    impl MutationObserver for Counter {
        fn on_mutations(&self, records: &[MutationRecord]) {
            for record in records {
                self.added.set(self.added.get() + record.added_nodes.len());
                self.removed.set(self.removed.get() + record.removed_nodes.len());
            }
        }
    }

    #[test]
    fn test_observer_sees_body_mutations_only() {
        let document = Document::parse("<html><head></head><body><div id=\"a\"></div></body></html>");
        let counter = Rc::new(Counter::default());
        document.observe(counter.clone());

        let head = document.head().unwrap();
        document.append_child(&head, create_element("meta", &[]));
        assert_eq!(counter.added.get(), 0);

        let a = find_by_id(&document.root(), "a").unwrap();
        document.append_child(&a, create_element("span", &[]));
        document.insert_before(&a, create_element("p", &[]));
        assert_eq!(counter.added.get(), 2);

        document.remove(&a);
        assert_eq!(counter.removed.get(), 1);
    }

    #[test]
    fn test_insert_positions() {
        let document = Document::parse(r#"<body><div id="x"></div></body>"#);
        let x = find_by_id(&document.root(), "x").unwrap();
        let body = document.body().unwrap();

        document.insert_after(&x, create_element("section", &[]));
        document.prepend_child(&body, create_element("header", &[]));

        let names: Vec<String> = body
            .children
            .borrow()
            .iter()
            .filter_map(|c| get_node_name(c).map(str::to_string))
            .collect();
        assert_eq!(names, vec!["header", "div", "section"]);
    }

    fn child_ids(node: &Handle) -> Vec<String> {
        node.children
            .borrow()
            .iter()
            .filter_map(|c| get_node_attr(c, "id"))
            .collect()
    }

    #[test]
    fn test_move_within_same_parent() {
        let document = Document::parse(
            r#"<body><p id="a"></p><p id="b"></p><p id="c"></p></body>"#,
        );
        let body = document.body().unwrap();
        let node = |id: &str| find_by_id(&document.root(), id).unwrap();

        document.insert_before(&node("c"), node("a"));
        assert_eq!(child_ids(&body), vec!["b", "a", "c"]);

        document.insert_after(&node("b"), node("c"));
        assert_eq!(child_ids(&body), vec!["b", "c", "a"]);

        document.insert_after(&node("a"), node("b"));
        assert_eq!(child_ids(&body), vec!["c", "a", "b"]);

        document.insert_before(&node("a"), node("a"));
        assert_eq!(child_ids(&body), vec!["c", "a", "b"]);

        document.prepend_child(&body, node("b"));
        assert_eq!(child_ids(&body), vec!["b", "c", "a"]);
    }
}
