//! 切换器初始化
//!
//! 自定义插入位置、无障碍属性和快捷键触发器查找。

use markup5ever_rcdom::Handle;

use crate::parsers::html::dom::{
    deep_clone, find_by_class, find_by_id, get_node_attr, hide, set_node_attr, show,
};
use crate::parsers::html::{Document, Selector};
use crate::translation::config::{constants, FrontendConfig, InsertMethod, UiStrings};

/// 快捷键 Alt+L 打开的触发器
const SHORTCUT_TRIGGER_SELECTOR: &str = ".dpt-dropdown-trigger, .dpt-popup-trigger, .dpt-sidebar-trigger";

/// 主切换器
pub fn find_switcher(document: &Document) -> Option<Handle> {
    find_by_id(&document.root(), constants::SWITCHER_ID)
}

/// 在配置的位置插入切换器副本，并隐藏原切换器。返回插入的副本。
///
/// 只有 `flag_position == "custom"` 且配置了位置时生效；无效选择器记录警告后跳过。
/// 一个选择器匹配多个目标时，每个目标各插入一份副本。
pub fn setup_custom_positions(
    document: &Document,
    switcher: &Handle,
    config: &FrontendConfig,
) -> Vec<Handle> {
    if !config.uses_custom_positions() {
        return Vec::new();
    }

    let mut clones = Vec::new();
    for position in &config.custom_positions {
        let selector = match Selector::parse(&position.selector) {
            Ok(selector) => selector,
            Err(e) => {
                tracing::warn!("跳过自定义位置 {:?}: {}", position.selector, e);
                continue;
            }
        };

        // 先确定目标再插入，副本本身不会成为目标
        let targets = selector.select_all(&document.root());
        if targets.is_empty() {
            tracing::debug!("自定义位置没有匹配元素: {}", position.selector);
        }

        for target in targets {
            let clone = deep_clone(switcher);
            show(&clone);
            match position.method {
                InsertMethod::Append => document.append_child(&target, clone.clone()),
                InsertMethod::Prepend => document.prepend_child(&target, clone.clone()),
                InsertMethod::After => document.insert_after(&target, clone.clone()),
                InsertMethod::Before => document.insert_before(&target, clone.clone()),
            }
            clones.push(clone);
        }
    }

    hide(switcher);
    clones
}

/// 切换器标记为导航区域，语言选项加上屏幕阅读器描述
pub fn setup_accessibility(document: &Document, strings: &UiStrings) {
    let root = document.root();

    for switcher in find_by_class(&root, constants::SWITCHER_CLASS) {
        set_node_attr(&switcher, "role", Some("navigation".to_string()));
        set_node_attr(&switcher, "aria-label", Some(strings.select_language.clone()));
    }

    for option in find_by_class(&root, "dpt-lang-option") {
        let lang = get_node_attr(&option, "data-lang").unwrap_or_default();
        set_node_attr(
            &option,
            "aria-label",
            Some(format!("{}: {}", strings.change_language, lang)),
        );
    }
}

/// 文档顺序中第一个下拉、弹出层或侧边栏触发器
pub fn find_shortcut_trigger(root: &Handle) -> Option<Handle> {
    Selector::parse(SHORTCUT_TRIGGER_SELECTOR).ok()?.select_first(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::dom::{find_descendants, get_node_name, get_parent_node, is_visible};
    use crate::translation::config::CustomPosition;

    const PAGE: &str = r#"<html><body>
        <header class="site-header"><nav id="nav">Menu</nav></header>
        <footer class="site-footer"><p>Footer</p></footer>
        <div id="dpt-language-switcher" class="dpt-language-switcher">
          <button class="dpt-popup-trigger">Lang</button>
          <ul><li class="dpt-lang-option" data-lang="it">Italiano</li></ul>
        </div>
    </body></html>"#;

    fn custom(positions: &[(&str, InsertMethod)]) -> FrontendConfig {
        FrontendConfig {
            flag_position: "custom".to_string(),
            custom_positions: positions
                .iter()
                .map(|(selector, method)| CustomPosition {
                    selector: selector.to_string(),
                    method: *method,
                })
                .collect(),
            ..FrontendConfig::default()
        }
    }

    #[test]
    fn test_custom_positions_insert_clones_and_hide_original() {
        let document = Document::parse(PAGE);
        let switcher = find_switcher(&document).unwrap();
        let config = custom(&[
            (".site-header", InsertMethod::Append),
            ("#nav", InsertMethod::Before),
            (".site-footer", InsertMethod::After),
        ]);

        let clones = setup_custom_positions(&document, &switcher, &config);
        assert_eq!(clones.len(), 3);
        assert!(!is_visible(&switcher));
        assert!(clones.iter().all(is_visible));

        let header = find_descendants(&document.root(), |n| get_node_name(n) == Some("header"));
        let children: Vec<Handle> = header[0]
            .children
            .borrow()
            .iter()
            .filter(|c| get_node_name(c).is_some())
            .cloned()
            .collect();
        // before #nav，然后 #nav，最后 append 的副本
        assert!(std::rc::Rc::ptr_eq(&children[0], &clones[1]));
        assert_eq!(get_node_attr(&children[1], "id").as_deref(), Some("nav"));
        assert!(std::rc::Rc::ptr_eq(&children[2], &clones[0]));

        assert_eq!(find_by_class(&document.root(), constants::SWITCHER_CLASS).len(), 4);
    }

    #[test]
    fn test_invalid_selector_is_skipped() {
        let document = Document::parse(PAGE);
        let switcher = find_switcher(&document).unwrap();
        let config = custom(&[("###", InsertMethod::Append), ("#nav", InsertMethod::Prepend)]);

        let clones = setup_custom_positions(&document, &switcher, &config);
        assert_eq!(clones.len(), 1);
        assert!(!is_visible(&switcher));
    }

    #[test]
    fn test_combinator_selectors_mount_clones() {
        let document = Document::parse(PAGE);
        let switcher = find_switcher(&document).unwrap();
        let config = custom(&[
            ("header.site-header > nav", InsertMethod::After),
            ("body footer p", InsertMethod::Append),
            ("footer > nav", InsertMethod::Append),
        ]);

        let clones = setup_custom_positions(&document, &switcher, &config);
        assert_eq!(clones.len(), 2);
        assert!(!is_visible(&switcher));

        let nav = find_by_id(&document.root(), "nav").unwrap();
        assert!(std::rc::Rc::ptr_eq(&get_parent_node(&clones[0]).unwrap(), &get_parent_node(&nav).unwrap()));
        let paragraph = find_descendants(&document.root(), |n| get_node_name(n) == Some("p")).remove(0);
        assert!(std::rc::Rc::ptr_eq(&get_parent_node(&clones[1]).unwrap(), &paragraph));
    }

    #[test]
    fn test_non_custom_position_does_nothing() {
        let document = Document::parse(PAGE);
        let switcher = find_switcher(&document).unwrap();
        let mut config = custom(&[("#nav", InsertMethod::Append)]);
        config.flag_position = "top-right".to_string();

        assert!(setup_custom_positions(&document, &switcher, &config).is_empty());
        assert!(is_visible(&switcher));
    }

    #[test]
    fn test_accessibility_attributes() {
        let document = Document::parse(PAGE);
        setup_accessibility(&document, &UiStrings::default());

        let switcher = find_by_id(&document.root(), "dpt-language-switcher").unwrap();
        assert_eq!(get_node_attr(&switcher, "role").as_deref(), Some("navigation"));
        assert_eq!(get_node_attr(&switcher, "aria-label").as_deref(), Some("Select language"));

        let option = find_by_class(&document.root(), "dpt-lang-option").remove(0);
        assert_eq!(
            get_node_attr(&option, "aria-label").as_deref(),
            Some("Change language: it")
        );
    }

    #[test]
    fn test_shortcut_trigger_is_first_in_document_order() {
        let document = Document::parse(
            r#"<body><button class="dpt-sidebar-trigger" id="a"></button>
               <button class="dpt-dropdown-trigger" id="b"></button></body>"#,
        );
        let trigger = find_shortcut_trigger(&document.root()).unwrap();
        assert_eq!(get_node_attr(&trigger, "id").as_deref(), Some("a"));

        let empty = Document::parse("<body><p>none</p></body>");
        assert!(find_shortcut_trigger(&empty.root()).is_none());
    }
}
