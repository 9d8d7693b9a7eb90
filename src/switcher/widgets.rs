//! 切换器外壳模块
//!
//! 切换器有五种外观：下拉菜单、弹出层、侧边栏、圆形菜单和极简选择器。
//! 每种外观在切换器容器里查找自己的触发器、面板、遮罩和关闭按钮，
//! 缺少必需元素时跳过绑定。
//!
//! # 架构设计
//!
//! - `WidgetShell` trait 定义统一的打开、关闭和事件处理接口
//! - 各种外壳分别实现该trait
//! - `ShellRegistry` 管理已绑定的外壳，按冒泡顺序分发点击和按键
//!
//! 点击分两个阶段：先是元素级处理（触发器、关闭按钮、遮罩），
//! 之后是文档级处理（点击外部关闭）。元素级处理返回 `Propagation::Stop`
//! 时跳过文档级阶段。
//!
//! 可见性由内联 `display` 样式和 `hidden` 属性表示；
//! 初始关闭的面板需要在标记中带 `style="display: none"`。

use std::rc::Rc;

use markup5ever_rcdom::Handle;

use crate::parsers::html::dom::{
    add_class, closest, find_by_class, find_first_by_class, get_style_property, has_class, hide,
    is_inclusive_descendant, is_visible, remove_class, set_node_attr, set_style_property, show,
    toggle,
};
use crate::parsers::html::Document;
use crate::translation::config::constants;

use super::page::FocusTracker;

/// 外壳类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellKind {
    Dropdown,
    Popup,
    Sidebar,
    Circle,
    Minimal,
}

/// 元素级处理后是否继续冒泡到文档
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Continue,
    Stop,
}

/// 键盘事件
#[derive(Debug, Clone)]
pub struct KeyEvent {
    pub key: String,
    pub alt: bool,
    /// 事件目标；为空时使用当前焦点元素
    pub target: Option<Handle>,
}

impl KeyEvent {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            alt: false,
            target: None,
        }
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn on(mut self, target: &Handle) -> Self {
        self.target = Some(target.clone());
        self
    }
}

/// 外壳处理事件时可以访问的页面状态
#[derive(Clone)]
pub struct ShellContext {
    pub document: Rc<Document>,
    pub focus: FocusTracker,
}

impl ShellContext {
    fn set_body_class(&self, class_name: &str, enabled: bool) {
        if let Some(body) = self.document.body() {
            if enabled {
                add_class(&body, class_name);
            } else {
                remove_class(&body, class_name);
            }
        }
    }

    fn focus_first(&self, root: &Handle, class_name: &str) {
        if let Some(node) = find_first_by_class(root, class_name) {
            self.focus.focus(&node);
        }
    }

    fn key_target(&self, event: &KeyEvent) -> Option<Handle> {
        event.target.clone().or_else(|| self.focus.focused())
    }
}

/// 切换器外壳特征
pub trait WidgetShell {
    fn kind(&self) -> ShellKind;

    /// 打开/切换外壳的元素
    fn trigger(&self) -> &Handle;

    fn is_open(&self) -> bool;

    fn open(&self, ctx: &ShellContext);

    fn close(&self, ctx: &ShellContext);

    /// 元素级点击处理
    fn on_click(&self, ctx: &ShellContext, target: &Handle) -> Propagation;

    /// 文档级点击处理（点击外部关闭）
    fn on_document_click(&self, _ctx: &ShellContext, _target: &Handle) {}

    fn on_key(&self, _ctx: &ShellContext, _event: &KeyEvent) {}
}

fn set_expanded(trigger: &Handle, expanded: bool) {
    set_node_attr(trigger, "aria-expanded", Some(expanded.to_string()));
}

fn contains(ancestor: &Handle, node: &Handle) -> bool {
    is_inclusive_descendant(node, ancestor)
}

fn contains_opt(ancestor: &Option<Handle>, node: &Handle) -> bool {
    ancestor.as_ref().map_or(false, |ancestor| contains(ancestor, node))
}

// ============================================================================
// 下拉菜单
// ============================================================================

pub struct DropdownShell {
    container: Handle,
    trigger: Handle,
    menu: Handle,
}

impl DropdownShell {
    pub fn bind(switcher: &Handle) -> Option<Self> {
        let container = find_first_by_class(switcher, "dpt-dropdown-container")?;
        let trigger = find_first_by_class(&container, "dpt-dropdown-trigger")?;
        let menu = find_first_by_class(&container, "dpt-dropdown-menu")?;
        Some(Self {
            container,
            trigger,
            menu,
        })
    }

    fn options(&self) -> Vec<Handle> {
        find_by_class(&self.menu, "dpt-lang-option")
    }
}

impl WidgetShell for DropdownShell {
    fn kind(&self) -> ShellKind {
        ShellKind::Dropdown
    }

    fn trigger(&self) -> &Handle {
        &self.trigger
    }

    fn is_open(&self) -> bool {
        is_visible(&self.menu)
    }

    fn open(&self, ctx: &ShellContext) {
        show(&self.menu);
        set_expanded(&self.trigger, true);
        ctx.focus_first(&self.menu, "dpt-lang-option");
    }

    fn close(&self, _ctx: &ShellContext) {
        hide(&self.menu);
        set_expanded(&self.trigger, false);
    }

    fn on_click(&self, ctx: &ShellContext, target: &Handle) -> Propagation {
        if !contains(&self.trigger, target) {
            return Propagation::Continue;
        }

        let was_open = self.is_open();

        // 同一时间只允许一个下拉菜单打开
        let root = ctx.document.root();
        for menu in find_by_class(&root, "dpt-dropdown-menu") {
            hide(&menu);
        }
        for trigger in find_by_class(&root, "dpt-dropdown-trigger") {
            set_expanded(&trigger, false);
        }

        if !was_open {
            self.open(ctx);
        }
        Propagation::Stop
    }

    fn on_document_click(&self, ctx: &ShellContext, target: &Handle) {
        if !contains(&self.container, target) {
            self.close(ctx);
        }
    }

    fn on_key(&self, ctx: &ShellContext, event: &KeyEvent) {
        let Some(target) = ctx.key_target(event) else {
            return;
        };
        if !contains(&self.menu, &target) {
            return;
        }
        let Some(option) = closest(&target, |node| has_class(node, "dpt-lang-option")) else {
            return;
        };

        let options = self.options();
        let Some(index) = options.iter().position(|o| Rc::ptr_eq(o, &option)) else {
            return;
        };

        match event.key.as_str() {
            "ArrowDown" => ctx.focus.focus(&options[(index + 1) % options.len()]),
            "ArrowUp" => {
                let previous = if index == 0 { options.len() - 1 } else { index - 1 };
                ctx.focus.focus(&options[previous]);
            }
            "Escape" => {
                self.close(ctx);
                ctx.focus.focus(&self.trigger);
            }
            _ => {}
        }
    }
}

// ============================================================================
// 弹出层
// ============================================================================

pub struct PopupShell {
    trigger: Handle,
    overlay: Handle,
    close_button: Option<Handle>,
}

impl PopupShell {
    pub fn bind(switcher: &Handle) -> Option<Self> {
        Some(Self {
            trigger: find_first_by_class(switcher, "dpt-popup-trigger")?,
            overlay: find_first_by_class(switcher, "dpt-popup-overlay")?,
            close_button: find_first_by_class(switcher, "dpt-popup-close"),
        })
    }
}

impl WidgetShell for PopupShell {
    fn kind(&self) -> ShellKind {
        ShellKind::Popup
    }

    fn trigger(&self) -> &Handle {
        &self.trigger
    }

    fn is_open(&self) -> bool {
        is_visible(&self.overlay)
    }

    fn open(&self, ctx: &ShellContext) {
        show(&self.overlay);
        ctx.set_body_class("dpt-popup-open", true);
        ctx.focus_first(&self.overlay, "dpt-lang-card");
    }

    fn close(&self, ctx: &ShellContext) {
        hide(&self.overlay);
        ctx.set_body_class("dpt-popup-open", false);
        ctx.focus.focus(&self.trigger);
    }

    fn on_click(&self, ctx: &ShellContext, target: &Handle) -> Propagation {
        if contains(&self.trigger, target) {
            self.open(ctx);
        } else if contains_opt(&self.close_button, target) || Rc::ptr_eq(target, &self.overlay) {
            // 只有点在遮罩本身上才关闭，点在内容卡片上不关闭
            self.close(ctx);
        }
        Propagation::Continue
    }

    fn on_key(&self, ctx: &ShellContext, event: &KeyEvent) {
        if event.key == "Escape" && self.is_open() {
            self.close(ctx);
        }
    }
}

// ============================================================================
// 侧边栏
// ============================================================================

const SIDEBAR_OPEN: &str = "translateX(0)";
const SIDEBAR_CLOSED: &str = "translateX(-100%)";

pub struct SidebarShell {
    trigger: Handle,
    panel: Handle,
    overlay: Option<Handle>,
    close_button: Option<Handle>,
}

impl SidebarShell {
    pub fn bind(switcher: &Handle) -> Option<Self> {
        Some(Self {
            trigger: find_first_by_class(switcher, "dpt-sidebar-trigger")?,
            panel: find_first_by_class(switcher, "dpt-sidebar-panel")?,
            overlay: find_first_by_class(switcher, "dpt-sidebar-overlay"),
            close_button: find_first_by_class(switcher, "dpt-sidebar-close"),
        })
    }
}

impl WidgetShell for SidebarShell {
    fn kind(&self) -> ShellKind {
        ShellKind::Sidebar
    }

    fn trigger(&self) -> &Handle {
        &self.trigger
    }

    fn is_open(&self) -> bool {
        get_style_property(&self.panel, "transform").as_deref() == Some(SIDEBAR_OPEN)
    }

    fn open(&self, ctx: &ShellContext) {
        if let Some(overlay) = &self.overlay {
            show(overlay);
        }
        set_style_property(&self.panel, "transform", Some(SIDEBAR_OPEN));
        ctx.set_body_class("dpt-sidebar-open", true);
        ctx.focus_first(&self.panel, "dpt-sidebar-option");
    }

    fn close(&self, ctx: &ShellContext) {
        if let Some(overlay) = &self.overlay {
            hide(overlay);
        }
        set_style_property(&self.panel, "transform", Some(SIDEBAR_CLOSED));
        ctx.set_body_class("dpt-sidebar-open", false);
        ctx.focus.focus(&self.trigger);
    }

    fn on_click(&self, ctx: &ShellContext, target: &Handle) -> Propagation {
        if contains(&self.trigger, target) {
            self.open(ctx);
        } else if contains_opt(&self.close_button, target) || contains_opt(&self.overlay, target) {
            self.close(ctx);
        }
        Propagation::Continue
    }

    fn on_key(&self, ctx: &ShellContext, event: &KeyEvent) {
        // Escape 以遮罩可见为准，没有遮罩时不响应
        let overlay_visible = self.overlay.as_ref().map_or(false, is_visible);
        if event.key == "Escape" && overlay_visible {
            self.close(ctx);
        }
    }
}

// ============================================================================
// 圆形菜单
// ============================================================================

pub struct CircleShell {
    container: Handle,
    trigger: Handle,
    menu: Handle,
}

impl CircleShell {
    pub fn bind(switcher: &Handle) -> Option<Self> {
        Some(Self {
            container: switcher.clone(),
            trigger: find_first_by_class(switcher, "dpt-circle-trigger")?,
            menu: find_first_by_class(switcher, "dpt-circle-menu")?,
        })
    }
}

impl WidgetShell for CircleShell {
    fn kind(&self) -> ShellKind {
        ShellKind::Circle
    }

    fn trigger(&self) -> &Handle {
        &self.trigger
    }

    fn is_open(&self) -> bool {
        is_visible(&self.menu)
    }

    /// 选项依次延迟显示；需要在 `LocalSet` 中调用
    fn open(&self, _ctx: &ShellContext) {
        show(&self.menu);
        add_class(&self.trigger, "active");

        for (index, option) in find_by_class(&self.menu, "dpt-circle-option").into_iter().enumerate() {
            let trigger = self.trigger.clone();
            let delay = constants::CIRCLE_STAGGER * index as u32;
            tokio::task::spawn_local(async move {
                tokio::time::sleep(delay).await;
                if has_class(&trigger, "active") {
                    add_class(&option, "visible");
                }
            });
        }
    }

    fn close(&self, _ctx: &ShellContext) {
        for option in find_by_class(&self.menu, "dpt-circle-option") {
            remove_class(&option, "visible");
        }
        remove_class(&self.trigger, "active");

        let trigger = self.trigger.clone();
        let menu = self.menu.clone();
        tokio::task::spawn_local(async move {
            tokio::time::sleep(constants::CIRCLE_CLOSE_DELAY).await;
            // 关闭动画期间重新打开时保留菜单
            if !has_class(&trigger, "active") {
                hide(&menu);
            }
        });
    }

    fn on_click(&self, ctx: &ShellContext, target: &Handle) -> Propagation {
        if contains(&self.trigger, target) {
            if self.is_open() {
                self.close(ctx);
            } else {
                self.open(ctx);
            }
        }
        Propagation::Continue
    }

    fn on_document_click(&self, ctx: &ShellContext, target: &Handle) {
        if !contains(&self.container, target) && self.is_open() {
            self.close(ctx);
        }
    }
}

// ============================================================================
// 极简选择器
// ============================================================================

pub struct MinimalShell {
    container: Handle,
    trigger: Handle,
    options: Handle,
}

impl MinimalShell {
    pub fn bind(switcher: &Handle) -> Option<Self> {
        Some(Self {
            container: switcher.clone(),
            trigger: find_first_by_class(switcher, "dpt-minimal-current")?,
            options: find_first_by_class(switcher, "dpt-minimal-options")?,
        })
    }
}

impl WidgetShell for MinimalShell {
    fn kind(&self) -> ShellKind {
        ShellKind::Minimal
    }

    fn trigger(&self) -> &Handle {
        &self.trigger
    }

    fn is_open(&self) -> bool {
        is_visible(&self.options)
    }

    fn open(&self, _ctx: &ShellContext) {
        show(&self.options);
    }

    fn close(&self, _ctx: &ShellContext) {
        hide(&self.options);
    }

    fn on_click(&self, _ctx: &ShellContext, target: &Handle) -> Propagation {
        if contains(&self.trigger, target) {
            toggle(&self.options);
        }
        Propagation::Continue
    }

    fn on_document_click(&self, ctx: &ShellContext, target: &Handle) {
        if !contains(&self.container, target) {
            self.close(ctx);
        }
    }
}

// ============================================================================
// 注册表
// ============================================================================

/// 已绑定外壳的集合
#[derive(Default)]
pub struct ShellRegistry {
    shells: Vec<Box<dyn WidgetShell>>,
}

impl ShellRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在切换器容器中绑定所有能找到的外壳
    pub fn bind(switcher: &Handle) -> Self {
        let mut registry = Self::new();

        if let Some(shell) = DropdownShell::bind(switcher) {
            registry.register(Box::new(shell));
        }
        if let Some(shell) = PopupShell::bind(switcher) {
            registry.register(Box::new(shell));
        }
        if let Some(shell) = SidebarShell::bind(switcher) {
            registry.register(Box::new(shell));
        }
        if let Some(shell) = CircleShell::bind(switcher) {
            registry.register(Box::new(shell));
        }
        if let Some(shell) = MinimalShell::bind(switcher) {
            registry.register(Box::new(shell));
        }

        tracing::debug!("绑定切换器外壳: {:?}", registry.kinds());
        registry
    }

    pub fn register(&mut self, shell: Box<dyn WidgetShell>) {
        self.shells.push(shell);
    }

    pub fn extend(&mut self, other: ShellRegistry) {
        self.shells.extend(other.shells);
    }

    pub fn len(&self) -> usize {
        self.shells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shells.is_empty()
    }

    pub fn kinds(&self) -> Vec<ShellKind> {
        self.shells.iter().map(|shell| shell.kind()).collect()
    }

    /// 第一个指定类型的外壳
    pub fn find(&self, kind: ShellKind) -> Option<&dyn WidgetShell> {
        self.shells
            .iter()
            .find(|shell| shell.kind() == kind)
            .map(|shell| shell.as_ref())
    }

    /// 元素级点击；任一外壳要求停止冒泡时返回 `Stop`
    pub fn dispatch_click(&self, ctx: &ShellContext, target: &Handle) -> Propagation {
        let mut propagation = Propagation::Continue;
        for shell in &self.shells {
            if shell.on_click(ctx, target) == Propagation::Stop {
                propagation = Propagation::Stop;
            }
        }
        propagation
    }

    pub fn dispatch_document_click(&self, ctx: &ShellContext, target: &Handle) {
        for shell in &self.shells {
            shell.on_document_click(ctx, target);
        }
    }

    pub fn dispatch_key(&self, ctx: &ShellContext, event: &KeyEvent) {
        for shell in &self.shells {
            shell.on_key(ctx, event);
        }
    }
}
