//! # 语言切换器模块
//!
//! - `widgets` - 五种切换器外壳及事件分发
//! - `controller` - 语言切换流程
//! - `setup` - 自定义位置、无障碍属性
//! - `events` - `languageChanged` / `initFlags` 事件总线
//! - `page` - 页面地址、cookie、焦点和刷新请求
//! - `notify` - 错误通知

pub mod controller;
pub mod events;
pub mod notify;
pub mod page;
pub mod setup;
pub mod widgets;

pub use controller::{LanguageSwitchController, SwitchOutcome, SwitchState};
pub use events::{Event, EventBus, EventEnvelope, EventId};
pub use notify::Notifier;
pub use page::{FocusTracker, PageState};
pub use setup::{find_shortcut_trigger, find_switcher, setup_accessibility, setup_custom_positions};
pub use widgets::{
    CircleShell, DropdownShell, KeyEvent, MinimalShell, PopupShell, Propagation, ShellContext,
    ShellKind, ShellRegistry, SidebarShell, WidgetShell,
};
