use crate::config::NotificationConfig;
use crate::dom::{element_with_class, inject_style, Document};
use crate::site::{Task, Timers};
use crate::timers::TimerId;

const NOTIFICATION_SELECTOR: &str = ".notification";
const CLOSE_SELECTOR: &str = ".notification-close";
const SHOW_CLASS: &str = "show";
const STYLE_MARKER: &str = "notification-styles";

const NOTIFICATION_STYLES: &str = r#"
.notification {
    position: fixed;
    top: 100px;
    right: 20px;
    padding: 1rem 1.5rem;
    border-radius: 10px;
    color: var(--white);
    display: flex;
    align-items: center;
    gap: 1rem;
    max-width: 400px;
    z-index: 10000;
    transform: translateX(120%);
    transition: transform 0.3s cubic-bezier(0.68, -0.55, 0.265, 1.55);
    box-shadow: var(--shadow-lg);
    backdrop-filter: blur(10px);
}
.notification.show { transform: translateX(0); }
.notification-success {
    background: linear-gradient(135deg, var(--primary-green), var(--secondary-green));
    color: var(--black);
}
.notification-error { background: linear-gradient(135deg, #ff4444, #cc0000); }
.notification-info { background: linear-gradient(135deg, var(--primary-green), var(--dark-green)); }
.notification i:first-child { font-size: 1.5rem; }
.notification span { flex: 1; font-weight: 500; }
.notification-close {
    background: rgba(255, 255, 255, 0.2);
    border: none;
    color: inherit;
    cursor: pointer;
    padding: 0.25rem 0.5rem;
    border-radius: 5px;
    display: flex;
    align-items: center;
    justify-content: center;
}
.notification-close:hover { background: rgba(255, 255, 255, 0.3); }
@media (max-width: 768px) {
    .notification { left: 20px; right: 20px; max-width: none; top: 80px; }
}
"#;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    /// Unknown names fall back to `Info`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "success" => Self::Success,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Self::Info => "fa-info-circle",
            Self::Success => "fa-check-circle",
            Self::Error => "fa-exclamation-circle",
        }
    }
}

struct LiveNotification<N> {
    node: N,
    auto_dismiss: TimerId,
}

pub struct Notifier<N> {
    current: Option<LiveNotification<N>>,
    duration_ms: f64,
    exit_ms: f64,
    enter_delay_ms: f64,
}

impl<N: Clone + PartialEq> Notifier<N> {
    pub fn new(config: &NotificationConfig) -> Self {
        Self {
            current: None,
            duration_ms: f64::from(config.duration_ms),
            exit_ms: f64::from(config.exit_ms),
            enter_delay_ms: f64::from(config.enter_delay_ms),
        }
    }

    /// Replaces whatever toast is on screen with a new one.
    pub fn show<D: Document<Node = N>>(
        &mut self,
        doc: &mut D,
        timers: &mut Timers<N>,
        message: &str,
        severity: Severity,
    ) -> bool {
        if let Some(previous) = self.current.take() {
            timers.cancel(previous.auto_dismiss);
        }
        for existing in doc.query_all(NOTIFICATION_SELECTOR) {
            doc.remove(&existing);
        }

        inject_style(doc, STYLE_MARKER, NOTIFICATION_STYLES);

        let Some(body) = doc.body() else {
            return false;
        };
        let Some(node) = build_notification(doc, message, severity) else {
            return false;
        };
        doc.append_child(&body, &node);

        timers.schedule(self.enter_delay_ms, Task::ShowNotification(node.clone()));
        let auto_dismiss =
            timers.schedule(self.duration_ms, Task::DismissNotification(node.clone()));
        self.current = Some(LiveNotification { node, auto_dismiss });
        true
    }

    pub fn reveal<D: Document<Node = N>>(&self, doc: &mut D, node: &N) {
        if doc.is_connected(node) {
            doc.add_class(node, SHOW_CLASS);
        }
    }

    /// Auto-dismiss path: the timer already fired, so only hide.
    pub fn dismiss<D: Document<Node = N>>(
        &mut self,
        doc: &mut D,
        timers: &mut Timers<N>,
        node: &N,
    ) {
        if self.current.as_ref().is_some_and(|live| live.node == *node) {
            self.current = None;
        }
        self.hide(doc, timers, node);
    }

    /// Explicit close from the close control or the cancel key.
    pub fn close<D: Document<Node = N>>(&mut self, doc: &mut D, timers: &mut Timers<N>) -> bool {
        if let Some(live) = self.current.take() {
            timers.cancel(live.auto_dismiss);
            self.hide(doc, timers, &live.node);
            return true;
        }
        match doc.query(NOTIFICATION_SELECTOR) {
            Some(stray) => {
                self.hide(doc, timers, &stray);
                true
            }
            None => false,
        }
    }

    pub fn is_close_control<D: Document<Node = N>>(&self, doc: &D, target: &N) -> bool {
        doc.closest(target, CLOSE_SELECTOR).is_some()
    }

    fn hide<D: Document<Node = N>>(&self, doc: &mut D, timers: &mut Timers<N>, node: &N) {
        doc.remove_class(node, SHOW_CLASS);
        timers.schedule(self.exit_ms, Task::Remove(node.clone()));
    }
}

fn build_notification<D: Document>(
    doc: &mut D,
    message: &str,
    severity: Severity,
) -> Option<D::Node> {
    let node = element_with_class(
        doc,
        "div",
        &format!("notification notification-{}", severity.as_str()),
    )?;
    doc.set_attribute(&node, "role", "status");

    let icon = element_with_class(doc, "i", &format!("fas {}", severity.icon()))?;
    let text = doc.create_element("span")?;
    doc.set_text(&text, message);
    let close = element_with_class(doc, "button", "notification-close")?;
    doc.set_attribute(&close, "type", "button");
    doc.set_attribute(&close, "aria-label", "Close notification");
    let close_icon = element_with_class(doc, "i", "fas fa-times")?;
    doc.append_child(&close, &close_icon);

    doc.append_child(&node, &icon);
    doc.append_child(&node, &text);
    doc.append_child(&node, &close);
    Some(node)
}
