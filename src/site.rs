use crate::config::SiteConfig;
use crate::contact::{ContactForm, SubmitOutcome, SUCCESS_MESSAGE};
use crate::dom::Document;
use crate::effects::Effects;
use crate::logging::{log_event, LogLevel};
use crate::nav::Navigation;
use crate::notify::{Notifier, Severity};
use crate::page;
use crate::reveal::{self, Animator, Counter};
use crate::scroll::ScrollControls;
use crate::timers::TimerQueue;
use serde_json::json;

pub type Timers<N> = TimerQueue<Task<N>>;

#[derive(Clone, Debug, PartialEq)]
pub enum Event<N> {
    Load,
    Frame,
    Scroll,
    Click { target: N },
    Submit { form: N },
    KeyDown { key: String },
    PointerMove { target: Option<N>, x: f64, y: f64 },
    PointerLeave { to: Option<N> },
    Visible { target: N },
    Notify { message: String, severity: Severity },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Response {
    pub prevent_default: bool,
}

/// Deferred work, run when its timer comes due.
#[derive(Clone, Debug)]
pub enum Task<N> {
    ShowNotification(N),
    DismissNotification(N),
    Fade(N),
    Remove(N),
    CompleteSubmission(N),
    FillSkillBar {
        level: N,
        width: String,
        percent: N,
        counter: Option<Counter>,
    },
    CountUp {
        node: N,
        counter: Counter,
    },
    StartTyping,
    TypeNext,
}

pub struct Environment<'a> {
    pub now: f64,
    pub year: i32,
    pub random: &'a mut dyn FnMut() -> f64,
}

pub struct Site<D: Document> {
    config: SiteConfig,
    timers: Timers<D::Node>,
    navigation: Navigation<D::Node>,
    scroll: ScrollControls<D::Node>,
    contact: ContactForm<D::Node>,
    notifier: Notifier<D::Node>,
    animator: Animator<D::Node>,
    effects: Effects<D::Node>,
}

impl<D: Document> Site<D> {
    pub fn attach(doc: &mut D, config: SiteConfig, env: Environment<'_>) -> Self {
        let mut timers = TimerQueue::new();
        timers.advance_to(env.now);
        timers.settle();

        let navigation = Navigation::attach(doc, &config);
        let scroll = ScrollControls::attach(doc, &config);
        let contact = ContactForm::attach(doc, &config.contact);
        let notifier = Notifier::new(&config.notification);
        let animator = Animator::attach(doc, &config.reveal);
        let effects = Effects::attach(doc, &mut timers, &config.effects, env.random);
        page::set_current_year(doc, env.year);

        let site = Self {
            config,
            timers,
            navigation,
            scroll,
            contact,
            notifier,
            animator,
            effects,
        };
        site.log_features();
        site
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Elements the host should hand to its visibility observer.
    pub fn observed(&self) -> &[D::Node] {
        self.animator.observed()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn features(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("navigation", self.navigation.is_attached()),
            ("smooth-scroll", self.scroll.has_anchors()),
            ("back-to-top", self.scroll.has_back_to_top()),
            ("scroll-progress", self.scroll.has_progress()),
            ("contact-form", self.contact.is_attached()),
            ("scroll-animations", !self.animator.observed().is_empty()),
            ("particles", self.effects.has_particles()),
            ("typing-effect", self.effects.is_typing()),
            ("project-cards", self.effects.has_project_cards()),
        ]
    }

    pub fn handle(&mut self, doc: &mut D, now: f64, event: Event<D::Node>) -> Response {
        self.run_due(doc, now);

        let mut response = Response::default();
        match event {
            Event::Load => {
                page::on_load(doc, &mut self.timers, &self.config.effects);
                let trail = self.effects.enable_cursor_trail(doc);
                log_event(
                    &self.config,
                    LogLevel::Debug,
                    "site.loaded",
                    json!({ "cursorTrail": trail }),
                );
            }
            Event::Frame => self.scroll.refresh_progress(doc),
            Event::Scroll => {
                self.navigation.on_scroll(doc);
                self.scroll.on_scroll(doc);
            }
            Event::Click { target } => {
                if self.notifier.is_close_control(doc, &target) {
                    self.notifier.close(doc, &mut self.timers);
                }
                self.navigation.on_click(doc, &target);
                response.prevent_default = self.scroll.on_click(doc, &target);
            }
            Event::Submit { form } => response.prevent_default = self.submit(doc, &form),
            Event::KeyDown { key } => {
                if key == "Escape" {
                    if self.navigation.is_menu_open(doc) {
                        self.navigation.close_menu(doc);
                    }
                    self.notifier.close(doc, &mut self.timers);
                }
            }
            Event::PointerMove { target, x, y } => {
                self.effects
                    .on_pointer_move(doc, &mut self.timers, target.as_ref(), x, y);
            }
            Event::PointerLeave { to } => self.effects.on_pointer_leave(doc, to.as_ref()),
            Event::Visible { target } => {
                self.animator.on_visible(doc, &mut self.timers, &target);
            }
            Event::Notify { message, severity } => self.notify(doc, &message, severity),
        }
        response
    }

    /// Shows a toast, replacing any toast already on screen.
    pub fn notify(&mut self, doc: &mut D, message: &str, severity: Severity) {
        if self.notifier.show(doc, &mut self.timers, message, severity) {
            log_event(
                &self.config,
                LogLevel::Debug,
                "notification.shown",
                json!({ "severity": severity.as_str() }),
            );
        }
    }

    fn submit(&mut self, doc: &mut D, form: &D::Node) -> bool {
        match self.contact.submit(doc, &mut self.timers, form) {
            SubmitOutcome::Ignored => false,
            SubmitOutcome::Busy => true,
            SubmitOutcome::Sending => {
                log_event(&self.config, LogLevel::Info, "contact.sending", json!({}));
                true
            }
            SubmitOutcome::Rejected(error) => {
                log_event(
                    &self.config,
                    LogLevel::Info,
                    "contact.rejected",
                    json!({ "reason": error.reason() }),
                );
                self.notify(doc, &error.to_string(), Severity::Error);
                true
            }
        }
    }

    fn run_due(&mut self, doc: &mut D, now: f64) {
        self.timers.advance_to(now);
        while let Some(task) = self.timers.pop_due() {
            self.run_task(doc, task);
        }
        self.timers.settle();
    }

    fn run_task(&mut self, doc: &mut D, task: Task<D::Node>) {
        match task {
            Task::ShowNotification(node) => self.notifier.reveal(doc, &node),
            Task::DismissNotification(node) => self.notifier.dismiss(doc, &mut self.timers, &node),
            Task::Fade(node) => doc.set_style(&node, "opacity", "0"),
            Task::Remove(node) => doc.remove(&node),
            Task::CompleteSubmission(form) => {
                if let Some(link) = self.contact.complete(doc, &form) {
                    log_event(
                        &self.config,
                        LogLevel::Info,
                        "contact.handoff",
                        json!({ "scheme": link.scheme() }),
                    );
                    self.notify(doc, SUCCESS_MESSAGE, Severity::Success);
                }
            }
            Task::FillSkillBar {
                level,
                width,
                percent,
                counter,
            } => {
                doc.set_style(&level, "width", &width);
                if let Some(counter) = counter {
                    reveal::start_counter(&mut self.timers, percent, counter);
                }
            }
            Task::CountUp { node, counter } => {
                reveal::count_up(doc, &mut self.timers, node, counter)
            }
            Task::StartTyping => self.effects.start_typing(doc, &mut self.timers),
            Task::TypeNext => self.effects.type_next(doc, &mut self.timers),
        }
    }

    fn log_features(&self) {
        let features = self.features();
        for (feature, attached) in &features {
            let event = if *attached {
                "feature.attached"
            } else {
                "feature.skipped"
            };
            log_event(&self.config, LogLevel::Debug, event, json!({ "feature": feature }));
        }

        let attached: Vec<&str> = features
            .iter()
            .filter(|(_, attached)| *attached)
            .map(|(feature, _)| *feature)
            .collect();
        log_event(
            &self.config,
            LogLevel::Info,
            "site.attached",
            json!({ "features": attached, "observed": self.observed().len() }),
        );
    }
}
