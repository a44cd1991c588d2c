use crate::config::EffectsConfig;
use crate::dom::{element_with_class, inject_style, Document};
use crate::site::{Task, Timers};
use std::collections::VecDeque;

const TRAIL_FADE_MS: f64 = 100.0;
const TRAIL_REMOVE_MS: f64 = 500.0;
const TRAIL_MARK_OFFSET: f64 = 5.0;
const CARD_STYLE_MARKER: &str = "project-card-styles";
const PROJECT_CARD_SELECTOR: &str = ".project-card";

const PROJECT_CARD_STYLES: &str = r#"
.project-card {
    --mouse-x: 50%;
    --mouse-y: 50%;
    position: relative;
}
.project-card::after {
    content: '';
    position: absolute;
    width: 300px;
    height: 300px;
    background: radial-gradient(circle at center, rgba(0, 255, 136, 0.15) 0%, transparent 70%);
    left: var(--mouse-x);
    top: var(--mouse-y);
    transform: translate(-50%, -50%);
    pointer-events: none;
    opacity: 0;
    transition: opacity 0.3s;
}
.project-card:hover::after { opacity: 1; }
"#;

/// Bounded FIFO of cursor-trail marks.
pub struct CursorTrail<N> {
    marks: VecDeque<N>,
    capacity: usize,
}

impl<N> CursorTrail<N> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            marks: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Adds a mark, handing back the oldest one once the buffer is full.
    pub fn push(&mut self, mark: N) -> Option<N> {
        let evicted = if self.marks.len() >= self.capacity {
            self.marks.pop_front()
        } else {
            None
        };
        self.marks.push_back(mark);
        evicted
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

struct Typing<N> {
    node: N,
    html: String,
    chars: Vec<char>,
    typed: usize,
}

pub struct Effects<N> {
    trail: CursorTrail<N>,
    trail_enabled: bool,
    hovered_card: Option<N>,
    has_cards: bool,
    has_particles: bool,
    typing: Option<Typing<N>>,
    config: EffectsConfig,
}

impl<N: Clone + PartialEq> Effects<N> {
    pub fn attach<D: Document<Node = N>>(
        doc: &mut D,
        timers: &mut Timers<N>,
        config: &EffectsConfig,
        random: &mut dyn FnMut() -> f64,
    ) -> Self {
        let reduced_motion = doc.prefers_reduced_motion();
        let has_particles = !reduced_motion && spawn_particles(doc, config.particle_count, random);

        let has_cards = !doc.query_all(PROJECT_CARD_SELECTOR).is_empty();
        if has_cards {
            inject_style(doc, CARD_STYLE_MARKER, PROJECT_CARD_STYLES);
        }

        let typing = if reduced_motion {
            None
        } else {
            doc.query(".hero h1").map(|node| {
                let html = doc.inner_html(&node);
                let chars = doc.text(&node).chars().collect();
                doc.set_style(&node, "opacity", "0");
                timers.schedule(f64::from(config.typing_delay_ms), Task::StartTyping);
                Typing {
                    node,
                    html,
                    chars,
                    typed: 0,
                }
            })
        };

        Self {
            trail: CursorTrail::new(config.cursor_trail_length),
            trail_enabled: false,
            hovered_card: None,
            has_cards,
            has_particles,
            typing,
            config: config.clone(),
        }
    }

    pub fn has_particles(&self) -> bool {
        self.has_particles
    }

    pub fn has_project_cards(&self) -> bool {
        self.has_cards
    }

    pub fn is_typing(&self) -> bool {
        self.typing.is_some()
    }

    pub fn trail(&self) -> &CursorTrail<N> {
        &self.trail
    }

    /// Called once the page has loaded; narrow viewports get no trail.
    pub fn enable_cursor_trail<D: Document<Node = N>>(&mut self, doc: &D) -> bool {
        self.trail_enabled = !doc.prefers_reduced_motion()
            && doc.viewport_width() > self.config.cursor_trail_min_width;
        self.trail_enabled
    }

    pub fn on_pointer_move<D: Document<Node = N>>(
        &mut self,
        doc: &mut D,
        timers: &mut Timers<N>,
        target: Option<&N>,
        x: f64,
        y: f64,
    ) {
        self.track_card_glow(doc, target, x, y);
        if self.trail_enabled {
            self.drop_trail_mark(doc, timers, x, y);
        }
    }

    fn track_card_glow<D: Document<Node = N>>(
        &mut self,
        doc: &mut D,
        target: Option<&N>,
        x: f64,
        y: f64,
    ) {
        let card = target.and_then(|node| doc.closest(node, PROJECT_CARD_SELECTOR));

        if let Some(previous) = self.hovered_card.take() {
            if card.as_ref() != Some(&previous) {
                reset_glow(doc, &previous);
            }
        }

        if let Some(card) = card {
            let (left, top) = doc.client_origin(&card);
            doc.set_style(&card, "--mouse-x", &format!("{}px", x - left));
            doc.set_style(&card, "--mouse-y", &format!("{}px", y - top));
            self.hovered_card = Some(card);
        }
    }

    /// The pointer moved out of some element towards `to`, which is `None`
    /// when it left the window. Resets the glow once it is off the card.
    pub fn on_pointer_leave<D: Document<Node = N>>(&mut self, doc: &mut D, to: Option<&N>) {
        let Some(card) = self.hovered_card.clone() else {
            return;
        };
        let entered = to.and_then(|node| doc.closest(node, PROJECT_CARD_SELECTOR));
        if entered.as_ref() != Some(&card) {
            reset_glow(doc, &card);
            self.hovered_card = None;
        }
    }

    fn drop_trail_mark<D: Document<Node = N>>(
        &mut self,
        doc: &mut D,
        timers: &mut Timers<N>,
        x: f64,
        y: f64,
    ) {
        let Some(body) = doc.body() else {
            return;
        };
        let Some(mark) = element_with_class(doc, "div", "cursor-trail") else {
            return;
        };
        doc.set_style(&mark, "left", &format!("{}px", x - TRAIL_MARK_OFFSET));
        doc.set_style(&mark, "top", &format!("{}px", y - TRAIL_MARK_OFFSET));
        doc.append_child(&body, &mark);

        if let Some(oldest) = self.trail.push(mark.clone()) {
            doc.set_style(&oldest, "opacity", "0");
            timers.schedule(TRAIL_REMOVE_MS, Task::Remove(oldest));
        }
        timers.schedule(TRAIL_FADE_MS, Task::Fade(mark));
    }

    pub fn start_typing<D: Document<Node = N>>(&mut self, doc: &mut D, timers: &mut Timers<N>) {
        let Some(typing) = &self.typing else {
            return;
        };
        doc.set_style(&typing.node, "opacity", "1");
        doc.set_text(&typing.node, "");
        self.type_next(doc, timers);
    }

    pub fn type_next<D: Document<Node = N>>(&mut self, doc: &mut D, timers: &mut Timers<N>) {
        let Some(typing) = self.typing.as_mut() else {
            return;
        };

        if typing.typed < typing.chars.len() {
            typing.typed += 1;
            let shown: String = typing.chars[..typing.typed].iter().collect();
            doc.set_text(&typing.node, &shown);
            timers.schedule(f64::from(self.config.typing_speed_ms), Task::TypeNext);
        } else if let Some(done) = self.typing.take() {
            doc.set_inner_html(&done.node, &done.html);
        }
    }
}

fn reset_glow<D: Document>(doc: &mut D, card: &D::Node) {
    doc.set_style(card, "--mouse-x", "50%");
    doc.set_style(card, "--mouse-y", "50%");
}

fn spawn_particles<D: Document>(
    doc: &mut D,
    count: usize,
    random: &mut dyn FnMut() -> f64,
) -> bool {
    let Some(hero) = doc.query(".hero") else {
        return false;
    };
    if doc.query_within(&hero, ".particles-container").is_some() {
        return true;
    }
    let Some(container) = element_with_class(doc, "div", "particles-container") else {
        return false;
    };

    for _ in 0..count {
        let Some(particle) = element_with_class(doc, "div", "particle") else {
            continue;
        };
        doc.set_style(&particle, "left", &format!("{:.2}%", random() * 100.0));
        doc.set_style(&particle, "top", &format!("{:.2}%", random() * 100.0));
        doc.set_style(&particle, "opacity", &format!("{:.2}", random() * 0.5 + 0.2));
        doc.set_style(&particle, "animation-duration", &format!("{:.2}s", random() * 10.0 + 5.0));
        doc.set_style(&particle, "animation-delay", &format!("{:.2}s", random() * 5.0));
        doc.append_child(&container, &particle);
    }

    doc.prepend_child(&hero, &container);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryDocument, NodeId};
    use crate::timers::TimerQueue;

    const PAGE: &str = r#"<html><head></head><body>
        <section class="hero"><h1>Hi, I'm <span class="highlight">Ana</span></h1></section>
        <article class="project-card"><p class="project-title">Radar</p></article>
        <article class="project-card"><p>Compiler</p></article>
    </body></html>"#;

    fn fixed_random() -> impl FnMut() -> f64 {
        let mut step = 0u32;
        move || {
            step = (step + 1) % 10;
            f64::from(step) / 10.0
        }
    }

    fn attach(
        doc: &mut MemoryDocument,
        timers: &mut Timers<NodeId>,
        config: &EffectsConfig,
    ) -> Effects<NodeId> {
        let mut random = fixed_random();
        Effects::attach(doc, timers, config, &mut random)
    }

    fn drain(
        doc: &mut MemoryDocument,
        timers: &mut Timers<NodeId>,
        effects: &mut Effects<NodeId>,
        now: f64,
    ) {
        timers.advance_to(now);
        while let Some(task) = timers.pop_due() {
            match task {
                Task::StartTyping => effects.start_typing(doc, timers),
                Task::TypeNext => effects.type_next(doc, timers),
                Task::Fade(node) => doc.set_style(&node, "opacity", "0"),
                Task::Remove(node) => doc.remove(&node),
                _ => {}
            }
        }
        timers.settle();
    }

    #[test]
    fn particles_are_generated_once_as_first_hero_child() {
        let mut doc = MemoryDocument::parse(PAGE);
        let mut timers = TimerQueue::new();
        let config = EffectsConfig {
            particle_count: 7,
            ..EffectsConfig::default()
        };

        let effects = attach(&mut doc, &mut timers, &config);
        assert!(effects.has_particles());
        assert_eq!(doc.query_all(".particles-container .particle").len(), 7);
        assert!(doc.query(".hero > .particles-container:first-child").is_some());

        let mut random = fixed_random();
        assert!(spawn_particles(&mut doc, 7, &mut random));
        assert_eq!(doc.query_all(".particles-container").len(), 1);
    }

    #[test]
    fn particle_styles_stay_in_range() {
        let mut doc = MemoryDocument::parse(PAGE);
        let mut timers = TimerQueue::new();
        attach(&mut doc, &mut timers, &EffectsConfig::default());

        for particle in doc.query_all(".particle") {
            let opacity: f64 = doc
                .style(&particle, "opacity")
                .and_then(|value| value.parse().ok())
                .expect("opacity set");
            assert!((0.2..=0.7).contains(&opacity));
        }
    }

    #[test]
    fn typing_effect_types_text_then_restores_markup() {
        let mut doc = MemoryDocument::parse(PAGE);
        let mut timers = TimerQueue::new();
        let mut effects = attach(&mut doc, &mut timers, &EffectsConfig::default());
        let title = doc.query(".hero h1").expect("title exists");
        let original = doc.inner_html(&title);

        assert!(effects.is_typing());
        assert_eq!(doc.style(&title, "opacity").as_deref(), Some("0"));

        drain(&mut doc, &mut timers, &mut effects, 500.0);
        assert_eq!(doc.style(&title, "opacity").as_deref(), Some("1"));
        assert_eq!(doc.text(&title), "H");

        drain(&mut doc, &mut timers, &mut effects, 580.0);
        assert_eq!(doc.text(&title), "Hi");

        drain(&mut doc, &mut timers, &mut effects, 10_000.0);
        assert_eq!(doc.inner_html(&title), original);
        assert!(doc.query(".hero h1 .highlight").is_some());
        assert!(!effects.is_typing());
    }

    #[test]
    fn reduced_motion_skips_motion_effects() {
        let mut doc = MemoryDocument::parse(PAGE);
        doc.set_reduced_motion(true);
        let mut timers = TimerQueue::new();
        let mut effects = attach(&mut doc, &mut timers, &EffectsConfig::default());

        assert!(!effects.has_particles());
        assert!(!effects.is_typing());
        assert!(!effects.enable_cursor_trail(&doc));
        assert!(timers.is_empty());
    }

    #[test]
    fn cursor_trail_never_exceeds_capacity() {
        let mut doc = MemoryDocument::parse(PAGE);
        let mut timers = TimerQueue::new();
        let config = EffectsConfig {
            cursor_trail_length: 4,
            ..EffectsConfig::default()
        };
        let mut effects = attach(&mut doc, &mut timers, &config);
        assert!(effects.enable_cursor_trail(&doc));

        for step in 0..25 {
            let position = f64::from(step) * 3.0;
            effects.on_pointer_move(&mut doc, &mut timers, None, position, position);
            assert!(effects.trail().len() <= effects.trail().capacity());
        }
        assert_eq!(effects.trail().len(), 4);

        drain(&mut doc, &mut timers, &mut effects, 10_000.0);
        assert_eq!(doc.query_all(".cursor-trail").len(), 4);
    }

    #[test]
    fn trail_is_disabled_on_narrow_viewports() {
        let mut doc = MemoryDocument::parse(PAGE);
        doc.set_viewport(800.0, 600.0);
        let mut timers = TimerQueue::new();
        let mut effects = attach(&mut doc, &mut timers, &EffectsConfig::default());

        assert!(!effects.enable_cursor_trail(&doc));
        effects.on_pointer_move(&mut doc, &mut timers, None, 10.0, 10.0);
        assert!(doc.query(".cursor-trail").is_none());
    }

    #[test]
    fn card_glow_follows_pointer_and_resets_on_leave() {
        let mut doc = MemoryDocument::parse(PAGE);
        let mut timers = TimerQueue::new();
        let mut effects = attach(&mut doc, &mut timers, &EffectsConfig::default());
        let cards = doc.query_all(".project-card");
        doc.set_layout(&cards[0], 400.0, 300.0);
        doc.set_left(&cards[0], 40.0);
        let title = doc.query(".project-title").expect("title exists");

        effects.on_pointer_move(&mut doc, &mut timers, Some(&title), 100.0, 450.0);
        assert_eq!(doc.style(&cards[0], "--mouse-x").as_deref(), Some("60px"));
        assert_eq!(doc.style(&cards[0], "--mouse-y").as_deref(), Some("50px"));
        assert!(doc.by_id("project-card-styles").is_some());

        let body = doc.body().expect("body exists");
        effects.on_pointer_move(&mut doc, &mut timers, Some(&body), 10.0, 10.0);
        assert_eq!(doc.style(&cards[0], "--mouse-x").as_deref(), Some("50%"));
        assert_eq!(doc.style(&cards[0], "--mouse-y").as_deref(), Some("50%"));
    }

    #[test]
    fn card_glow_resets_when_pointer_leaves_the_window() {
        let mut doc = MemoryDocument::parse(PAGE);
        let mut timers = TimerQueue::new();
        let mut effects = attach(&mut doc, &mut timers, &EffectsConfig::default());
        let card = doc.query(".project-card").expect("card exists");
        let title = doc.query(".project-title").expect("title exists");

        effects.on_pointer_move(&mut doc, &mut timers, Some(&title), 100.0, 450.0);
        effects.on_pointer_leave(&mut doc, Some(&card));
        assert_ne!(doc.style(&card, "--mouse-x").as_deref(), Some("50%"));

        effects.on_pointer_leave(&mut doc, None);
        assert_eq!(doc.style(&card, "--mouse-x").as_deref(), Some("50%"));
        assert_eq!(doc.style(&card, "--mouse-y").as_deref(), Some("50%"));
    }
}
