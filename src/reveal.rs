use crate::config::RevealConfig;
use crate::dom::Document;
use crate::site::{Task, Timers};

const REVEALED_CLASS: &str = "animate-in";

/// Linear count from a start value to a target, one step per tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Counter {
    current: f64,
    end: f64,
    increment: f64,
    tick_ms: f64,
    prefix: String,
    suffix: String,
    final_text: Option<String>,
    finished: bool,
}

impl Counter {
    pub fn new(start: f64, end: f64, duration_ms: f64, tick_ms: f64, suffix: &str) -> Self {
        let steps = (duration_ms / tick_ms).max(1.0);
        Self {
            current: start,
            end,
            increment: (end - start) / steps,
            tick_ms,
            prefix: String::new(),
            suffix: suffix.to_string(),
            final_text: None,
            finished: false,
        }
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    /// Text shown once the target is reached, in place of the computed value.
    pub fn ending_on(mut self, text: &str) -> Self {
        self.final_text = Some(text.to_string());
        self
    }

    /// Advances one tick and reports whether the target has been reached.
    pub fn step(&mut self) -> bool {
        self.current += self.increment;
        if self.increment <= 0.0 || self.current >= self.end {
            self.current = self.end;
            self.finished = true;
        }
        self.finished
    }

    pub fn display(&self) -> String {
        match &self.final_text {
            Some(text) if self.finished => text.clone(),
            _ => format!("{}{}{}", self.prefix, self.current.round() as i64, self.suffix),
        }
    }
}

pub fn count_up<D: Document>(
    doc: &mut D,
    timers: &mut Timers<D::Node>,
    node: D::Node,
    mut counter: Counter,
) {
    let finished = counter.step();
    doc.set_text(&node, &counter.display());
    if !finished {
        start_counter(timers, node, counter);
    }
}

/// The first value shows one tick after the start, like an interval timer.
pub fn start_counter<N>(timers: &mut Timers<N>, node: N, counter: Counter) {
    let tick_ms = counter.tick_ms;
    timers.schedule(tick_ms, Task::CountUp { node, counter });
}

/// `"85%"` → `(85, "%")`; leading whitespace is skipped.
fn leading_number(text: &str) -> Option<(u64, String)> {
    let trimmed = text.trim_start();
    let digits: String = trimmed.chars().take_while(char::is_ascii_digit).collect();
    let value = digits.parse().ok()?;
    Some((value, trimmed[digits.len()..].trim_end().to_string()))
}

struct StatText {
    value: u64,
    prefix: String,
    suffix: String,
}

/// `"1,500+"` → 1500 with suffix `"+"`. The first run of digits is the
/// value, commas between digits are thousands separators, and whatever
/// surrounds the run is kept as prefix and suffix.
fn stat_number(text: &str) -> Option<StatText> {
    let text = text.trim();
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];

    let mut digits = String::new();
    let mut end = rest.len();
    let mut chars = rest.char_indices().peekable();
    while let Some((index, c)) = chars.next() {
        let separator = c == ',' && chars.peek().is_some_and(|(_, next)| next.is_ascii_digit());
        if c.is_ascii_digit() {
            digits.push(c);
        } else if !separator {
            end = index;
            break;
        }
    }

    Some(StatText {
        value: digits.parse().ok()?,
        prefix: text[..start].to_string(),
        suffix: rest[end..].to_string(),
    })
}

/// Elements waiting for their first appearance in the viewport.
pub struct Animator<N> {
    armed: Vec<N>,
    config: RevealConfig,
}

impl<N: Clone + PartialEq> Animator<N> {
    pub fn attach<D: Document<Node = N>>(doc: &D, config: &RevealConfig) -> Self {
        Self {
            armed: doc.query_all(&config.selector),
            config: config.clone(),
        }
    }

    pub fn observed(&self) -> &[N] {
        &self.armed
    }

    /// Runs the reveal for an element the first time it becomes visible.
    /// Later calls for the same element are ignored.
    pub fn on_visible<D: Document<Node = N>>(
        &mut self,
        doc: &mut D,
        timers: &mut Timers<N>,
        target: &N,
    ) -> bool {
        let Some(index) = self.armed.iter().position(|node| node == target) else {
            return false;
        };
        self.armed.remove(index);

        doc.add_class(target, REVEALED_CLASS);
        if doc.has_class(target, "skill-item") {
            self.start_skill_bar(doc, timers, target);
        }
        if doc.has_class(target, "stat-card") {
            self.start_stat_counter(doc, timers, target);
        }
        true
    }

    fn start_skill_bar<D: Document<Node = N>>(
        &self,
        doc: &mut D,
        timers: &mut Timers<N>,
        item: &N,
    ) {
        let (Some(level), Some(percent)) = (
            doc.query_within(item, ".skill-level"),
            doc.query_within(item, ".skill-percent"),
        ) else {
            return;
        };

        let width = doc
            .attribute(&level, "data-width")
            .or_else(|| doc.style(&level, "width"))
            .unwrap_or_default();
        let counter = leading_number(&doc.text(&percent)).map(|(target, suffix)| {
            Counter::new(
                0.0,
                target as f64,
                f64::from(self.config.skill_duration_ms),
                f64::from(self.config.tick_ms),
                &suffix,
            )
        });

        doc.set_style(&level, "width", "0");
        timers.schedule(
            f64::from(self.config.skill_delay_ms),
            Task::FillSkillBar {
                level,
                width,
                percent,
                counter,
            },
        );
    }

    fn start_stat_counter<D: Document<Node = N>>(
        &self,
        doc: &mut D,
        timers: &mut Timers<N>,
        card: &N,
    ) {
        let Some(number) = doc.query_within(card, ".stat-number") else {
            return;
        };
        let original = doc.text(&number);
        let Some(stat) = stat_number(&original) else {
            return;
        };

        let counter = Counter::new(
            0.0,
            stat.value as f64,
            f64::from(self.config.stat_duration_ms),
            f64::from(self.config.tick_ms),
            &stat.suffix,
        )
        .with_prefix(&stat.prefix)
        .ending_on(&original);
        start_counter(timers, number, counter);
    }
}
