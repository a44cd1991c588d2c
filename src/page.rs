use crate::config::EffectsConfig;
use crate::dom::Document;
use crate::site::{Task, Timers};
use regex::Regex;
use std::sync::LazyLock;

static COPYRIGHT_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(©|&copy;) \d{4}").expect("copyright pattern is valid"));

pub fn set_current_year<D: Document>(doc: &mut D, year: i32) {
    for node in doc.query_all(".current-year") {
        doc.set_text(&node, &year.to_string());
    }

    for footer in doc.query_all(".footer-bottom") {
        let html = doc.inner_html(&footer);
        let updated = COPYRIGHT_YEAR.replace_all(&html, format!("${{1}} {year}"));
        if updated != html {
            doc.set_inner_html(&footer, &updated);
        }
    }
}

pub fn on_load<D: Document>(doc: &mut D, timers: &mut Timers<D::Node>, config: &EffectsConfig) {
    if let Some(loader) = doc.query(".loader") {
        doc.set_style(&loader, "opacity", "0");
        timers.schedule(f64::from(config.loader_exit_ms), Task::Remove(loader));
    }

    for (index, element) in doc.query_all(".floating-element").iter().enumerate() {
        doc.set_style(element, "animation-delay", &format!("{}s", index as f64 * 0.5));
    }

    if let Some(body) = doc.body() {
        doc.add_class(&body, "loaded");
    }
}
