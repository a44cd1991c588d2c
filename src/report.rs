use crate::config;
use crate::dom::Document;
use crate::logging::LogLevel;
use crate::memory::MemoryDocument;
use crate::site::{Environment, Event, Site};

const SETTLE_MS: f64 = 10_000.0;

#[derive(Debug)]
pub struct HookReport {
    pub features: Vec<(&'static str, bool)>,
    pub observed: usize,
    pub revealed: usize,
    pub pending_timers: usize,
}

/// Attaches a site to the page, replays a load with every observed element
/// coming into view, and runs timers until the page settles.
pub fn hook_report(html: &str, year: i32, log_level: Option<LogLevel>) -> HookReport {
    let mut doc = MemoryDocument::parse(html);
    let mut config = config::load_or_default(&doc);
    if let Some(level) = log_level {
        config.log_level = level;
    }

    let mut random = || 0.5;
    let mut site = Site::attach(
        &mut doc,
        config,
        Environment {
            now: 0.0,
            year,
            random: &mut random,
        },
    );

    let observed = site.observed().to_vec();
    site.handle(&mut doc, 0.0, Event::Load);
    for target in &observed {
        site.handle(&mut doc, 0.0, Event::Visible { target: *target });
    }
    site.handle(&mut doc, SETTLE_MS, Event::Frame);

    HookReport {
        features: site.features(),
        observed: observed.len(),
        revealed: doc.query_all(".animate-in").len(),
        pending_timers: site.pending_timers(),
    }
}
