use crate::dom::Document;
use crate::logging::{log_event, LogLevel};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

pub const CONFIG_ELEMENT_ID: &str = "site-config";

const DEFAULT_SCROLL_THRESHOLD: f64 = 100.0;
const DEFAULT_HEADER_OFFSET: f64 = 80.0;
const DEFAULT_HIGHLIGHT_OFFSET: f64 = 100.0;
const DEFAULT_NAVBAR_SCROLLED_OFFSET: f64 = 50.0;
const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Info;

const DEFAULT_NOTIFICATION_DURATION_MS: u32 = 5_000;
const DEFAULT_NOTIFICATION_EXIT_MS: u32 = 300;
const DEFAULT_NOTIFICATION_ENTER_DELAY_MS: u32 = 10;

const DEFAULT_CONTACT_RECIPIENT: &str = "hello@example.com";
const DEFAULT_CONTACT_SUBJECT: &str = "Contact from the portfolio";
const DEFAULT_SUBMIT_DELAY_MS: u32 = 500;

const DEFAULT_REVEAL_SELECTOR: &str = concat!(
    ".project-card, .skill-category, .skill-item, .cert-card, ",
    ".contact-card, .stat-card, .about-text"
);
const DEFAULT_REVEAL_THRESHOLD: f64 = 0.1;
const DEFAULT_REVEAL_ROOT_MARGIN: &str = "0px 0px -100px 0px";
const DEFAULT_SKILL_DELAY_MS: u32 = 100;
const DEFAULT_SKILL_DURATION_MS: u32 = 1_500;
const DEFAULT_STAT_DURATION_MS: u32 = 2_000;
const DEFAULT_COUNTER_TICK_MS: u32 = 16;

const DEFAULT_PARTICLE_COUNT: usize = 50;
const DEFAULT_CURSOR_TRAIL_LENGTH: usize = 10;
const DEFAULT_CURSOR_TRAIL_MIN_WIDTH: f64 = 968.0;
const DEFAULT_TYPING_DELAY_MS: u32 = 500;
const DEFAULT_TYPING_SPEED_MS: u32 = 80;
const DEFAULT_LOADER_EXIT_MS: u32 = 300;

const OFFSET_BOUNDS: (f64, f64) = (0.0, 2_000.0);
const NOTIFICATION_DURATION_MS_BOUNDS: (u32, u32) = (500, 60_000);
const TRANSITION_MS_BOUNDS: (u32, u32) = (0, 5_000);
const REVEAL_THRESHOLD_BOUNDS: (f64, f64) = (0.0, 1.0);
const COUNTER_DURATION_MS_BOUNDS: (u32, u32) = (16, 10_000);
const COUNTER_TICK_MS_BOUNDS: (u32, u32) = (4, 100);
const PARTICLE_COUNT_BOUNDS: (usize, usize) = (0, 500);
const CURSOR_TRAIL_LENGTH_BOUNDS: (usize, usize) = (1, 100);
const TYPING_SPEED_MS_BOUNDS: (u32, u32) = (1, 1_000);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("site config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteConfig {
    pub scroll_threshold: f64,
    pub header_offset: f64,
    pub highlight_offset: f64,
    pub navbar_scrolled_offset: f64,
    pub log_level: LogLevel,
    pub notification: NotificationConfig,
    pub contact: ContactConfig,
    pub reveal: RevealConfig,
    pub effects: EffectsConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationConfig {
    pub duration_ms: u32,
    pub exit_ms: u32,
    pub enter_delay_ms: u32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactConfig {
    pub recipient: String,
    pub default_subject: String,
    pub submit_delay_ms: u32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RevealConfig {
    pub selector: String,
    pub threshold: f64,
    pub root_margin: String,
    pub skill_delay_ms: u32,
    pub skill_duration_ms: u32,
    pub stat_duration_ms: u32,
    pub tick_ms: u32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EffectsConfig {
    pub particle_count: usize,
    pub cursor_trail_length: usize,
    pub cursor_trail_min_width: f64,
    pub typing_delay_ms: u32,
    pub typing_speed_ms: u32,
    pub loader_exit_ms: u32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            scroll_threshold: DEFAULT_SCROLL_THRESHOLD,
            header_offset: DEFAULT_HEADER_OFFSET,
            highlight_offset: DEFAULT_HIGHLIGHT_OFFSET,
            navbar_scrolled_offset: DEFAULT_NAVBAR_SCROLLED_OFFSET,
            log_level: DEFAULT_LOG_LEVEL,
            notification: NotificationConfig::default(),
            contact: ContactConfig::default(),
            reveal: RevealConfig::default(),
            effects: EffectsConfig::default(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_NOTIFICATION_DURATION_MS,
            exit_ms: DEFAULT_NOTIFICATION_EXIT_MS,
            enter_delay_ms: DEFAULT_NOTIFICATION_ENTER_DELAY_MS,
        }
    }
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            recipient: DEFAULT_CONTACT_RECIPIENT.to_string(),
            default_subject: DEFAULT_CONTACT_SUBJECT.to_string(),
            submit_delay_ms: DEFAULT_SUBMIT_DELAY_MS,
        }
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            selector: DEFAULT_REVEAL_SELECTOR.to_string(),
            threshold: DEFAULT_REVEAL_THRESHOLD,
            root_margin: DEFAULT_REVEAL_ROOT_MARGIN.to_string(),
            skill_delay_ms: DEFAULT_SKILL_DELAY_MS,
            skill_duration_ms: DEFAULT_SKILL_DURATION_MS,
            stat_duration_ms: DEFAULT_STAT_DURATION_MS,
            tick_ms: DEFAULT_COUNTER_TICK_MS,
        }
    }
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            particle_count: DEFAULT_PARTICLE_COUNT,
            cursor_trail_length: DEFAULT_CURSOR_TRAIL_LENGTH,
            cursor_trail_min_width: DEFAULT_CURSOR_TRAIL_MIN_WIDTH,
            typing_delay_ms: DEFAULT_TYPING_DELAY_MS,
            typing_speed_ms: DEFAULT_TYPING_SPEED_MS,
            loader_exit_ms: DEFAULT_LOADER_EXIT_MS,
        }
    }
}

impl SiteConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let parsed: Self = serde_json::from_str(raw)?;
        Ok(parsed.sanitized())
    }

    fn sanitized(mut self) -> Self {
        self.scroll_threshold =
            within_bounds(self.scroll_threshold, DEFAULT_SCROLL_THRESHOLD, OFFSET_BOUNDS);
        self.header_offset =
            within_bounds(self.header_offset, DEFAULT_HEADER_OFFSET, OFFSET_BOUNDS);
        self.highlight_offset =
            within_bounds(self.highlight_offset, DEFAULT_HIGHLIGHT_OFFSET, OFFSET_BOUNDS);
        self.navbar_scrolled_offset = within_bounds(
            self.navbar_scrolled_offset,
            DEFAULT_NAVBAR_SCROLLED_OFFSET,
            OFFSET_BOUNDS,
        );

        let notification = &mut self.notification;
        notification.duration_ms = within_bounds(
            notification.duration_ms,
            DEFAULT_NOTIFICATION_DURATION_MS,
            NOTIFICATION_DURATION_MS_BOUNDS,
        );
        notification.exit_ms =
            within_bounds(notification.exit_ms, DEFAULT_NOTIFICATION_EXIT_MS, TRANSITION_MS_BOUNDS);
        notification.enter_delay_ms = within_bounds(
            notification.enter_delay_ms,
            DEFAULT_NOTIFICATION_ENTER_DELAY_MS,
            TRANSITION_MS_BOUNDS,
        );

        let contact = &mut self.contact;
        contact.recipient = non_empty_or(&contact.recipient, DEFAULT_CONTACT_RECIPIENT);
        contact.default_subject = non_empty_or(&contact.default_subject, DEFAULT_CONTACT_SUBJECT);
        contact.submit_delay_ms =
            within_bounds(contact.submit_delay_ms, DEFAULT_SUBMIT_DELAY_MS, TRANSITION_MS_BOUNDS);

        let reveal = &mut self.reveal;
        reveal.selector = non_empty_or(&reveal.selector, DEFAULT_REVEAL_SELECTOR);
        reveal.root_margin = non_empty_or(&reveal.root_margin, DEFAULT_REVEAL_ROOT_MARGIN);
        reveal.threshold =
            within_bounds(reveal.threshold, DEFAULT_REVEAL_THRESHOLD, REVEAL_THRESHOLD_BOUNDS);
        reveal.skill_delay_ms =
            within_bounds(reveal.skill_delay_ms, DEFAULT_SKILL_DELAY_MS, TRANSITION_MS_BOUNDS);
        reveal.skill_duration_ms = within_bounds(
            reveal.skill_duration_ms,
            DEFAULT_SKILL_DURATION_MS,
            COUNTER_DURATION_MS_BOUNDS,
        );
        reveal.stat_duration_ms = within_bounds(
            reveal.stat_duration_ms,
            DEFAULT_STAT_DURATION_MS,
            COUNTER_DURATION_MS_BOUNDS,
        );
        reveal.tick_ms =
            within_bounds(reveal.tick_ms, DEFAULT_COUNTER_TICK_MS, COUNTER_TICK_MS_BOUNDS);

        let effects = &mut self.effects;
        effects.particle_count =
            within_bounds(effects.particle_count, DEFAULT_PARTICLE_COUNT, PARTICLE_COUNT_BOUNDS);
        effects.cursor_trail_length = within_bounds(
            effects.cursor_trail_length,
            DEFAULT_CURSOR_TRAIL_LENGTH,
            CURSOR_TRAIL_LENGTH_BOUNDS,
        );
        effects.cursor_trail_min_width = within_bounds(
            effects.cursor_trail_min_width,
            DEFAULT_CURSOR_TRAIL_MIN_WIDTH,
            (0.0, 10_000.0),
        );
        effects.typing_delay_ms =
            within_bounds(effects.typing_delay_ms, DEFAULT_TYPING_DELAY_MS, TRANSITION_MS_BOUNDS);
        effects.typing_speed_ms =
            within_bounds(effects.typing_speed_ms, DEFAULT_TYPING_SPEED_MS, TYPING_SPEED_MS_BOUNDS);
        effects.loader_exit_ms =
            within_bounds(effects.loader_exit_ms, DEFAULT_LOADER_EXIT_MS, TRANSITION_MS_BOUNDS);

        self
    }
}

pub fn from_document<D: Document>(doc: &D) -> Result<SiteConfig, ConfigError> {
    match doc.by_id(CONFIG_ELEMENT_ID) {
        Some(node) => SiteConfig::from_json(&doc.text(&node)),
        None => Ok(SiteConfig::default()),
    }
}

pub fn load_or_default<D: Document>(doc: &D) -> SiteConfig {
    from_document(doc).unwrap_or_else(|error| {
        let fallback = SiteConfig::default();
        log_event(
            &fallback,
            LogLevel::Warn,
            "config.invalid",
            json!({ "error": error.to_string() }),
        );
        fallback
    })
}

fn within_bounds<T: PartialOrd + Copy>(value: T, default: T, bounds: (T, T)) -> T {
    if value >= bounds.0 && value <= bounds.1 {
        value
    } else {
        default
    }
}

fn non_empty_or(value: &str, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocument;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = SiteConfig::from_json(r#"{ "contact": { "recipient": "ana@example.com" } }"#)
            .expect("partial config should parse");

        assert_eq!(config.contact.recipient, "ana@example.com");
        assert_eq!(config.contact.default_subject, DEFAULT_CONTACT_SUBJECT);
        assert_eq!(config.notification.duration_ms, DEFAULT_NOTIFICATION_DURATION_MS);
        assert_eq!(config.effects.cursor_trail_length, DEFAULT_CURSOR_TRAIL_LENGTH);
    }

    #[test]
    fn out_of_bounds_values_use_defaults() {
        let config = SiteConfig::from_json(
            r#"{
                "headerOffset": -4,
                "notification": { "durationMs": 10 },
                "reveal": { "threshold": 3.5, "tickMs": 16 },
                "effects": { "cursorTrailLength": 0, "particleCount": 12 }
            }"#,
        )
        .expect("config should parse");

        assert_eq!(config.header_offset, DEFAULT_HEADER_OFFSET);
        assert_eq!(config.notification.duration_ms, DEFAULT_NOTIFICATION_DURATION_MS);
        assert_eq!(config.reveal.threshold, DEFAULT_REVEAL_THRESHOLD);
        assert_eq!(config.effects.cursor_trail_length, DEFAULT_CURSOR_TRAIL_LENGTH);
        assert_eq!(config.effects.particle_count, 12);
    }

    #[test]
    fn log_level_is_read_in_lowercase() {
        let config =
            SiteConfig::from_json(r#"{ "logLevel": "debug" }"#).expect("config should parse");
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(SiteConfig::from_json("{ nope"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn config_is_read_from_embedded_script_block() {
        let doc = MemoryDocument::parse(
            r#"<html><head>
                <script type="application/json" id="site-config">{ "scrollThreshold": 240 }</script>
            </head><body></body></html>"#,
        );

        let config = from_document(&doc).expect("embedded config should parse");
        assert_eq!(config.scroll_threshold, 240.0);
    }

    #[test]
    fn invalid_embedded_config_falls_back_to_defaults() {
        let doc = MemoryDocument::parse(concat!(
            r#"<html><head><script type="application/json" id="site-config">"#,
            "[1, 2</script></head></html>",
        ));

        assert!(from_document(&doc).is_err());
        assert_eq!(load_or_default(&doc).scroll_threshold, DEFAULT_SCROLL_THRESHOLD);
    }
}
