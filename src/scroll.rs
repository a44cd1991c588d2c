use crate::config::SiteConfig;
use crate::dom::{element_with_class, Document, ScrollBehavior};

pub const ANCHOR_SELECTOR: &str = r##"a[href^="#"]"##;
const BACK_TO_TOP_ID: &str = "backToTop";
const VISIBLE_CLASS: &str = "visible";
const PROGRESS_CLASS: &str = "scroll-progress";

pub struct ScrollControls<N> {
    back_to_top: Option<N>,
    progress: Option<N>,
    progress_dirty: bool,
    has_anchors: bool,
    header_offset: f64,
    threshold: f64,
}

impl<N: Clone + PartialEq> ScrollControls<N> {
    pub fn attach<D: Document<Node = N>>(doc: &mut D, config: &SiteConfig) -> Self {
        let progress = match doc.query(&format!(".{PROGRESS_CLASS}")) {
            Some(existing) => Some(existing),
            None => doc.body().and_then(|body| {
                let bar = element_with_class(doc, "div", PROGRESS_CLASS)?;
                doc.append_child(&body, &bar);
                Some(bar)
            }),
        };

        Self {
            back_to_top: doc.by_id(BACK_TO_TOP_ID),
            progress,
            progress_dirty: false,
            has_anchors: !doc.query_all(ANCHOR_SELECTOR).is_empty(),
            header_offset: config.header_offset,
            threshold: config.scroll_threshold,
        }
    }

    pub fn has_anchors(&self) -> bool {
        self.has_anchors
    }

    pub fn has_back_to_top(&self) -> bool {
        self.back_to_top.is_some()
    }

    pub fn has_progress(&self) -> bool {
        self.progress.is_some()
    }

    pub fn on_scroll<D: Document<Node = N>>(&mut self, doc: &mut D) {
        if let Some(button) = &self.back_to_top {
            if doc.scroll_y() > self.threshold {
                doc.add_class(button, VISIBLE_CLASS);
            } else {
                doc.remove_class(button, VISIBLE_CLASS);
            }
        }
        self.progress_dirty = true;
    }

    /// Applied once per frame, however many scroll events arrived since.
    pub fn refresh_progress<D: Document<Node = N>>(&mut self, doc: &mut D) {
        if !std::mem::take(&mut self.progress_dirty) {
            return;
        }
        let Some(bar) = &self.progress else {
            return;
        };

        let extent = doc.scroll_extent();
        let percent = if extent > 0.0 {
            (doc.scroll_y() / extent * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        doc.set_style(bar, "width", &format!("{percent}%"));
    }

    /// Returns true when the click was an in-page anchor whose default
    /// navigation must be suppressed.
    pub fn on_click<D: Document<Node = N>>(&self, doc: &mut D, target: &N) -> bool {
        let behavior = ScrollBehavior::for_motion(doc.prefers_reduced_motion());

        let on_back_to_top = doc.closest(target, &format!("#{BACK_TO_TOP_ID}")).is_some();
        if self.back_to_top.is_some() && on_back_to_top {
            doc.scroll_to(0.0, behavior);
        }

        let Some(anchor) = doc.closest(target, ANCHOR_SELECTOR) else {
            return false;
        };
        let href = doc.attribute(&anchor, "href").unwrap_or_default();
        let fragment = href.trim_start_matches('#');
        if fragment.is_empty() {
            return true;
        }

        if let Some(section) = doc.by_id(fragment) {
            let top = doc.offset_top(&section) - self.header_offset;
            doc.scroll_to(top, behavior);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryDocument, NodeId};

    const PAGE: &str = r##"<html><body>
        <a class="nav-link" href="#about"><span>About</span></a>
        <a class="logo" href="#">Home</a>
        <a class="ghost" href="#missing">Nowhere</a>
        <a class="external" href="https://example.com">Elsewhere</a>
        <section id="about"></section>
        <button id="backToTop"><i class="fas fa-arrow-up"></i></button>
    </body></html>"##;

    fn page() -> (MemoryDocument, ScrollControls<NodeId>) {
        let mut doc = MemoryDocument::parse(PAGE);
        let about = doc.by_id("about").expect("section exists");
        doc.set_layout(&about, 900.0, 400.0);
        let controls = ScrollControls::attach(&mut doc, &SiteConfig::default());
        (doc, controls)
    }

    #[test]
    fn anchor_click_scrolls_below_fixed_header() {
        let (mut doc, controls) = page();
        let label = doc.query(".nav-link span").expect("label exists");

        assert!(controls.on_click(&mut doc, &label));
        assert_eq!(doc.scroll_requests(), &[(820.0, ScrollBehavior::Smooth)]);
    }

    #[test]
    fn bare_hash_and_missing_targets_do_nothing() {
        let (mut doc, controls) = page();
        let logo = doc.query(".logo").expect("logo exists");
        let ghost = doc.query(".ghost").expect("ghost exists");

        assert!(controls.on_click(&mut doc, &logo));
        assert!(controls.on_click(&mut doc, &ghost));
        assert!(doc.scroll_requests().is_empty());
    }

    #[test]
    fn external_links_are_left_to_the_browser() {
        let (mut doc, controls) = page();
        let external = doc.query(".external").expect("link exists");

        assert!(!controls.on_click(&mut doc, &external));
        assert!(doc.scroll_requests().is_empty());
    }

    #[test]
    fn reduced_motion_jumps_instead_of_animating() {
        let (mut doc, controls) = page();
        doc.set_reduced_motion(true);
        let link = doc.query(".nav-link").expect("link exists");

        controls.on_click(&mut doc, &link);
        assert_eq!(doc.scroll_requests(), &[(820.0, ScrollBehavior::Instant)]);
    }

    #[test]
    fn back_to_top_visibility_follows_threshold() {
        let (mut doc, mut controls) = page();
        let button = doc.by_id("backToTop").expect("button exists");

        doc.set_scroll_y(101.0);
        controls.on_scroll(&mut doc);
        assert!(doc.has_class(&button, "visible"));

        doc.set_scroll_y(100.0);
        controls.on_scroll(&mut doc);
        assert!(!doc.has_class(&button, "visible"));
    }

    #[test]
    fn back_to_top_click_scrolls_to_origin() {
        let (mut doc, controls) = page();
        let icon = doc.query("#backToTop i").expect("icon exists");
        doc.set_scroll_y(2_000.0);

        assert!(!controls.on_click(&mut doc, &icon));
        assert_eq!(doc.scroll_requests(), &[(0.0, ScrollBehavior::Smooth)]);
        assert_eq!(doc.scroll_y(), 0.0);
    }

    #[test]
    fn progress_bar_updates_once_per_frame() {
        let (mut doc, mut controls) = page();
        let bar = doc.query(".scroll-progress").expect("bar appended to body");
        doc.set_scroll_height(2_720.0);

        doc.set_scroll_y(500.0);
        controls.on_scroll(&mut doc);
        doc.set_scroll_y(1_000.0);
        controls.on_scroll(&mut doc);
        assert_eq!(doc.style(&bar, "width"), None);

        controls.refresh_progress(&mut doc);
        assert_eq!(doc.style(&bar, "width").as_deref(), Some("50%"));

        doc.set_scroll_y(0.0);
        controls.refresh_progress(&mut doc);
        assert_eq!(doc.style(&bar, "width").as_deref(), Some("50%"));
    }

    #[test]
    fn progress_bar_is_not_duplicated_on_reattach() {
        let (mut doc, _) = page();
        let again = ScrollControls::<NodeId>::attach(&mut doc, &SiteConfig::default());

        assert!(again.has_progress());
        assert_eq!(doc.query_all(".scroll-progress").len(), 1);
    }

    #[test]
    fn short_pages_report_zero_progress() {
        let (mut doc, mut controls) = page();
        let bar = doc.query(".scroll-progress").expect("bar exists");

        controls.on_scroll(&mut doc);
        controls.refresh_progress(&mut doc);
        assert_eq!(doc.style(&bar, "width").as_deref(), Some("0%"));
    }
}
