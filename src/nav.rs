use crate::config::SiteConfig;
use crate::dom::Document;

const MENU_OPEN_CLASS: &str = "active";
const ACTIVE_LINK_CLASS: &str = "active";
const SCROLLED_CLASS: &str = "scrolled";
const ICON_CLOSED: &str = "fa-bars";
const ICON_OPEN: &str = "fa-times";

pub struct Navigation<N> {
    toggle: Option<N>,
    menu: Option<N>,
    navbar: Option<N>,
    highlight_offset: f64,
    scrolled_offset: f64,
}

impl<N: Clone + PartialEq> Navigation<N> {
    pub fn attach<D: Document<Node = N>>(doc: &D, config: &SiteConfig) -> Self {
        Self {
            toggle: doc.query(".menu-toggle"),
            menu: doc.query(".nav-menu"),
            navbar: doc.query(".navbar"),
            highlight_offset: config.highlight_offset,
            scrolled_offset: config.navbar_scrolled_offset,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.menu.is_some() || self.navbar.is_some()
    }

    pub fn on_click<D: Document<Node = N>>(&self, doc: &mut D, target: &N) {
        if doc.closest(target, ".menu-toggle").is_some() {
            self.toggle_menu(doc);
        } else if let Some(link) = doc.closest(target, ".nav-link") {
            self.select_link(doc, &link);
        }
    }

    /// Flips the mobile menu and returns whether it is now open.
    pub fn toggle_menu<D: Document<Node = N>>(&self, doc: &mut D) -> bool {
        let Some(menu) = &self.menu else {
            return false;
        };
        let open = doc.toggle_class(menu, MENU_OPEN_CLASS);
        self.sync_icon(doc, open);
        open
    }

    pub fn is_menu_open<D: Document<Node = N>>(&self, doc: &D) -> bool {
        self.menu
            .as_ref()
            .is_some_and(|menu| doc.has_class(menu, MENU_OPEN_CLASS))
    }

    pub fn close_menu<D: Document<Node = N>>(&self, doc: &mut D) {
        if let Some(menu) = &self.menu {
            doc.remove_class(menu, MENU_OPEN_CLASS);
        }
        self.sync_icon(doc, false);
    }

    pub fn select_link<D: Document<Node = N>>(&self, doc: &mut D, link: &N) {
        self.close_menu(doc);
        for other in doc.query_all(".nav-link") {
            doc.remove_class(&other, ACTIVE_LINK_CLASS);
        }
        doc.add_class(link, ACTIVE_LINK_CLASS);
    }

    pub fn on_scroll<D: Document<Node = N>>(&self, doc: &mut D) {
        if let Some(navbar) = &self.navbar {
            if doc.scroll_y() > self.scrolled_offset {
                doc.add_class(navbar, SCROLLED_CLASS);
            } else {
                doc.remove_class(navbar, SCROLLED_CLASS);
            }
        }
        self.update_active_link(doc);
    }

    /// Highlights the link of the section under the header line.
    ///
    /// Sections are checked in document order against `[top, top + height)`
    /// and the last match wins. With no match the highlight is left alone.
    pub fn update_active_link<D: Document<Node = N>>(&self, doc: &mut D) -> Option<String> {
        let position = doc.scroll_y() + self.highlight_offset;
        let mut current = None;

        for section in doc.query_all("section[id]") {
            let top = doc.offset_top(&section);
            let height = doc.offset_height(&section);
            if top <= position && position < top + height {
                current = doc.attribute(&section, "id");
            }
        }

        let id = current?;
        for link in doc.query_all(".nav-link") {
            doc.remove_class(&link, ACTIVE_LINK_CLASS);
        }
        if let Some(link) = doc.query(&format!(r##".nav-link[href="#{id}"]"##)) {
            doc.add_class(&link, ACTIVE_LINK_CLASS);
        }
        Some(id)
    }

    fn sync_icon<D: Document<Node = N>>(&self, doc: &mut D, open: bool) {
        let Some(icon) = self
            .toggle
            .as_ref()
            .and_then(|toggle| doc.query_within(toggle, "i"))
        else {
            return;
        };

        let (from, to) = if open {
            (ICON_CLOSED, ICON_OPEN)
        } else {
            (ICON_OPEN, ICON_CLOSED)
        };
        doc.remove_class(&icon, from);
        doc.add_class(&icon, to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryDocument, NodeId};

    const PAGE: &str = r##"<html><body>
        <nav class="navbar">
            <button class="menu-toggle"><i class="fas fa-bars"></i></button>
            <ul class="nav-menu">
                <li><a class="nav-link active" href="#home">Home</a></li>
                <li><a class="nav-link" href="#about">About</a></li>
                <li><a class="nav-link" href="#projects">Projects</a></li>
            </ul>
        </nav>
        <section id="home"></section>
        <section id="about"></section>
        <section id="projects"></section>
    </body></html>"##;

    fn page() -> (MemoryDocument, Navigation<NodeId>) {
        let mut doc = MemoryDocument::parse(PAGE);
        for (id, top) in [("home", 0.0), ("about", 600.0), ("projects", 1_200.0)] {
            let section = doc.by_id(id).expect("section exists");
            doc.set_layout(&section, top, 600.0);
        }
        let nav = Navigation::attach(&doc, &SiteConfig::default());
        (doc, nav)
    }

    fn active_links(doc: &MemoryDocument) -> Vec<String> {
        doc.query_all(".nav-link.active")
            .iter()
            .filter_map(|link| doc.attribute(link, "href"))
            .collect()
    }

    fn icon_classes(doc: &MemoryDocument) -> String {
        let icon = doc.query(".menu-toggle i").expect("icon exists");
        doc.attribute(&icon, "class").unwrap_or_default()
    }

    #[test]
    fn toggling_twice_restores_menu_and_icon() {
        let (mut doc, nav) = page();
        let menu = doc.query(".nav-menu").expect("menu exists");
        let initial_icon = icon_classes(&doc);

        assert!(nav.toggle_menu(&mut doc));
        assert!(doc.has_class(&menu, "active"));
        assert!(icon_classes(&doc).contains("fa-times"));
        assert!(!icon_classes(&doc).contains("fa-bars"));

        assert!(!nav.toggle_menu(&mut doc));
        assert!(!doc.has_class(&menu, "active"));
        assert_eq!(icon_classes(&doc), initial_icon);
    }

    #[test]
    fn clicking_the_toggle_icon_opens_the_menu() {
        let (mut doc, nav) = page();
        let icon = doc.query(".menu-toggle i").expect("icon exists");

        nav.on_click(&mut doc, &icon);
        assert!(nav.is_menu_open(&doc));
    }

    #[test]
    fn link_click_closes_menu_and_moves_highlight() {
        let (mut doc, nav) = page();
        nav.toggle_menu(&mut doc);
        let projects = doc
            .query(r##".nav-link[href="#projects"]"##)
            .expect("projects link");

        nav.on_click(&mut doc, &projects);

        assert!(!nav.is_menu_open(&doc));
        assert!(icon_classes(&doc).contains("fa-bars"));
        assert_eq!(active_links(&doc), vec!["#projects".to_string()]);
    }

    #[test]
    fn scroll_highlights_section_under_header_line() {
        let (mut doc, nav) = page();

        doc.set_scroll_y(650.0);
        assert_eq!(nav.update_active_link(&mut doc).as_deref(), Some("about"));
        assert_eq!(active_links(&doc), vec!["#about".to_string()]);

        doc.set_scroll_y(1_100.0);
        assert_eq!(nav.update_active_link(&mut doc).as_deref(), Some("projects"));
        assert_eq!(active_links(&doc), vec!["#projects".to_string()]);
    }

    #[test]
    fn at_most_one_link_is_active_for_any_offset() {
        let (mut doc, nav) = page();

        for step in 0..40 {
            doc.set_scroll_y(f64::from(step) * 55.0);
            nav.update_active_link(&mut doc);
            assert!(active_links(&doc).len() <= 1, "offset {}", step * 55);
        }
    }

    #[test]
    fn no_matching_section_keeps_current_highlight() {
        let (mut doc, nav) = page();

        doc.set_scroll_y(5_000.0);
        assert_eq!(nav.update_active_link(&mut doc), None);
        assert_eq!(active_links(&doc), vec!["#home".to_string()]);
    }

    #[test]
    fn overlapping_sections_resolve_to_the_last_in_document_order() {
        let (mut doc, nav) = page();
        let about = doc.by_id("about").expect("about exists");
        doc.set_layout(&about, 0.0, 2_000.0);

        doc.set_scroll_y(0.0);
        assert_eq!(nav.update_active_link(&mut doc).as_deref(), Some("about"));
    }

    #[test]
    fn navbar_gets_scrolled_class_past_offset() {
        let (mut doc, nav) = page();
        let navbar = doc.query(".navbar").expect("navbar exists");

        doc.set_scroll_y(51.0);
        nav.on_scroll(&mut doc);
        assert!(doc.has_class(&navbar, "scrolled"));

        doc.set_scroll_y(10.0);
        nav.on_scroll(&mut doc);
        assert!(!doc.has_class(&navbar, "scrolled"));
    }

    #[test]
    fn missing_hooks_degrade_to_no_ops() {
        let mut doc = MemoryDocument::parse("<html><body><p>plain</p></body></html>");
        let nav = Navigation::attach(&doc, &SiteConfig::default());

        assert!(!nav.is_attached());
        assert!(!nav.toggle_menu(&mut doc));
        nav.close_menu(&mut doc);
        nav.on_scroll(&mut doc);
        assert_eq!(nav.update_active_link(&mut doc), None);
    }
}
