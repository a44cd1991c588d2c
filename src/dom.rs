use std::fmt::Debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

impl ScrollBehavior {
    pub fn for_motion(reduced_motion: bool) -> Self {
        if reduced_motion {
            Self::Instant
        } else {
            Self::Smooth
        }
    }
}

/// The slice of a browser document the enhancement controllers read and mutate.
///
/// Nodes are element handles. Lookups that find nothing return `None` or an
/// empty list, so a page without a given hook simply skips that behavior.
pub trait Document {
    type Node: Clone + PartialEq + Debug;

    fn query_all(&self, selector: &str) -> Vec<Self::Node>;

    fn query(&self, selector: &str) -> Option<Self::Node> {
        self.query_all(selector).into_iter().next()
    }

    fn query_within(&self, scope: &Self::Node, selector: &str) -> Option<Self::Node>;
    fn closest(&self, node: &Self::Node, selector: &str) -> Option<Self::Node>;
    fn by_id(&self, id: &str) -> Option<Self::Node>;
    fn body(&self) -> Option<Self::Node>;
    fn head(&self) -> Option<Self::Node>;

    fn create_element(&mut self, tag: &str) -> Option<Self::Node>;
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);
    fn prepend_child(&mut self, parent: &Self::Node, child: &Self::Node);
    fn remove(&mut self, node: &Self::Node);
    fn is_connected(&self, node: &Self::Node) -> bool;

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;
    fn add_class(&mut self, node: &Self::Node, class: &str);
    fn remove_class(&mut self, node: &Self::Node, class: &str);

    /// Returns whether the class is present afterwards.
    fn toggle_class(&mut self, node: &Self::Node, class: &str) -> bool {
        if self.has_class(node, class) {
            self.remove_class(node, class);
            false
        } else {
            self.add_class(node, class);
            true
        }
    }

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);
    fn text(&self, node: &Self::Node) -> String;
    fn set_text(&mut self, node: &Self::Node, text: &str);
    fn inner_html(&self, node: &Self::Node) -> String;
    fn set_inner_html(&mut self, node: &Self::Node, html: &str);
    fn style(&self, node: &Self::Node, property: &str) -> Option<String>;
    fn set_style(&mut self, node: &Self::Node, property: &str, value: &str);

    fn field_value(&self, node: &Self::Node) -> String;
    fn set_field_value(&mut self, node: &Self::Node, value: &str);
    fn set_disabled(&mut self, node: &Self::Node, disabled: bool);
    fn is_disabled(&self, node: &Self::Node) -> bool;

    fn offset_top(&self, node: &Self::Node) -> f64;
    fn offset_height(&self, node: &Self::Node) -> f64;
    /// Left/top of the node's bounding box in viewport coordinates.
    fn client_origin(&self, node: &Self::Node) -> (f64, f64);

    fn scroll_y(&self) -> f64;
    /// How far the page can scroll: scroll height minus client height.
    fn scroll_extent(&self) -> f64;
    fn viewport_width(&self) -> f64;
    fn prefers_reduced_motion(&self) -> bool;
    fn scroll_to(&mut self, top: f64, behavior: ScrollBehavior);
    fn navigate(&mut self, url: &str);
}

pub fn element_with_class<D: Document>(doc: &mut D, tag: &str, class: &str) -> Option<D::Node> {
    let node = doc.create_element(tag)?;
    doc.set_attribute(&node, "class", class);
    Some(node)
}

pub fn inject_style<D: Document>(doc: &mut D, marker_id: &str, css: &str) -> bool {
    if doc.by_id(marker_id).is_some() {
        return false;
    }

    let Some(head) = doc.head() else {
        return false;
    };
    let Some(style) = doc.create_element("style") else {
        return false;
    };

    doc.set_attribute(&style, "id", marker_id);
    doc.set_text(&style, css);
    doc.append_child(&head, &style);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocument;

    #[test]
    fn style_injection_is_idempotent() {
        let mut doc = MemoryDocument::parse("<html><head></head><body></body></html>");

        assert!(inject_style(&mut doc, "notification-styles", ".notification { top: 0; }"));
        assert!(!inject_style(&mut doc, "notification-styles", ".notification { top: 0; }"));
        assert_eq!(doc.query_all("style#notification-styles").len(), 1);
    }

    #[test]
    fn toggle_class_reports_new_state() {
        let mut doc = MemoryDocument::parse(r#"<body><nav class="nav-menu"></nav></body>"#);
        let menu = doc.query(".nav-menu").expect("menu exists");

        assert!(doc.toggle_class(&menu, "active"));
        assert!(doc.has_class(&menu, "active"));
        assert!(!doc.toggle_class(&menu, "active"));
        assert!(!doc.has_class(&menu, "active"));
    }

    #[test]
    fn reduced_motion_scrolls_instantly() {
        assert_eq!(ScrollBehavior::for_motion(true), ScrollBehavior::Instant);
        assert_eq!(ScrollBehavior::for_motion(false), ScrollBehavior::Smooth);
    }
}
