use crate::dom::{Document, ScrollBehavior};
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

const NODE_ID_ATTR: &str = "data-memory-node";
const DEFAULT_VIEWPORT: (f64, f64) = (1280.0, 720.0);
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Clone, Debug)]
enum Kind {
    Document,
    Element(String),
    Text(String),
}

#[derive(Clone, Copy, Debug, Default)]
struct Layout {
    left: f64,
    top: f64,
    height: f64,
}

#[derive(Clone, Debug)]
struct NodeData {
    kind: Kind,
    attributes: Vec<(String, String)>,
    styles: BTreeMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    value: String,
    disabled: bool,
    layout: Layout,
}

impl NodeData {
    fn new(kind: Kind) -> Self {
        Self {
            kind,
            attributes: Vec::new(),
            styles: BTreeMap::new(),
            parent: None,
            children: Vec::new(),
            value: String::new(),
            disabled: false,
            layout: Layout::default(),
        }
    }

    fn tag(&self) -> Option<&str> {
        match &self.kind {
            Kind::Element(tag) => Some(tag),
            _ => None,
        }
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// In-process document used by the native hook report and the tests.
///
/// Selector matching is delegated to `scraper`: the live tree is serialized
/// with a node-id attribute on every element and re-parsed, so queries always
/// see the current classes and attributes. Layout and viewport metrics are
/// whatever the caller sets.
pub struct MemoryDocument {
    nodes: Vec<NodeData>,
    root: NodeId,
    scroll_y: f64,
    scroll_height: f64,
    viewport: (f64, f64),
    reduced_motion: bool,
    scroll_requests: Vec<(f64, ScrollBehavior)>,
    navigations: Vec<String>,
}

impl MemoryDocument {
    pub fn parse(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut document = Self {
            nodes: vec![NodeData::new(Kind::Document)],
            root: NodeId(0),
            scroll_y: 0.0,
            scroll_height: DEFAULT_VIEWPORT.1,
            viewport: DEFAULT_VIEWPORT,
            reduced_motion: false,
            scroll_requests: Vec::new(),
            navigations: Vec::new(),
        };
        let root = document.root;
        document.import_element(parsed.root_element(), root);
        document
    }

    pub fn set_layout(&mut self, node: &NodeId, top: f64, height: f64) {
        let layout = &mut self.nodes[node.0].layout;
        layout.top = top;
        layout.height = height;
    }

    pub fn set_left(&mut self, node: &NodeId, left: f64) {
        self.nodes[node.0].layout.left = left;
    }

    pub fn set_scroll_y(&mut self, scroll_y: f64) {
        self.scroll_y = scroll_y;
    }

    pub fn set_scroll_height(&mut self, scroll_height: f64) {
        self.scroll_height = scroll_height;
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = (width, height);
    }

    pub fn set_reduced_motion(&mut self, reduced_motion: bool) {
        self.reduced_motion = reduced_motion;
    }

    pub fn scroll_requests(&self) -> &[(f64, ScrollBehavior)] {
        &self.scroll_requests
    }

    pub fn navigations(&self) -> &[String] {
        &self.navigations
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(data);
        NodeId(self.nodes.len() - 1)
    }

    fn import_element(&mut self, element: ElementRef<'_>, parent: NodeId) {
        let value = element.value();
        let mut data = NodeData::new(Kind::Element(value.name().to_ascii_lowercase()));
        for (name, attr) in value.attrs() {
            data.attributes.push((name.to_string(), attr.to_string()));
        }
        if let Some(inline) = value.attr("style") {
            data.styles = parse_inline_style(inline);
        }
        match value.name() {
            "input" => data.value = value.attr("value").unwrap_or_default().to_string(),
            "textarea" => data.value = element.text().collect(),
            _ => {}
        }
        data.disabled = value.attr("disabled").is_some();

        let id = self.alloc(data);
        self.attach(parent, id, false);
        self.import_children(element, id);
    }

    fn import_children(&mut self, element: ElementRef<'_>, parent: NodeId) {
        for child in element.children() {
            if let Some(child_element) = ElementRef::wrap(child) {
                self.import_element(child_element, parent);
            } else if let Some(text) = child.value().as_text() {
                let id = self.alloc(NodeData::new(Kind::Text(text.to_string())));
                self.attach(parent, id, false);
            }
        }
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, first: bool) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        let children = &mut self.nodes[parent.0].children;
        if first {
            children.insert(0, child);
        } else {
            children.push(child);
        }
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != node);
        }
    }

    fn clear_children(&mut self, node: NodeId) {
        for child in std::mem::take(&mut self.nodes[node.0].children) {
            self.nodes[child.0].parent = None;
        }
    }

    fn is_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.nodes[node.0].parent;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.nodes[parent.0].parent;
        }
        false
    }

    fn elements_in_order(&self) -> Vec<NodeId> {
        let mut ordered = Vec::new();
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if self.nodes[node.0].tag().is_some() {
                ordered.push(node);
            }
            stack.extend(self.nodes[node.0].children.iter().rev().copied());
        }
        ordered
    }

    fn first_with_tag(&self, tag: &str) -> Option<NodeId> {
        self.elements_in_order()
            .into_iter()
            .find(|node| self.nodes[node.0].tag() == Some(tag))
    }

    fn serialize(&self, node: NodeId, tagged: bool, out: &mut String) {
        let data = &self.nodes[node.0];
        match &data.kind {
            Kind::Document => {
                for child in &data.children {
                    self.serialize(*child, tagged, out);
                }
            }
            Kind::Text(text) => out.push_str(&escape_text(text)),
            Kind::Element(tag) => {
                out.push('<');
                out.push_str(tag);
                if tagged {
                    out.push_str(&format!(" {NODE_ID_ATTR}=\"{}\"", node.0));
                }
                for (name, value) in &data.attributes {
                    out.push_str(&format!(" {name}=\"{}\"", escape_attribute(value)));
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for child in &data.children {
                    self.serialize(*child, tagged, out);
                }
                out.push_str(&format!("</{tag}>"));
            }
        }
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let data = &self.nodes[node.0];
        if let Kind::Text(text) = &data.kind {
            out.push_str(text);
        }
        for child in &data.children {
            self.collect_text(*child, out);
        }
    }

    fn write_class_list(&mut self, node: NodeId, classes: &[&str]) {
        let joined = classes.join(" ");
        self.set_attribute(&node, "class", &joined);
    }

    fn class_list(&self, node: NodeId) -> Vec<String> {
        self.nodes[node.0]
            .attribute("class")
            .map(|value| value.split_whitespace().map(ToString::to_string).collect())
            .unwrap_or_default()
    }
}

impl Document for MemoryDocument {
    type Node = NodeId;

    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        let Ok(selector) = Selector::parse(selector) else {
            return Vec::new();
        };

        let mut markup = String::new();
        self.serialize(self.root, true, &mut markup);
        let snapshot = Html::parse_document(&markup);

        snapshot
            .select(&selector)
            .filter_map(|element| element.value().attr(NODE_ID_ATTR)?.parse::<usize>().ok())
            .map(NodeId)
            .collect()
    }

    fn query_within(&self, scope: &NodeId, selector: &str) -> Option<NodeId> {
        self.query_all(selector)
            .into_iter()
            .find(|node| self.is_descendant(*node, *scope))
    }

    fn closest(&self, node: &NodeId, selector: &str) -> Option<NodeId> {
        let matches = self.query_all(selector);
        let mut current = Some(*node);
        while let Some(candidate) = current {
            if matches.contains(&candidate) {
                return Some(candidate);
            }
            current = self.nodes[candidate.0].parent;
        }
        None
    }

    fn by_id(&self, id: &str) -> Option<NodeId> {
        self.elements_in_order()
            .into_iter()
            .find(|node| self.nodes[node.0].attribute("id") == Some(id))
    }

    fn body(&self) -> Option<NodeId> {
        self.first_with_tag("body")
    }

    fn head(&self) -> Option<NodeId> {
        self.first_with_tag("head")
    }

    fn create_element(&mut self, tag: &str) -> Option<NodeId> {
        Some(self.alloc(NodeData::new(Kind::Element(tag.to_ascii_lowercase()))))
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
        self.attach(*parent, *child, false);
    }

    fn prepend_child(&mut self, parent: &NodeId, child: &NodeId) {
        self.attach(*parent, *child, true);
    }

    fn remove(&mut self, node: &NodeId) {
        self.detach(*node);
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        *node == self.root || self.is_descendant(*node, self.root)
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.class_list(*node).iter().any(|name| name == class)
    }

    fn add_class(&mut self, node: &NodeId, class: &str) {
        let mut classes = self.class_list(*node);
        if !classes.iter().any(|name| name == class) {
            classes.push(class.to_string());
        }
        let borrowed: Vec<&str> = classes.iter().map(String::as_str).collect();
        self.write_class_list(*node, &borrowed);
    }

    fn remove_class(&mut self, node: &NodeId, class: &str) {
        let classes = self.class_list(*node);
        let kept: Vec<&str> = classes
            .iter()
            .map(String::as_str)
            .filter(|name| *name != class)
            .collect();
        self.write_class_list(*node, &kept);
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.nodes[node.0].attribute(name).map(ToString::to_string)
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
        let attributes = &mut self.nodes[node.0].attributes;
        match attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => attributes.push((name.to_string(), value.to_string())),
        }
    }

    fn text(&self, node: &NodeId) -> String {
        let mut out = String::new();
        self.collect_text(*node, &mut out);
        out
    }

    fn set_text(&mut self, node: &NodeId, text: &str) {
        self.clear_children(*node);
        let text_node = self.alloc(NodeData::new(Kind::Text(text.to_string())));
        self.attach(*node, text_node, false);
    }

    fn inner_html(&self, node: &NodeId) -> String {
        let mut out = String::new();
        for child in &self.nodes[node.0].children {
            self.serialize(*child, false, &mut out);
        }
        out
    }

    fn set_inner_html(&mut self, node: &NodeId, html: &str) {
        self.clear_children(*node);
        let fragment = Html::parse_fragment(html);
        self.import_children(fragment.root_element(), *node);
    }

    fn style(&self, node: &NodeId, property: &str) -> Option<String> {
        self.nodes[node.0].styles.get(property).cloned()
    }

    fn set_style(&mut self, node: &NodeId, property: &str, value: &str) {
        self.nodes[node.0]
            .styles
            .insert(property.to_string(), value.to_string());
    }

    fn field_value(&self, node: &NodeId) -> String {
        self.nodes[node.0].value.clone()
    }

    fn set_field_value(&mut self, node: &NodeId, value: &str) {
        self.nodes[node.0].value = value.to_string();
    }

    fn set_disabled(&mut self, node: &NodeId, disabled: bool) {
        self.nodes[node.0].disabled = disabled;
    }

    fn is_disabled(&self, node: &NodeId) -> bool {
        self.nodes[node.0].disabled
    }

    fn offset_top(&self, node: &NodeId) -> f64 {
        self.nodes[node.0].layout.top
    }

    fn offset_height(&self, node: &NodeId) -> f64 {
        self.nodes[node.0].layout.height
    }

    fn client_origin(&self, node: &NodeId) -> (f64, f64) {
        let layout = self.nodes[node.0].layout;
        (layout.left, layout.top - self.scroll_y)
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    fn scroll_extent(&self) -> f64 {
        (self.scroll_height - self.viewport.1).max(0.0)
    }

    fn viewport_width(&self) -> f64 {
        self.viewport.0
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    fn scroll_to(&mut self, top: f64, behavior: ScrollBehavior) {
        self.scroll_requests.push((top, behavior));
        self.scroll_y = top.max(0.0);
    }

    fn navigate(&mut self, url: &str) {
        self.navigations.push(url.to_string());
    }
}

fn parse_inline_style(inline: &str) -> BTreeMap<String, String> {
    inline
        .split(';')
        .filter_map(|declaration| {
            let (property, value) = declaration.split_once(':')?;
            let property = property.trim();
            let value = value.trim();
            (!property.is_empty()).then(|| (property.to_string(), value.to_string()))
        })
        .collect()
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
