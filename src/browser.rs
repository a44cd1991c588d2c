use crate::config::{self, RevealConfig, SiteConfig};
use crate::dom::{Document, ScrollBehavior};
use crate::logging::{log_event, LogLevel};
use crate::notify::Severity;
use crate::site::{Environment, Event, Response, Site};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{
    window, Element, EventTarget, HtmlButtonElement, HtmlElement, HtmlInputElement,
    HtmlSelectElement, HtmlTextAreaElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, KeyboardEvent, MouseEvent, ScrollToOptions, Window,
};

pub struct WebDocument {
    window: Window,
    document: web_sys::Document,
}

impl WebDocument {
    fn now(&self) -> f64 {
        self.window
            .performance()
            .map(|performance| performance.now())
            .unwrap_or(0.0)
    }

    fn style_of(node: &Element) -> Option<web_sys::CssStyleDeclaration> {
        node.dyn_ref::<HtmlElement>().map(HtmlElement::style)
    }
}

impl Document for WebDocument {
    type Node = Element;

    fn query_all(&self, selector: &str) -> Vec<Element> {
        let Ok(list) = self.document.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|index| list.item(index))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn query_within(&self, scope: &Element, selector: &str) -> Option<Element> {
        scope.query_selector(selector).ok().flatten()
    }

    fn closest(&self, node: &Element, selector: &str) -> Option<Element> {
        node.closest(selector).ok().flatten()
    }

    fn by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn body(&self) -> Option<Element> {
        self.document.body().map(Into::into)
    }

    fn head(&self) -> Option<Element> {
        self.document.head().map(Into::into)
    }

    fn create_element(&mut self, tag: &str) -> Option<Element> {
        self.document.create_element(tag).ok()
    }

    fn append_child(&mut self, parent: &Element, child: &Element) {
        let _ = parent.append_child(child);
    }

    fn prepend_child(&mut self, parent: &Element, child: &Element) {
        let _ = parent.prepend_with_node_1(child);
    }

    fn remove(&mut self, node: &Element) {
        node.remove();
    }

    fn is_connected(&self, node: &Element) -> bool {
        node.is_connected()
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn add_class(&mut self, node: &Element, class: &str) {
        let _ = node.class_list().add_1(class);
    }

    fn remove_class(&mut self, node: &Element, class: &str) {
        let _ = node.class_list().remove_1(class);
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&mut self, node: &Element, name: &str, value: &str) {
        let _ = node.set_attribute(name, value);
    }

    fn text(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_text(&mut self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn inner_html(&self, node: &Element) -> String {
        node.inner_html()
    }

    fn set_inner_html(&mut self, node: &Element, html: &str) {
        node.set_inner_html(html);
    }

    fn style(&self, node: &Element, property: &str) -> Option<String> {
        Self::style_of(node)
            .and_then(|style| style.get_property_value(property).ok())
            .filter(|value| !value.is_empty())
    }

    fn set_style(&mut self, node: &Element, property: &str, value: &str) {
        if let Some(style) = Self::style_of(node) {
            let _ = style.set_property(property, value);
        }
    }

    fn field_value(&self, node: &Element) -> String {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            area.value()
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.value()
        } else {
            String::new()
        }
    }

    fn set_field_value(&mut self, node: &Element, value: &str) {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value(value);
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.set_value(value);
        }
    }

    fn set_disabled(&mut self, node: &Element, disabled: bool) {
        if let Some(button) = node.dyn_ref::<HtmlButtonElement>() {
            button.set_disabled(disabled);
        } else if disabled {
            let _ = node.set_attribute("disabled", "");
        } else {
            let _ = node.remove_attribute("disabled");
        }
    }

    fn is_disabled(&self, node: &Element) -> bool {
        match node.dyn_ref::<HtmlButtonElement>() {
            Some(button) => button.disabled(),
            None => node.has_attribute("disabled"),
        }
    }

    fn offset_top(&self, node: &Element) -> f64 {
        node.dyn_ref::<HtmlElement>()
            .map(|element| f64::from(element.offset_top()))
            .unwrap_or(0.0)
    }

    fn offset_height(&self, node: &Element) -> f64 {
        node.dyn_ref::<HtmlElement>()
            .map(|element| f64::from(element.offset_height()))
            .unwrap_or(0.0)
    }

    fn client_origin(&self, node: &Element) -> (f64, f64) {
        let rect = node.get_bounding_client_rect();
        (rect.left(), rect.top())
    }

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn scroll_extent(&self) -> f64 {
        self.document
            .document_element()
            .map(|root| f64::from(root.scroll_height() - root.client_height()))
            .unwrap_or(0.0)
    }

    fn viewport_width(&self) -> f64 {
        self.window
            .inner_width()
            .ok()
            .and_then(|width| width.as_f64())
            .unwrap_or(0.0)
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.window
            .match_media("(prefers-reduced-motion: reduce)")
            .ok()
            .flatten()
            .map(|mq| mq.matches())
            .unwrap_or(false)
    }

    fn scroll_to(&mut self, top: f64, behavior: ScrollBehavior) {
        let options = ScrollToOptions::new();
        options.set_top(top);
        options.set_behavior(match behavior {
            ScrollBehavior::Smooth => web_sys::ScrollBehavior::Smooth,
            ScrollBehavior::Instant => web_sys::ScrollBehavior::Instant,
        });
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn navigate(&mut self, url: &str) {
        let _ = self.window.location().set_href(url);
    }
}

struct Runtime {
    site: Site<WebDocument>,
    document: WebDocument,
}

struct Shared {
    config: SiteConfig,
    runtime: RefCell<Runtime>,
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn dispatch(shared: &Shared, event: Event<Element>) -> Response {
    let Ok(mut runtime) = shared.runtime.try_borrow_mut() else {
        log_event(&shared.config, LogLevel::Warn, "dispatch.reentrant", json!({}));
        return Response::default();
    };
    let Runtime { site, document } = &mut *runtime;
    let now = document.now();
    site.handle(document, now, event)
}

fn target_element(event: &web_sys::Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

fn listen<E, F>(target: &EventTarget, kind: &str, shared: &Rc<Shared>, to_event: F)
where
    E: JsCast + 'static,
    F: Fn(&E) -> Option<Event<Element>> + 'static,
{
    let shared = Rc::clone(shared);
    let callback = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
        let Some(site_event) = event.dyn_ref::<E>().and_then(&to_event) else {
            return;
        };
        if dispatch(&shared, site_event).prevent_default {
            event.prevent_default();
        }
    });
    let _ = target.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref());
    callback.forget();
}

fn observe(shared: &Rc<Shared>, config: &RevealConfig, targets: &[Element]) {
    if targets.is_empty() {
        return;
    }

    let on_entries = Rc::clone(shared);
    let callback = Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
        move |entries: js_sys::Array, observer: IntersectionObserver| {
            for entry in entries.iter() {
                let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                    continue;
                };
                if !entry.is_intersecting() {
                    continue;
                }
                let target = entry.target();
                observer.unobserve(&target);
                dispatch(&on_entries, Event::Visible { target });
            }
        },
    );

    let options = IntersectionObserverInit::new();
    options.set_threshold(&JsValue::from_f64(config.threshold));
    options.set_root_margin(&config.root_margin);

    match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options) {
        Ok(observer) => {
            for target in targets {
                observer.observe(target);
            }
            callback.forget();
        }
        Err(_) => {
            log_event(&shared.config, LogLevel::Warn, "observer.unavailable", json!({}));
            for target in targets {
                dispatch(shared, Event::Visible {
                    target: target.clone(),
                });
            }
        }
    }
}

/// `window.portfolioDebug.showNotification(message, type)` for poking at
/// the toast from the console.
fn expose_debug_hook(window: &Window, shared: &Rc<Shared>, features: &[&str]) {
    let shared = Rc::clone(shared);
    let show = Closure::<dyn FnMut(String, Option<String>)>::new(
        move |message: String, kind: Option<String>| {
            let severity = Severity::from_name(kind.as_deref().unwrap_or("info"));
            dispatch(&shared, Event::Notify { message, severity });
        },
    );

    let names: js_sys::Array = features.iter().map(|name| JsValue::from_str(name)).collect();
    let hook = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&hook, &JsValue::from_str("features"), &names);
    let _ = js_sys::Reflect::set(&hook, &JsValue::from_str("showNotification"), show.as_ref());
    let _ = js_sys::Reflect::set(window.as_ref(), &JsValue::from_str("portfolioDebug"), &hook);
    show.forget();
}

fn start_frame_loop(window: Window, shared: Rc<Shared>) {
    let frame: FrameCallback = Rc::new(RefCell::new(None));
    let next = Rc::clone(&frame);
    let scheduler = window.clone();
    *frame.borrow_mut() = Some(Closure::<dyn FnMut(f64)>::new(move |_timestamp: f64| {
        dispatch(&shared, Event::Frame);
        if let Some(callback) = next.borrow().as_ref() {
            let _ = scheduler.request_animation_frame(callback.as_ref().unchecked_ref());
        }
    }));
    if let Some(callback) = frame.borrow().as_ref() {
        let _ = window.request_animation_frame(callback.as_ref().unchecked_ref());
    }
}

fn start(window: Window, document: web_sys::Document) {
    let mut page = WebDocument {
        window: window.clone(),
        document: document.clone(),
    };
    let config = config::load_or_default(&page);
    let mut random = js_sys::Math::random;
    let now = page.now();
    let site = Site::attach(
        &mut page,
        config,
        Environment {
            now,
            year: js_sys::Date::new_0().get_full_year() as i32,
            random: &mut random,
        },
    );

    let observed = site.observed().to_vec();
    let features: Vec<&str> = site
        .features()
        .into_iter()
        .filter(|(_, attached)| *attached)
        .map(|(feature, _)| feature)
        .collect();
    let shared = Rc::new(Shared {
        config: site.config().clone(),
        runtime: RefCell::new(Runtime {
            site,
            document: page,
        }),
    });

    listen::<MouseEvent, _>(&document, "click", &shared, |event| {
        target_element(event).map(|target| Event::Click { target })
    });
    listen::<web_sys::Event, _>(&document, "submit", &shared, |event| {
        target_element(event).map(|form| Event::Submit { form })
    });
    listen::<KeyboardEvent, _>(&document, "keydown", &shared, |event| {
        Some(Event::KeyDown { key: event.key() })
    });
    listen::<MouseEvent, _>(&document, "mousemove", &shared, |event| {
        Some(Event::PointerMove {
            target: target_element(event),
            x: f64::from(event.client_x()),
            y: f64::from(event.client_y()),
        })
    });
    listen::<MouseEvent, _>(&document, "mouseout", &shared, |event| {
        let to = event
            .related_target()
            .and_then(|target| target.dyn_into::<Element>().ok());
        Some(Event::PointerLeave { to })
    });
    listen::<web_sys::Event, _>(&window, "scroll", &shared, |_| Some(Event::Scroll));

    if document.ready_state() == "complete" {
        dispatch(&shared, Event::Load);
    } else {
        listen::<web_sys::Event, _>(&window, "load", &shared, |_| Some(Event::Load));
    }

    expose_debug_hook(&window, &shared, &features);
    observe(&shared, &shared.config.reveal, &observed);
    start_frame_loop(window, shared);
}

pub fn run() {
    let Some(window) = window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };

    if document.ready_state() == "loading" {
        let target = document.clone();
        let callback = Closure::<dyn FnMut()>::new(move || start(window.clone(), document.clone()));
        let _ = target.add_event_listener_with_callback(
            "DOMContentLoaded",
            callback.as_ref().unchecked_ref(),
        );
        callback.forget();
    } else {
        start(window, document);
    }
}
