//! `web-sys` implementation of the core's host DOM.
//!
//! # Design
//! - Node identity comes from a `WeakMap` stamping each element with a numeric key, so
//!   registries never keep removed elements alive.
//! - Listeners are `gloo` `EventListener`s owned by this host and dropped on `unlisten`.
//! - Observers keep their closure next to the `MutationObserver` until disconnected.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use dui_core::dom::{Handler, ListenerId, ObserverId};
use dui_core::{Dom, DomEvent, DuiError, DuiResult, EventKind, ListenTarget, NodeKey, Phase};
use futures::future::LocalBoxFuture;
use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo_timers::callback::Timeout;
use js_sys::{Array, WeakMap};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, Event, EventTarget, HtmlElement, KeyboardEvent, MutationObserver,
    MutationObserverInit,
};

type ObserverCallback = Closure<dyn FnMut(Array, MutationObserver)>;

pub(crate) fn js_error(operation: &'static str, err: &JsValue) -> DuiError {
    let detail = err
        .dyn_ref::<js_sys::Error>()
        .map_or_else(|| format!("{err:?}"), |error| String::from(error.message()));
    DuiError::dom(operation, detail)
}

/// Host DOM backed by the page document.
pub struct WebDom {
    document: Document,
    keys: WeakMap,
    next_key: Cell<u64>,
    next_id: Cell<u64>,
    listeners: RefCell<HashMap<ListenerId, EventListener>>,
    observers: RefCell<HashMap<ObserverId, (MutationObserver, ObserverCallback)>>,
}

impl std::fmt::Debug for WebDom {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("WebDom")
            .field("listeners", &self.listeners.borrow().len())
            .field("observers", &self.observers.borrow().len())
            .finish_non_exhaustive()
    }
}

impl WebDom {
    /// Host over the current window's document.
    ///
    /// # Errors
    ///
    /// Fails outside a window context.
    pub fn new() -> DuiResult<Self> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| DuiError::dom("document", "no window document"))?;
        Ok(Self {
            document,
            keys: WeakMap::new(),
            next_key: Cell::new(1),
            next_id: Cell::new(1),
            listeners: RefCell::new(HashMap::new()),
            observers: RefCell::new(HashMap::new()),
        })
    }

    /// The wrapped document.
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn html(node: &Element, operation: &'static str) -> DuiResult<HtmlElement> {
        node.clone()
            .dyn_into::<HtmlElement>()
            .map_err(|_| DuiError::dom(operation, "not an HTML element"))
    }
}

fn element_of(target: Option<EventTarget>) -> Option<Element> {
    target.and_then(|target| target.dyn_into::<Element>().ok())
}

fn to_dom_event(kind: EventKind, event: &Event) -> DomEvent<Element> {
    DomEvent {
        kind,
        target: element_of(event.target()),
        current_target: element_of(event.current_target()),
        key: event.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key),
    }
}

impl Dom for WebDom {
    type Node = Element;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn key(&self, node: &Element) -> NodeKey {
        if let Some(existing) = self.keys.get(node).as_f64() {
            return NodeKey(existing as u64);
        }
        let key = self.next_key.get();
        self.next_key.set(key + 1);
        self.keys.set(node, &JsValue::from_f64(key as f64));
        NodeKey(key)
    }

    fn body(&self) -> DuiResult<Element> {
        self.document
            .body()
            .map(Element::from)
            .ok_or_else(|| DuiError::dom("body", "document has no body yet"))
    }

    fn query(&self, selector: &str) -> DuiResult<Option<Element>> {
        self.document
            .query_selector(selector)
            .map_err(|err| js_error("querySelector", &err))
    }

    fn query_all(&self, selector: &str) -> DuiResult<Vec<Element>> {
        let list = self
            .document
            .query_selector_all(selector)
            .map_err(|err| js_error("querySelectorAll", &err))?;
        Ok((0..list.length())
            .filter_map(|index| list.item(index))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect())
    }

    fn query_within(&self, scope: &Element, selector: &str) -> DuiResult<Option<Element>> {
        scope
            .query_selector(selector)
            .map_err(|err| js_error("querySelector", &err))
    }

    fn closest(&self, node: &Element, selector: &str) -> DuiResult<Option<Element>> {
        node.closest(selector)
            .map_err(|err| js_error("closest", &err))
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn next_sibling(&self, node: &Element) -> Option<Element> {
        node.next_element_sibling()
    }

    fn first_element_child(&self, node: &Element) -> Option<Element> {
        node.first_element_child()
    }

    fn contains(&self, ancestor: &Element, node: &Element) -> bool {
        ancestor.contains(Some(node))
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) -> DuiResult<()> {
        node.set_attribute(name, value)
            .map_err(|err| js_error("setAttribute", &err))
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn add_classes(&self, node: &Element, classes: &[&str]) -> DuiResult<()> {
        let list = node.class_list();
        for class in classes {
            list.add_1(class)
                .map_err(|err| js_error("classList.add", &err))?;
        }
        Ok(())
    }

    fn remove_classes(&self, node: &Element, classes: &[&str]) -> DuiResult<()> {
        let list = node.class_list();
        for class in classes {
            list.remove_1(class)
                .map_err(|err| js_error("classList.remove", &err))?;
        }
        Ok(())
    }

    fn set_style(&self, node: &Element, property: &str, value: &str) -> DuiResult<()> {
        Self::html(node, "style")?
            .style()
            .set_property(property, value)
            .map_err(|err| js_error("style.setProperty", &err))
    }

    fn scroll_height(&self, node: &Element) -> i32 {
        node.scroll_height()
    }

    fn set_hidden(&self, node: &Element, hidden: bool) {
        if let Some(html) = node.dyn_ref::<HtmlElement>() {
            html.set_hidden(hidden);
        }
    }

    fn create_element(&self, tag: &str) -> DuiResult<Element> {
        self.document
            .create_element(tag)
            .map_err(|err| js_error("createElement", &err))
    }

    fn append_child(&self, parent: &Element, child: &Element) -> DuiResult<()> {
        parent
            .append_child(child)
            .map(drop)
            .map_err(|err| js_error("appendChild", &err))
    }

    fn insert_before(
        &self,
        parent: &Element,
        child: &Element,
        reference: Option<&Element>,
    ) -> DuiResult<()> {
        parent
            .insert_before(child, reference.map(|node| &**node))
            .map(drop)
            .map_err(|err| js_error("insertBefore", &err))
    }

    fn remove(&self, node: &Element) {
        node.remove();
    }

    fn listen(
        &self,
        target: ListenTarget<Element>,
        event: EventKind,
        phase: Phase,
        handler: Handler<Element>,
    ) -> DuiResult<ListenerId> {
        let options = EventListenerOptions {
            phase: match phase {
                Phase::Capture => EventListenerPhase::Capture,
                Phase::Bubble => EventListenerPhase::Bubble,
            },
            passive: true,
        };
        let callback = move |raw: &Event| handler(&to_dom_event(event, raw));
        let listener = match &target {
            ListenTarget::Document => {
                EventListener::new_with_options(&self.document, event.as_str(), options, callback)
            }
            ListenTarget::Node(node) => {
                EventListener::new_with_options(node, event.as_str(), options, callback)
            }
        };
        let id = ListenerId(self.next_id());
        self.listeners.borrow_mut().insert(id, listener);
        Ok(id)
    }

    fn unlisten(&self, id: ListenerId) {
        let removed = self.listeners.borrow_mut().remove(&id);
        drop(removed);
    }

    fn defer(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) {
        Timeout::new(delay_ms, callback).forget();
    }

    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(future);
    }

    fn observe_subtree(&self, root: &Element, callback: Rc<dyn Fn()>) -> DuiResult<ObserverId> {
        let closure: ObserverCallback =
            Closure::new(move |_records: Array, _observer: MutationObserver| callback());
        let observer = MutationObserver::new(closure.as_ref().unchecked_ref())
            .map_err(|err| js_error("MutationObserver", &err))?;
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        observer
            .observe_with_options(root, &init)
            .map_err(|err| js_error("MutationObserver.observe", &err))?;
        let id = ObserverId(self.next_id());
        self.observers.borrow_mut().insert(id, (observer, closure));
        Ok(id)
    }

    fn disconnect(&self, id: ObserverId) {
        let removed = self.observers.borrow_mut().remove(&id);
        if let Some((observer, closure)) = removed {
            observer.disconnect();
            drop(closure);
        }
    }
}
