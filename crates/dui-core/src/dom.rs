//! Host DOM capability consumed by the widgets.
//!
//! # Design
//! - The core never touches `web-sys`; the browser host and the in-memory test host both
//!   implement [`Dom`].
//! - Every method takes `&self`: hosts use interior mutability, mirroring the DOM itself.
//! - Listener and observer registrations return ids; releasing them is always explicit.

use std::fmt;
use std::rc::Rc;

use futures::future::LocalBoxFuture;

use crate::error::DuiResult;

/// Identity key for a node. Two handles to the same node yield the same key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u64);

/// Registered event listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Registered change observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

/// DOM events the toolkit reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Pointer click.
    Click,
    /// Key press.
    KeyDown,
}

impl EventKind {
    /// DOM event type name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::KeyDown => "keydown",
        }
    }
}

/// Listener dispatch phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Capture (document first).
    Capture,
    /// Bubble (target first).
    Bubble,
}

/// Where a listener is attached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListenTarget<N> {
    /// The document itself.
    Document,
    /// A specific node.
    Node(N),
}

/// Event payload handed to listeners.
#[derive(Clone, Debug)]
pub struct DomEvent<N> {
    /// Event type.
    pub kind: EventKind,
    /// Node the event originated on.
    pub target: Option<N>,
    /// Node the listener is attached to (`None` for document listeners).
    pub current_target: Option<N>,
    /// `KeyboardEvent.key` for key events.
    pub key: Option<String>,
}

/// Listener callback.
pub type Handler<N> = Rc<dyn Fn(&DomEvent<N>)>;

/// Host DOM operations.
pub trait Dom: 'static {
    /// Host node handle.
    type Node: Clone + fmt::Debug + 'static;

    /// Identity key for `node`.
    fn key(&self, node: &Self::Node) -> NodeKey;

    /// Document body.
    ///
    /// # Errors
    ///
    /// Fails when the document has no body yet.
    fn body(&self) -> DuiResult<Self::Node>;

    /// First document match for `selector`.
    ///
    /// # Errors
    ///
    /// Fails on selectors the host rejects.
    fn query(&self, selector: &str) -> DuiResult<Option<Self::Node>>;

    /// All document matches for `selector`, in document order.
    ///
    /// # Errors
    ///
    /// Fails on selectors the host rejects.
    fn query_all(&self, selector: &str) -> DuiResult<Vec<Self::Node>>;

    /// First descendant of `scope` matching `selector`.
    ///
    /// # Errors
    ///
    /// Fails on selectors the host rejects.
    fn query_within(&self, scope: &Self::Node, selector: &str) -> DuiResult<Option<Self::Node>>;

    /// Nearest inclusive ancestor of `node` matching `selector`.
    ///
    /// # Errors
    ///
    /// Fails on selectors the host rejects.
    fn closest(&self, node: &Self::Node, selector: &str) -> DuiResult<Option<Self::Node>>;

    /// Parent element, if attached.
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Next element sibling.
    fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

    /// First element child.
    fn first_element_child(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Inclusive containment check.
    fn contains(&self, ancestor: &Self::Node, node: &Self::Node) -> bool;

    /// Attribute value.
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    /// Set an attribute.
    ///
    /// # Errors
    ///
    /// Fails when the host rejects the name or value.
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str) -> DuiResult<()>;

    /// Whether `node` carries `class`.
    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    /// Add classes (already-present classes are kept once).
    ///
    /// # Errors
    ///
    /// Fails when the host rejects a class token.
    fn add_classes(&self, node: &Self::Node, classes: &[&str]) -> DuiResult<()>;

    /// Remove classes.
    ///
    /// # Errors
    ///
    /// Fails when the host rejects a class token.
    fn remove_classes(&self, node: &Self::Node, classes: &[&str]) -> DuiResult<()>;

    /// Set an inline style property.
    ///
    /// # Errors
    ///
    /// Fails when the node has no inline style or the host rejects the value.
    fn set_style(&self, node: &Self::Node, property: &str, value: &str) -> DuiResult<()>;

    /// Natural content height in pixels.
    fn scroll_height(&self, node: &Self::Node) -> i32;

    /// Set the `hidden` property.
    fn set_hidden(&self, node: &Self::Node, hidden: bool);

    /// Create a detached element.
    ///
    /// # Errors
    ///
    /// Fails when the host rejects the tag.
    fn create_element(&self, tag: &str) -> DuiResult<Self::Node>;

    /// Append `child` to `parent`, moving it if already attached.
    ///
    /// # Errors
    ///
    /// Fails when the host rejects the insertion.
    fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> DuiResult<()>;

    /// Insert `child` into `parent` before `reference` (append when `None`).
    ///
    /// # Errors
    ///
    /// Fails when `reference` is not a child of `parent`.
    fn insert_before(
        &self,
        parent: &Self::Node,
        child: &Self::Node,
        reference: Option<&Self::Node>,
    ) -> DuiResult<()>;

    /// Detach `node` from its parent.
    fn remove(&self, node: &Self::Node);

    /// Attach a listener.
    ///
    /// # Errors
    ///
    /// Fails when the host cannot register the listener.
    fn listen(
        &self,
        target: ListenTarget<Self::Node>,
        event: EventKind,
        phase: Phase,
        handler: Handler<Self::Node>,
    ) -> DuiResult<ListenerId>;

    /// Detach a listener; unknown ids are ignored.
    fn unlisten(&self, id: ListenerId);

    /// Run `callback` once after `delay_ms` on the event loop.
    fn defer(&self, delay_ms: u32, callback: Box<dyn FnOnce()>);

    /// Drive `future` to completion on the event loop.
    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>);

    /// Invoke `callback` after each batch of subtree changes under `root`.
    ///
    /// # Errors
    ///
    /// Fails when the host cannot install the observer.
    fn observe_subtree(&self, root: &Self::Node, callback: Rc<dyn Fn()>) -> DuiResult<ObserverId>;

    /// Stop an observer; unknown ids are ignored.
    fn disconnect(&self, id: ObserverId);
}

/// Walk inclusive ancestors of `node`, nearest first, until `visit` returns `Some`.
pub fn find_ancestor<D, T>(dom: &D, node: &D::Node, mut visit: impl FnMut(&D::Node) -> Option<T>) -> Option<T>
where
    D: Dom + ?Sized,
{
    let mut current = Some(node.clone());
    while let Some(candidate) = current {
        if let Some(found) = visit(&candidate) {
            return Some(found);
        }
        current = dom.parent(&candidate);
    }
    None
}
