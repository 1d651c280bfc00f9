//! In-memory [`Dom`] host for native widget tests.
//!
//! # Design
//! - An arena tree: node 0 is `<body>`, handles are plain indices, nothing is ever freed.
//! - Events dispatch document capture, ancestor capture (root first), ancestor bubble
//!   (target first), then document bubble. Listeners removed mid-dispatch do not fire.
//! - Timers, spawned futures, and subtree observers only run when the test drives them
//!   through [`FakeDom::advance`], [`FakeDom::run_tasks`], and [`FakeDom::flush_mutations`].

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::rc::Rc;

use dui_core::dom::{Handler, ListenerId, ObserverId};
use dui_core::{Dom, DomEvent, DuiError, DuiResult, EventKind, ListenTarget, NodeKey, Phase};
use futures::executor::{LocalPool, LocalSpawner};
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;

use crate::selector::{self, Matchable};

/// Handle to a node in a [`FakeDom`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FakeNode(pub usize);

const BODY: FakeNode = FakeNode(0);

/// Observable state of one node, for before/after comparisons.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeSnapshot {
    /// Class list as a set.
    pub classes: BTreeSet<String>,
    /// Non-class attributes.
    pub attributes: BTreeMap<String, String>,
    /// Inline style properties.
    pub style: BTreeMap<String, String>,
    /// Current parent.
    pub parent: Option<FakeNode>,
    /// `hidden` property.
    pub hidden: bool,
}

#[derive(Debug, Default)]
struct NodeData {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    style: BTreeMap<String, String>,
    parent: Option<usize>,
    children: Vec<usize>,
    scroll_height: i32,
    hidden: bool,
}

impl Matchable for NodeData {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn attribute(&self, name: &str) -> Option<String> {
        if name == "class" {
            return (!self.classes.is_empty()).then(|| self.classes.join(" "));
        }
        self.attributes.get(name).cloned()
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|existing| existing == class)
    }
}

struct Listener {
    id: ListenerId,
    target: Option<usize>,
    kind: EventKind,
    phase: Phase,
    handler: Handler<FakeNode>,
}

struct Timer {
    due: u64,
    seq: u64,
    callback: Box<dyn FnOnce()>,
}

struct Observer {
    id: ObserverId,
    root: usize,
    callback: Rc<dyn Fn()>,
}

/// In-memory document.
pub struct FakeDom {
    nodes: RefCell<Vec<NodeData>>,
    listeners: RefCell<Vec<Listener>>,
    observers: RefCell<Vec<Observer>>,
    timers: RefCell<Vec<Timer>>,
    mutated: RefCell<Vec<usize>>,
    refuse_listeners: RefCell<HashSet<usize>>,
    next_id: Cell<u64>,
    now: Cell<u64>,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
}

impl std::fmt::Debug for FakeDom {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("FakeDom")
            .field("nodes", &self.nodes.borrow().len())
            .field("listeners", &self.listeners.borrow().len())
            .field("now", &self.now.get())
            .finish_non_exhaustive()
    }
}

impl Default for FakeDom {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDom {
    /// Empty document holding only `<body>`.
    #[must_use]
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            nodes: RefCell::new(vec![NodeData {
                tag: "body".to_string(),
                ..NodeData::default()
            }]),
            listeners: RefCell::new(Vec::new()),
            observers: RefCell::new(Vec::new()),
            timers: RefCell::new(Vec::new()),
            mutated: RefCell::new(Vec::new()),
            refuse_listeners: RefCell::new(HashSet::new()),
            next_id: Cell::new(1),
            now: Cell::new(0),
            pool: RefCell::new(pool),
            spawner,
        }
    }

    /// Shared handle, the form every widget constructor takes.
    #[must_use]
    pub fn shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    /// The `<body>` node.
    #[must_use]
    pub const fn root(&self) -> FakeNode {
        BODY
    }

    /// Build `<tag>` with `attributes` (a `class` entry fills the class list) under `parent`.
    pub fn add(&self, parent: FakeNode, tag: &str, attributes: &[(&str, &str)]) -> FakeNode {
        let index = {
            let mut nodes = self.nodes.borrow_mut();
            let mut data = NodeData {
                tag: tag.to_string(),
                ..NodeData::default()
            };
            for (name, value) in attributes {
                if *name == "class" {
                    data.classes = split_classes(value);
                } else {
                    data.attributes.insert((*name).to_string(), (*value).to_string());
                }
            }
            data.parent = Some(parent.0);
            nodes.push(data);
            let index = nodes.len() - 1;
            nodes[parent.0].children.push(index);
            index
        };
        self.mutated.borrow_mut().push(parent.0);
        FakeNode(index)
    }

    /// First node whose `id` attribute equals `id`.
    #[must_use]
    pub fn by_id(&self, id: &str) -> Option<FakeNode> {
        self.nodes
            .borrow()
            .iter()
            .position(|node| node.attributes.get("id").map(String::as_str) == Some(id))
            .map(FakeNode)
    }

    /// Current observable state of `node`.
    #[must_use]
    pub fn snapshot(&self, node: FakeNode) -> NodeSnapshot {
        let nodes = self.nodes.borrow();
        let data = &nodes[node.0];
        NodeSnapshot {
            classes: data.classes.iter().cloned().collect(),
            attributes: data.attributes.clone(),
            style: data.style.clone(),
            parent: data.parent.map(FakeNode),
            hidden: data.hidden,
        }
    }

    /// Class list of `node`, in insertion order.
    #[must_use]
    pub fn classes(&self, node: FakeNode) -> Vec<String> {
        self.nodes.borrow()[node.0].classes.clone()
    }

    /// Inline style property of `node`.
    #[must_use]
    pub fn style(&self, node: FakeNode, property: &str) -> Option<String> {
        self.nodes.borrow()[node.0].style.get(property).cloned()
    }

    /// `hidden` property of `node`.
    #[must_use]
    pub fn is_hidden(&self, node: FakeNode) -> bool {
        self.nodes.borrow()[node.0].hidden
    }

    /// Children of `node`, in order.
    #[must_use]
    pub fn children(&self, node: FakeNode) -> Vec<FakeNode> {
        self.nodes.borrow()[node.0]
            .children
            .iter()
            .copied()
            .map(FakeNode)
            .collect()
    }

    /// Set the natural content height reported for `node`.
    pub fn set_scroll_height(&self, node: FakeNode, height: i32) {
        self.nodes.borrow_mut()[node.0].scroll_height = height;
    }

    /// Make every later `listen` on `node` fail.
    pub fn refuse_listeners_on(&self, node: FakeNode) {
        self.refuse_listeners.borrow_mut().insert(node.0);
    }

    /// Total registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Registered listeners for `kind` on `target`, any phase.
    #[must_use]
    pub fn listeners_on(&self, target: &ListenTarget<FakeNode>, kind: EventKind) -> usize {
        let wanted = match target {
            ListenTarget::Document => None,
            ListenTarget::Node(node) => Some(node.0),
        };
        self.listeners
            .borrow()
            .iter()
            .filter(|listener| listener.target == wanted && listener.kind == kind)
            .count()
    }

    /// Active subtree observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    /// Pending deferred callbacks.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Dispatch a click originating on `node`.
    pub fn click(&self, node: FakeNode) {
        self.dispatch(EventKind::Click, node, None);
    }

    /// Dispatch a key press originating on `<body>`.
    pub fn key_down(&self, key: &str) {
        self.dispatch(EventKind::KeyDown, BODY, Some(key.to_string()));
    }

    /// Advance the clock by `ms`, firing due callbacks in due order.
    pub fn advance(&self, ms: u64) {
        let deadline = self.now.get() + ms;
        loop {
            let next = {
                let mut timers = self.timers.borrow_mut();
                let due = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, timer)| timer.due <= deadline)
                    .min_by_key(|(_, timer)| (timer.due, timer.seq))
                    .map(|(index, _)| index);
                due.map(|index| timers.remove(index))
            };
            let Some(timer) = next else { break };
            self.now.set(timer.due);
            (timer.callback)();
        }
        self.now.set(deadline);
    }

    /// Poll spawned futures until none can make progress.
    pub fn run_tasks(&self) {
        self.pool.borrow_mut().run_until_stalled();
    }

    /// Deliver pending structural changes to observers; returns how many fired.
    pub fn flush_mutations(&self) -> usize {
        let mutated = std::mem::take(&mut *self.mutated.borrow_mut());
        if mutated.is_empty() {
            return 0;
        }
        let due: Vec<Rc<dyn Fn()>> = self
            .observers
            .borrow()
            .iter()
            .filter(|observer| {
                mutated
                    .iter()
                    .any(|parent| self.contains_index(observer.root, *parent))
            })
            .map(|observer| Rc::clone(&observer.callback))
            .collect();
        for callback in &due {
            callback();
        }
        due.len()
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn contains_index(&self, ancestor: usize, node: usize) -> bool {
        let nodes = self.nodes.borrow();
        let mut current = Some(node);
        while let Some(index) = current {
            if index == ancestor {
                return true;
            }
            current = nodes[index].parent;
        }
        false
    }

    fn path(&self, node: usize) -> Vec<usize> {
        let nodes = self.nodes.borrow();
        let mut path = Vec::new();
        let mut current = Some(node);
        while let Some(index) = current {
            path.push(index);
            current = nodes[index].parent;
        }
        path
    }

    fn detach(&self, node: usize) -> Option<usize> {
        let mut nodes = self.nodes.borrow_mut();
        let parent = nodes[node].parent.take()?;
        nodes[parent].children.retain(|child| *child != node);
        Some(parent)
    }

    fn dispatch(&self, kind: EventKind, target: FakeNode, key: Option<String>) {
        let path = self.path(target.0);
        let mut steps: Vec<(Option<usize>, Phase)> = vec![(None, Phase::Capture)];
        steps.extend(path.iter().rev().map(|index| (Some(*index), Phase::Capture)));
        steps.extend(path.iter().map(|index| (Some(*index), Phase::Bubble)));
        steps.push((None, Phase::Bubble));

        for (current, phase) in steps {
            let due: Vec<(ListenerId, Handler<FakeNode>)> = self
                .listeners
                .borrow()
                .iter()
                .filter(|listener| {
                    listener.target == current && listener.kind == kind && listener.phase == phase
                })
                .map(|listener| (listener.id, Rc::clone(&listener.handler)))
                .collect();
            let event = DomEvent {
                kind,
                target: Some(target),
                current_target: current.map(FakeNode),
                key: key.clone(),
            };
            for (id, handler) in due {
                let live = self
                    .listeners
                    .borrow()
                    .iter()
                    .any(|listener| listener.id == id);
                if live {
                    handler(&event);
                }
            }
        }
    }

    fn select(&self, selector: &str, scope: Option<usize>) -> DuiResult<Vec<FakeNode>> {
        let list = selector::parse(selector)?;
        let nodes = self.nodes.borrow();
        let mut found = Vec::new();
        let mut stack: Vec<usize> = match scope {
            Some(scope) => nodes[scope].children.iter().rev().copied().collect(),
            None => vec![BODY.0],
        };
        while let Some(index) = stack.pop() {
            if selector::matches(&list, &nodes[index]) {
                found.push(FakeNode(index));
            }
            stack.extend(nodes[index].children.iter().rev().copied());
        }
        Ok(found)
    }
}

fn split_classes(value: &str) -> Vec<String> {
    let mut classes: Vec<String> = Vec::new();
    for class in value.split_whitespace() {
        if !classes.iter().any(|existing| existing == class) {
            classes.push(class.to_string());
        }
    }
    classes
}

fn check_token(token: &str) -> DuiResult<()> {
    if token.is_empty() || token.chars().any(char::is_whitespace) {
        return Err(DuiError::dom("classList", format!("invalid token '{token}'")));
    }
    Ok(())
}

impl Dom for FakeDom {
    type Node = FakeNode;

    fn key(&self, node: &FakeNode) -> NodeKey {
        NodeKey(node.0 as u64)
    }

    fn body(&self) -> DuiResult<FakeNode> {
        Ok(BODY)
    }

    fn query(&self, selector: &str) -> DuiResult<Option<FakeNode>> {
        Ok(self.select(selector, None)?.into_iter().next())
    }

    fn query_all(&self, selector: &str) -> DuiResult<Vec<FakeNode>> {
        self.select(selector, None)
    }

    fn query_within(&self, scope: &FakeNode, selector: &str) -> DuiResult<Option<FakeNode>> {
        Ok(self.select(selector, Some(scope.0))?.into_iter().next())
    }

    fn closest(&self, node: &FakeNode, selector: &str) -> DuiResult<Option<FakeNode>> {
        let list = selector::parse(selector)?;
        let nodes = self.nodes.borrow();
        Ok(self
            .path(node.0)
            .into_iter()
            .find(|index| selector::matches(&list, &nodes[*index]))
            .map(FakeNode))
    }

    fn parent(&self, node: &FakeNode) -> Option<FakeNode> {
        self.nodes.borrow()[node.0].parent.map(FakeNode)
    }

    fn next_sibling(&self, node: &FakeNode) -> Option<FakeNode> {
        let nodes = self.nodes.borrow();
        let parent = nodes[node.0].parent?;
        let siblings = &nodes[parent].children;
        let position = siblings.iter().position(|child| *child == node.0)?;
        siblings.get(position + 1).copied().map(FakeNode)
    }

    fn first_element_child(&self, node: &FakeNode) -> Option<FakeNode> {
        self.nodes.borrow()[node.0]
            .children
            .first()
            .copied()
            .map(FakeNode)
    }

    fn contains(&self, ancestor: &FakeNode, node: &FakeNode) -> bool {
        self.contains_index(ancestor.0, node.0)
    }

    fn attribute(&self, node: &FakeNode, name: &str) -> Option<String> {
        Matchable::attribute(&self.nodes.borrow()[node.0], name)
    }

    fn set_attribute(&self, node: &FakeNode, name: &str, value: &str) -> DuiResult<()> {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(DuiError::dom("setAttribute", format!("invalid name '{name}'")));
        }
        let mut nodes = self.nodes.borrow_mut();
        if name == "class" {
            nodes[node.0].classes = split_classes(value);
        } else {
            nodes[node.0]
                .attributes
                .insert(name.to_string(), value.to_string());
        }
        Ok(())
    }

    fn has_class(&self, node: &FakeNode, class: &str) -> bool {
        Matchable::has_class(&self.nodes.borrow()[node.0], class)
    }

    fn add_classes(&self, node: &FakeNode, classes: &[&str]) -> DuiResult<()> {
        classes.iter().try_for_each(|class| check_token(class))?;
        let mut nodes = self.nodes.borrow_mut();
        let list = &mut nodes[node.0].classes;
        for class in classes {
            if !list.iter().any(|existing| existing == class) {
                list.push((*class).to_string());
            }
        }
        Ok(())
    }

    fn remove_classes(&self, node: &FakeNode, classes: &[&str]) -> DuiResult<()> {
        classes.iter().try_for_each(|class| check_token(class))?;
        self.nodes.borrow_mut()[node.0]
            .classes
            .retain(|existing| !classes.contains(&existing.as_str()));
        Ok(())
    }

    fn set_style(&self, node: &FakeNode, property: &str, value: &str) -> DuiResult<()> {
        self.nodes.borrow_mut()[node.0]
            .style
            .insert(property.to_string(), value.to_string());
        Ok(())
    }

    fn scroll_height(&self, node: &FakeNode) -> i32 {
        self.nodes.borrow()[node.0].scroll_height
    }

    fn set_hidden(&self, node: &FakeNode, hidden: bool) {
        self.nodes.borrow_mut()[node.0].hidden = hidden;
    }

    fn create_element(&self, tag: &str) -> DuiResult<FakeNode> {
        if tag.is_empty() || !tag.chars().all(|ch| ch.is_ascii_alphanumeric()) {
            return Err(DuiError::dom("createElement", format!("invalid tag '{tag}'")));
        }
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(NodeData {
            tag: tag.to_string(),
            ..NodeData::default()
        });
        Ok(FakeNode(nodes.len() - 1))
    }

    fn append_child(&self, parent: &FakeNode, child: &FakeNode) -> DuiResult<()> {
        self.insert_before(parent, child, None)
    }

    fn insert_before(
        &self,
        parent: &FakeNode,
        child: &FakeNode,
        reference: Option<&FakeNode>,
    ) -> DuiResult<()> {
        if self.contains_index(child.0, parent.0) {
            return Err(DuiError::dom("insertBefore", "would create a cycle"));
        }
        if let Some(reference) = reference
            && self.nodes.borrow()[reference.0].parent != Some(parent.0)
        {
            return Err(DuiError::dom("insertBefore", "reference is not a child"));
        }
        if let Some(old) = self.detach(child.0) {
            self.mutated.borrow_mut().push(old);
        }
        {
            let mut nodes = self.nodes.borrow_mut();
            let position = reference
                .and_then(|reference| {
                    nodes[parent.0]
                        .children
                        .iter()
                        .position(|existing| *existing == reference.0)
                })
                .unwrap_or(nodes[parent.0].children.len());
            nodes[parent.0].children.insert(position, child.0);
            nodes[child.0].parent = Some(parent.0);
        }
        self.mutated.borrow_mut().push(parent.0);
        Ok(())
    }

    fn remove(&self, node: &FakeNode) {
        if let Some(parent) = self.detach(node.0) {
            self.mutated.borrow_mut().push(parent);
        }
    }

    fn listen(
        &self,
        target: ListenTarget<FakeNode>,
        event: EventKind,
        phase: Phase,
        handler: Handler<FakeNode>,
    ) -> DuiResult<ListenerId> {
        let target = match target {
            ListenTarget::Document => None,
            ListenTarget::Node(node) => {
                if self.refuse_listeners.borrow().contains(&node.0) {
                    return Err(DuiError::dom("addEventListener", "refused"));
                }
                Some(node.0)
            }
        };
        let id = ListenerId(self.next_id());
        self.listeners.borrow_mut().push(Listener {
            id,
            target,
            kind: event,
            phase,
            handler,
        });
        Ok(id)
    }

    fn unlisten(&self, id: ListenerId) {
        self.listeners
            .borrow_mut()
            .retain(|listener| listener.id != id);
    }

    fn defer(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) {
        let seq = self.next_id();
        self.timers.borrow_mut().push(Timer {
            due: self.now.get() + u64::from(delay_ms),
            seq,
            callback,
        });
    }

    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>) {
        if let Err(err) = self.spawner.spawn_local(future) {
            tracing::error!(error = %err, "fake executor rejected task");
        }
    }

    fn observe_subtree(&self, root: &FakeNode, callback: Rc<dyn Fn()>) -> DuiResult<ObserverId> {
        let id = ObserverId(self.next_id());
        self.observers.borrow_mut().push(Observer {
            id,
            root: root.0,
            callback,
        });
        Ok(id)
    }

    fn disconnect(&self, id: ObserverId) {
        self.observers
            .borrow_mut()
            .retain(|observer| observer.id != id);
    }
}
