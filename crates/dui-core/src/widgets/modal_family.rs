//! Declarative modals: `data-dui-toggle="modal"` triggers and `data-dui-dismiss="modal"`
//! buttons.
//!
//! # Design
//! - Each modal root gets one [`TimedModal`] the first time markup touches it; the family
//!   tracks them explicitly so cleanup can release their listeners.
//! - Closing hides immediately and blocks pointer events after the configured delay. The
//!   deferred step checks state and a close generation instead of cancelling a timer, so a
//!   reopen before it fires keeps the modal interactive.
//! - Unresolvable targets are silent no-ops: markup may reference elements not yet present.
//! - Triggers and dismiss buttons share one registry; an element carrying both markers is
//!   bound once, as a trigger.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::config::{DEFAULT_CLOSE_DELAY_MS, ModalConfig, ModalOverrides};
use crate::dom::{self, Dom, DomEvent, EventKind, ListenTarget, ListenerId, NodeKey, Phase};
use crate::error::DuiResult;
use crate::markup::{FamilyKind, Markup, id_target};
use crate::presentation::{self, MODAL_CONTENT_SELECTOR, Visibility, classes};
use crate::scanner::{Bindings, Family, ScanReport};
use crate::widgets::backdrop::Backdrop;

/// Fallback selector for a dismiss button's modal when no tracked modal encloses it.
const MODAL_ROOT_FALLBACK: &str = "[aria-hidden]";

/// A declarative modal root with a timed close.
pub struct TimedModal<D: Dom> {
    dom: Rc<D>,
    markup: Markup,
    root: D::Node,
    config: ModalConfig,
    close_delay_ms: u32,
    state: Cell<Visibility>,
    generation: Cell<u64>,
    backdrop: RefCell<Option<Backdrop<D::Node>>>,
    listeners: RefCell<Vec<ListenerId>>,
    this: Weak<Self>,
}

impl<D: Dom> TimedModal<D> {
    /// Track `root`, deriving the initial state from its pointer-events class and
    /// normalising `aria-hidden` to match.
    #[must_use]
    pub fn new(
        dom: Rc<D>,
        markup: Markup,
        root: D::Node,
        config: ModalConfig,
        close_delay_ms: u32,
    ) -> Rc<Self> {
        let state = if dom.has_class(&root, classes::POINTER_EVENTS_NONE) {
            Visibility::Hidden
        } else {
            Visibility::Visible
        };
        let aria_hidden = if state.is_visible() { "false" } else { "true" };
        if let Err(err) = dom.set_attribute(&root, "aria-hidden", aria_hidden) {
            tracing::warn!(error = %err, "failed to normalise modal aria-hidden");
        }
        Rc::new_cyclic(|this| Self {
            dom,
            markup,
            root,
            config,
            close_delay_ms,
            state: Cell::new(state),
            generation: Cell::new(0),
            backdrop: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
            this: this.clone(),
        })
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> Visibility {
        self.state.get()
    }

    /// Modal root element.
    #[must_use]
    pub fn root(&self) -> &D::Node {
        &self.root
    }

    /// Open, or close when visible.
    ///
    /// # Errors
    ///
    /// Propagates host failures from the chosen transition.
    pub fn toggle(&self) -> DuiResult<()> {
        if self.state.get().is_visible() {
            self.close()
        } else {
            self.open()
        }
    }

    /// Open; also cancels a pending pointer block. No-op when visible.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn open(&self) -> DuiResult<()> {
        if self.state.get().is_visible() {
            return Ok(());
        }
        self.state.set(Visibility::Visible);
        self.bump_generation();
        let dom = self.dom.as_ref();
        presentation::timed_modal_root(Visibility::Visible).apply(dom, &self.root)?;
        if let Some(content) = self.content()? {
            presentation::timed_modal_content(true).apply(dom, &content)?;
        }
        if self.config.backdrop && self.backdrop.borrow().is_none() {
            let backdrop =
                Backdrop::mount(dom, &self.markup, &self.root, &self.config.backdrop_classes)?;
            *self.backdrop.borrow_mut() = Some(backdrop);
        }
        self.attach_dismissal()?;
        tracing::debug!(modal = ?self.root, "modal opened");
        Ok(())
    }

    /// Close; no-op unless visible.
    ///
    /// # Errors
    ///
    /// Propagates host failures; listeners are still released.
    pub fn close(&self) -> DuiResult<()> {
        if !self.state.get().is_visible() {
            return Ok(());
        }
        self.state.set(Visibility::Closing);
        let generation = self.bump_generation();
        self.release_listeners();
        let backdrop = self.backdrop.borrow_mut().take();
        let unmounted = backdrop.map_or(Ok(()), |backdrop| backdrop.unmount(self.dom.as_ref()));

        let dom = self.dom.as_ref();
        presentation::timed_modal_root(Visibility::Closing).apply(dom, &self.root)?;
        if let Some(content) = self.content()? {
            presentation::timed_modal_content(false).apply(dom, &content)?;
        }

        let this = self.this.clone();
        dom.defer(
            self.close_delay_ms,
            Box::new(move || {
                if let Some(modal) = this.upgrade() {
                    modal.finish_close(generation);
                }
            }),
        );
        tracing::debug!(modal = ?self.root, "modal closing");
        unmounted
    }

    /// Release listeners and the backdrop without touching presentation state.
    pub fn teardown(&self) {
        self.release_listeners();
        if let Some(backdrop) = self.backdrop.borrow_mut().take()
            && let Err(err) = backdrop.unmount(self.dom.as_ref())
        {
            tracing::warn!(error = %err, "backdrop removal failed during teardown");
        }
    }

    fn finish_close(&self, generation: u64) {
        if self.state.get() != Visibility::Closing || self.generation.get() != generation {
            tracing::debug!("stale close step skipped");
            return;
        }
        self.state.set(Visibility::Hidden);
        if let Err(err) =
            presentation::timed_modal_root(Visibility::Hidden).apply(self.dom.as_ref(), &self.root)
        {
            tracing::warn!(error = %err, "failed to block pointer events on closed modal");
        }
    }

    fn bump_generation(&self) -> u64 {
        let next = self.generation.get().wrapping_add(1);
        self.generation.set(next);
        next
    }

    fn content(&self) -> DuiResult<Option<D::Node>> {
        self.dom.query_within(&self.root, MODAL_CONTENT_SELECTOR)
    }

    fn attach_dismissal(&self) -> DuiResult<()> {
        let dom = self.dom.as_ref();
        if self.config.close_on_outside_click {
            let this = self.this.clone();
            let id = dom.listen(
                ListenTarget::Node(self.root.clone()),
                EventKind::Click,
                Phase::Bubble,
                Rc::new(move |event: &DomEvent<D::Node>| {
                    let Some(modal) = this.upgrade() else {
                        return;
                    };
                    if modal.is_outside_content(event) {
                        close_from_listener(&modal);
                    }
                }),
            )?;
            self.listeners.borrow_mut().push(id);
        }
        if self.config.keyboard {
            let this = self.this.clone();
            let id = dom.listen(
                ListenTarget::Document,
                EventKind::KeyDown,
                Phase::Bubble,
                Rc::new(move |event: &DomEvent<D::Node>| {
                    if event.key.as_deref() == Some("Escape")
                        && let Some(modal) = this.upgrade()
                    {
                        close_from_listener(&modal);
                    }
                }),
            )?;
            self.listeners.borrow_mut().push(id);
        }
        Ok(())
    }

    fn is_outside_content(&self, event: &DomEvent<D::Node>) -> bool {
        let Some(target) = &event.target else {
            return false;
        };
        match self.content() {
            Ok(Some(content)) => !self.dom.contains(&content, target),
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(error = %err, "modal content lookup failed");
                false
            }
        }
    }

    fn release_listeners(&self) {
        for id in self.listeners.borrow_mut().drain(..) {
            self.dom.unlisten(id);
        }
    }
}

fn close_from_listener<D: Dom>(modal: &TimedModal<D>) {
    if let Err(err) = modal.close() {
        tracing::warn!(error = %err, "modal dismissal failed");
    }
}

/// The declarative modal family.
pub struct ModalFamily<D: Dom> {
    dom: Rc<D>,
    markup: Markup,
    close_delay_ms: u32,
    bindings: Bindings<D::Node>,
    instances: RefCell<HashMap<NodeKey, Rc<TimedModal<D>>>>,
    this: Weak<Self>,
}

impl<D: Dom> ModalFamily<D> {
    /// Family using `markup` and the default close delay.
    #[must_use]
    pub fn new(dom: Rc<D>, markup: Markup) -> Rc<Self> {
        Self::with_close_delay(dom, markup, DEFAULT_CLOSE_DELAY_MS)
    }

    /// Family with an explicit close delay.
    #[must_use]
    pub fn with_close_delay(dom: Rc<D>, markup: Markup, close_delay_ms: u32) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            dom,
            markup,
            close_delay_ms,
            bindings: Bindings::new(FamilyKind::Modal),
            instances: RefCell::new(HashMap::new()),
            this: this.clone(),
        })
    }

    /// Tracked instance for a modal root, if one was created.
    #[must_use]
    pub fn instance(&self, root: &D::Node) -> Option<Rc<TimedModal<D>>> {
        self.instances.borrow().get(&self.dom.key(root)).cloned()
    }

    /// Number of tracked modal instances.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.instances.borrow().len()
    }

    /// Number of wired trigger and dismiss elements.
    #[must_use]
    pub fn bound_count(&self) -> usize {
        self.bindings.len()
    }

    /// Tracked instance for `root`, created from its data attributes on first use.
    pub fn instance_for(&self, root: &D::Node) -> Rc<TimedModal<D>> {
        let key = self.dom.key(root);
        if let Some(existing) = self.instances.borrow().get(&key) {
            return Rc::clone(existing);
        }
        let overrides =
            ModalOverrides::from_attributes(&self.markup, |name| self.dom.attribute(root, name));
        let modal = TimedModal::new(
            Rc::clone(&self.dom),
            self.markup.clone(),
            root.clone(),
            ModalConfig::merged(overrides),
            self.close_delay_ms,
        );
        self.instances.borrow_mut().insert(key, Rc::clone(&modal));
        modal
    }

    /// Toggle the modal a trigger points at. Unresolved targets are no-ops.
    ///
    /// # Errors
    ///
    /// Propagates host failures from the transition.
    pub fn toggle_from(&self, trigger: &D::Node) -> DuiResult<()> {
        let Some(selector) = id_target(self.dom.attribute(trigger, &self.markup.target_attr()))
        else {
            tracing::debug!(trigger = ?trigger, "modal trigger has no usable target");
            return Ok(());
        };
        let Some(root) = self.dom.query(&selector)? else {
            tracing::debug!(selector = %selector, "modal target not found");
            return Ok(());
        };
        self.instance_for(&root).toggle()
    }

    /// Close the modal enclosing a dismiss element. No enclosing modal is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates host failures from the transition.
    pub fn dismiss_from(&self, button: &D::Node) -> DuiResult<()> {
        let tracked = {
            let instances = self.instances.borrow();
            dom::find_ancestor(self.dom.as_ref(), button, |node| {
                instances.get(&self.dom.key(node)).cloned()
            })
        };
        let modal = match tracked {
            Some(modal) => modal,
            None => match self.dom.closest(button, MODAL_ROOT_FALLBACK)? {
                Some(root) => self.instance_for(&root),
                None => {
                    tracing::debug!(button = ?button, "dismiss button is not inside a modal");
                    return Ok(());
                }
            },
        };
        modal.close()
    }
}

impl<D: Dom> Family for ModalFamily<D> {
    fn kind(&self) -> FamilyKind {
        FamilyKind::Modal
    }

    fn scan(&self) -> ScanReport {
        let dom = self.dom.as_ref();
        let mut report = self.bindings.bind_clicks(
            dom,
            &self.markup.toggle_selector(FamilyKind::Modal),
            || {
                let this = self.this.clone();
                Rc::new(move |event: &DomEvent<D::Node>| {
                    let (Some(family), Some(trigger)) = (this.upgrade(), &event.current_target)
                    else {
                        return;
                    };
                    if let Err(err) = family.toggle_from(trigger) {
                        tracing::warn!(error = %err, "modal toggle failed");
                    }
                })
            },
        );
        report += self.bindings.bind_clicks(
            dom,
            &self.markup.dismiss_selector(FamilyKind::Modal),
            || {
                let this = self.this.clone();
                Rc::new(move |event: &DomEvent<D::Node>| {
                    let (Some(family), Some(button)) = (this.upgrade(), &event.current_target)
                    else {
                        return;
                    };
                    if let Err(err) = family.dismiss_from(button) {
                        tracing::warn!(error = %err, "modal dismiss failed");
                    }
                })
            },
        );
        report
    }

    fn cleanup(&self) {
        let dom = self.dom.as_ref();
        self.bindings.release(dom);
        let instances: Vec<_> = self.instances.borrow_mut().drain().map(|(_, modal)| modal).collect();
        for modal in instances {
            modal.teardown();
        }
    }
}
