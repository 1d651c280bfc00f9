//! Programmatic modal: explicit show/hide/toggle over one element.
//!
//! # Design
//! - `Hidden`/`Visible` only; the programmatic modal has no timed close.
//! - Dismissal listeners live only while visible and are owned by the instance.
//! - Construction writes the presentation of the detected initial state so show-then-hide
//!   restores exactly what construction left.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::config::ModalConfig;
use crate::dom::{Dom, DomEvent, EventKind, ListenTarget, ListenerId, Phase};
use crate::error::{DuiError, DuiResult};
use crate::markup::Markup;
use crate::presentation::{self, Visibility, classes};
use crate::widgets::backdrop::Backdrop;

/// Programmatic modal instance.
pub struct Modal<D: Dom> {
    inner: Rc<ModalInner<D>>,
}

struct ModalInner<D: Dom> {
    dom: Rc<D>,
    markup: Markup,
    element: D::Node,
    config: ModalConfig,
    state: Cell<Visibility>,
    backdrop: RefCell<Option<Backdrop<D::Node>>>,
    listeners: RefCell<Vec<ListenerId>>,
}

impl<D: Dom> Modal<D> {
    /// Wrap `element` with the default markup vocabulary.
    ///
    /// # Errors
    ///
    /// Propagates host failures while normalising the initial presentation.
    pub fn new(dom: Rc<D>, element: D::Node, config: ModalConfig) -> DuiResult<Self> {
        Self::with_markup(dom, Markup::default(), element, config)
    }

    /// Resolve `selector` and wrap the match.
    ///
    /// # Errors
    ///
    /// Returns [`DuiError::Resolution`] when nothing matches.
    pub fn from_selector(dom: Rc<D>, selector: &str, config: ModalConfig) -> DuiResult<Self> {
        let element = dom
            .query(selector)?
            .ok_or_else(|| DuiError::resolution(selector))?;
        Self::new(dom, element, config)
    }

    /// Wrap `element` using an explicit markup vocabulary.
    ///
    /// # Errors
    ///
    /// Propagates host failures while normalising the initial presentation.
    pub fn with_markup(
        dom: Rc<D>,
        markup: Markup,
        element: D::Node,
        config: ModalConfig,
    ) -> DuiResult<Self> {
        let starts_hidden = dom.has_class(&element, classes::HIDDEN)
            || dom.attribute(&element, "aria-hidden").as_deref() == Some("true");
        let state = if starts_hidden {
            Visibility::Hidden
        } else {
            Visibility::Visible
        };
        presentation::modal(state.is_visible()).apply(dom.as_ref(), &element)?;
        Ok(Self {
            inner: Rc::new(ModalInner {
                dom,
                markup,
                element,
                config,
                state: Cell::new(state),
                backdrop: RefCell::new(None),
                listeners: RefCell::new(Vec::new()),
            }),
        })
    }

    /// Show the modal; no-op when already visible.
    ///
    /// # Errors
    ///
    /// Propagates host failures; the state is already `Visible` when one occurs.
    pub fn show(&self) -> DuiResult<()> {
        ModalInner::show(&self.inner)
    }

    /// Hide the modal; no-op when already hidden.
    ///
    /// # Errors
    ///
    /// Propagates host failures; listeners are still released.
    pub fn hide(&self) -> DuiResult<()> {
        self.inner.hide()
    }

    /// Flip visibility.
    ///
    /// # Errors
    ///
    /// Propagates host failures from the chosen transition.
    pub fn toggle(&self) -> DuiResult<()> {
        if self.is_visible() {
            self.hide()
        } else {
            self.show()
        }
    }

    /// Whether the modal is shown.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.inner.state.get().is_visible()
    }

    /// Hide and release everything the instance owns. Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Propagates host failures from the final hide.
    pub fn destroy(&self) -> DuiResult<()> {
        let outcome = self.hide();
        self.inner.release_listeners();
        outcome
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ModalConfig {
        &self.inner.config
    }

    /// Wrapped element.
    #[must_use]
    pub fn element(&self) -> &D::Node {
        &self.inner.element
    }
}

impl<D: Dom> ModalInner<D> {
    fn show(this: &Rc<Self>) -> DuiResult<()> {
        if this.state.get().is_visible() {
            return Ok(());
        }
        this.state.set(Visibility::Visible);
        let dom = this.dom.as_ref();
        presentation::modal(true).apply(dom, &this.element)?;

        if this.config.backdrop && this.backdrop.borrow().is_none() {
            let backdrop = Backdrop::mount(
                dom,
                &this.markup,
                &this.element,
                &this.config.backdrop_classes,
            )?;
            *this.backdrop.borrow_mut() = Some(backdrop);
        }

        let weak = Rc::downgrade(this);
        if this.config.keyboard {
            let id = dom.listen(
                ListenTarget::Document,
                EventKind::KeyDown,
                Phase::Bubble,
                Rc::new({
                    let weak = weak.clone();
                    move |event: &DomEvent<D::Node>| {
                        if event.key.as_deref() == Some("Escape") {
                            hide_from_listener(&weak);
                        }
                    }
                }),
            )?;
            this.listeners.borrow_mut().push(id);
        }
        if this.config.close_on_outside_click {
            let id = dom.listen(
                ListenTarget::Document,
                EventKind::Click,
                Phase::Capture,
                Rc::new(move |event: &DomEvent<D::Node>| {
                    let Some(inner) = weak.upgrade() else {
                        return;
                    };
                    if inner.is_outside_content(event) {
                        hide_from_listener(&weak);
                    }
                }),
            )?;
            this.listeners.borrow_mut().push(id);
        }
        tracing::debug!("modal shown");
        Ok(())
    }

    fn hide(&self) -> DuiResult<()> {
        if !self.state.get().is_visible() {
            return Ok(());
        }
        self.state.set(Visibility::Hidden);
        self.release_listeners();
        let backdrop = self.backdrop.borrow_mut().take();
        let unmounted = backdrop.map_or(Ok(()), |backdrop| backdrop.unmount(self.dom.as_ref()));
        presentation::modal(false).apply(self.dom.as_ref(), &self.element)?;
        tracing::debug!("modal hidden");
        unmounted
    }

    fn release_listeners(&self) {
        for id in self.listeners.borrow_mut().drain(..) {
            self.dom.unlisten(id);
        }
    }

    fn is_outside_content(&self, event: &DomEvent<D::Node>) -> bool {
        let Some(target) = &event.target else {
            return false;
        };
        self.dom
            .first_element_child(&self.element)
            .is_some_and(|content| !self.dom.contains(&content, target))
    }
}

fn hide_from_listener<D: Dom>(weak: &Weak<ModalInner<D>>) {
    if let Some(inner) = weak.upgrade()
        && let Err(err) = inner.hide()
    {
        tracing::warn!(error = %err, "modal dismissal failed");
    }
}
