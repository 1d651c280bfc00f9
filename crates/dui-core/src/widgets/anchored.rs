//! Anchored widgets: dropdowns and popovers positioned by the external engine.
//!
//! # Design
//! - Construction is synchronous (element resolution, outside-click listener); positioning
//!   is attached later once the engine has loaded.
//! - `open`/`close` before positioning is ready still work; they just skip the engine.
//! - `destroy` releases the handle and the listener once; later calls are no-ops.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use futures::FutureExt;

use crate::config::{AnchoredConfig, AnchoredOverrides};
use crate::dom::{Dom, DomEvent, EventKind, ListenTarget, ListenerId, NodeKey, Phase};
use crate::error::{DuiError, DuiResult};
use crate::markup::{FamilyKind, Markup, id_target};
use crate::positioning::{PositioningBridge, PositioningHandle, PositioningOptions};
use crate::presentation;
use crate::scanner::{Bindings, Family, ScanReport};

/// Which anchored family a widget belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnchoredKind {
    /// Menu under a button.
    Dropdown,
    /// Floating panel, above by default.
    Popover,
}

impl AnchoredKind {
    /// Defaults for this kind.
    #[must_use]
    pub const fn defaults(self) -> AnchoredConfig {
        match self {
            Self::Dropdown => AnchoredConfig::dropdown(),
            Self::Popover => AnchoredConfig::popover(),
        }
    }

    /// Markup family.
    #[must_use]
    pub const fn family(self) -> FamilyKind {
        match self {
            Self::Dropdown => FamilyKind::Dropdown,
            Self::Popover => FamilyKind::Popover,
        }
    }
}

/// A dropdown or popover instance.
pub struct AnchoredWidget<D: Dom> {
    inner: Rc<AnchoredInner<D>>,
}

impl<D: Dom> Clone for AnchoredWidget<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

struct AnchoredInner<D: Dom> {
    dom: Rc<D>,
    bridge: Rc<PositioningBridge<D::Node>>,
    kind: AnchoredKind,
    reference: D::Node,
    content: D::Node,
    config: AnchoredConfig,
    open: Cell<bool>,
    destroyed: Cell<bool>,
    handle: RefCell<Option<PositioningHandle>>,
    outside_click: Cell<Option<ListenerId>>,
}

impl<D: Dom> AnchoredWidget<D> {
    /// Wrap a reference/content pair. The content starts closed.
    ///
    /// # Errors
    ///
    /// Propagates host failures while hiding the content or installing the listener.
    pub fn new(
        dom: Rc<D>,
        bridge: Rc<PositioningBridge<D::Node>>,
        kind: AnchoredKind,
        reference: D::Node,
        content: D::Node,
        config: AnchoredConfig,
    ) -> DuiResult<Self> {
        presentation::anchored(false).apply(dom.as_ref(), &content)?;
        dom.set_hidden(&content, true);
        let inner = Rc::new(AnchoredInner {
            dom,
            bridge,
            kind,
            reference,
            content,
            config,
            open: Cell::new(false),
            destroyed: Cell::new(false),
            handle: RefCell::new(None),
            outside_click: Cell::new(None),
        });
        if inner.config.close_on_outside_click {
            let weak = Rc::downgrade(&inner);
            let id = inner.dom.listen(
                ListenTarget::Document,
                EventKind::Click,
                Phase::Bubble,
                Rc::new(move |event: &DomEvent<D::Node>| close_if_outside(&weak, event)),
            )?;
            inner.outside_click.set(Some(id));
        }
        Ok(Self { inner })
    }

    /// Resolve both selectors, then wrap the pair.
    ///
    /// # Errors
    ///
    /// Returns [`DuiError::Resolution`] naming the selector that did not match.
    pub fn from_selectors(
        dom: Rc<D>,
        bridge: Rc<PositioningBridge<D::Node>>,
        kind: AnchoredKind,
        reference: &str,
        content: &str,
        config: AnchoredConfig,
    ) -> DuiResult<Self> {
        let reference_node = dom
            .query(reference)?
            .ok_or_else(|| DuiError::resolution(reference))?;
        let content_node = dom
            .query(content)?
            .ok_or_else(|| DuiError::resolution(content))?;
        Self::new(dom, bridge, kind, reference_node, content_node, config)
    }

    /// Wait for the engine, then create the positioning handle.
    ///
    /// # Errors
    ///
    /// Returns the shared load failure or the engine's creation error. The widget keeps
    /// working without positioning either way.
    pub async fn attach_positioning(&self) -> DuiResult<()> {
        let load = self.inner.bridge.ensure_loaded();
        load.await?;
        let inner = &self.inner;
        if inner.destroyed.get() || inner.handle.borrow().is_some() {
            return Ok(());
        }
        let options = PositioningOptions::from(&inner.config);
        let handle = inner
            .bridge
            .create(&inner.reference, &inner.content, &options)?;
        if inner.open.get() {
            inner.bridge.update(&handle);
        }
        *inner.handle.borrow_mut() = Some(handle);
        tracing::debug!(kind = ?inner.kind, "positioning attached");
        Ok(())
    }

    /// Attach positioning on the host event loop, logging failures.
    pub fn spawn_positioning(&self) {
        let widget = self.clone();
        self.inner.dom.spawn_local(
            async move {
                if let Err(err) = widget.attach_positioning().await {
                    tracing::warn!(kind = ?widget.inner.kind, error = %err, "positioning unavailable");
                }
            }
            .boxed_local(),
        );
    }

    /// Show the content; no-op when open.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn open(&self) -> DuiResult<()> {
        self.inner.open()
    }

    /// Hide the content; no-op when closed.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn close(&self) -> DuiResult<()> {
        self.inner.close()
    }

    /// Flip visibility.
    ///
    /// # Errors
    ///
    /// Propagates host failures from the chosen transition.
    pub fn toggle(&self) -> DuiResult<()> {
        if self.is_open() {
            self.close()
        } else {
            self.open()
        }
    }

    /// Whether the content is shown.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.open.get()
    }

    /// Whether a positioning handle is live.
    #[must_use]
    pub fn is_positioned(&self) -> bool {
        self.inner.handle.borrow().is_some()
    }

    /// Release the positioning handle and outside-click listener. Safe to repeat.
    pub fn destroy(&self) {
        let inner = &self.inner;
        inner.destroyed.set(true);
        if let Some(handle) = inner.handle.borrow_mut().take() {
            inner.bridge.destroy(handle);
        }
        if let Some(id) = inner.outside_click.take() {
            inner.dom.unlisten(id);
        }
    }

    /// Widget kind.
    #[must_use]
    pub fn kind(&self) -> AnchoredKind {
        self.inner.kind
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &AnchoredConfig {
        &self.inner.config
    }
}

impl<D: Dom> AnchoredInner<D> {
    fn open(&self) -> DuiResult<()> {
        if self.open.get() {
            return Ok(());
        }
        self.dom.set_hidden(&self.content, false);
        presentation::anchored(true).apply(self.dom.as_ref(), &self.content)?;
        if let Some(handle) = self.handle.borrow().as_ref() {
            self.bridge.update(handle);
        }
        self.open.set(true);
        Ok(())
    }

    fn close(&self) -> DuiResult<()> {
        if !self.open.get() {
            return Ok(());
        }
        self.dom.set_hidden(&self.content, true);
        presentation::anchored(false).apply(self.dom.as_ref(), &self.content)?;
        self.open.set(false);
        Ok(())
    }
}

fn close_if_outside<D: Dom>(weak: &Weak<AnchoredInner<D>>, event: &DomEvent<D::Node>) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    let Some(target) = &event.target else {
        return;
    };
    if !inner.open.get()
        || inner.dom.contains(&inner.content, target)
        || inner.dom.contains(&inner.reference, target)
    {
        return;
    }
    if let Err(err) = inner.close() {
        tracing::warn!(kind = ?inner.kind, error = %err, "outside-click close failed");
    }
}

/// Declarative dropdown or popover family.
pub struct AnchoredFamily<D: Dom> {
    dom: Rc<D>,
    bridge: Rc<PositioningBridge<D::Node>>,
    markup: Markup,
    kind: AnchoredKind,
    triggers: Bindings<D::Node>,
    instances: RefCell<HashMap<NodeKey, AnchoredWidget<D>>>,
    this: Weak<Self>,
}

impl<D: Dom> AnchoredFamily<D> {
    /// Family for `kind`.
    #[must_use]
    pub fn new(
        dom: Rc<D>,
        bridge: Rc<PositioningBridge<D::Node>>,
        markup: Markup,
        kind: AnchoredKind,
    ) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            dom,
            bridge,
            markup,
            kind,
            triggers: Bindings::new(kind.family()),
            instances: RefCell::new(HashMap::new()),
            this: this.clone(),
        })
    }

    /// Tracked instance for a trigger, if created.
    #[must_use]
    pub fn instance(&self, trigger: &D::Node) -> Option<AnchoredWidget<D>> {
        self.instances.borrow().get(&self.dom.key(trigger)).cloned()
    }

    /// Number of tracked instances.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.instances.borrow().len()
    }

    /// Number of wired triggers.
    #[must_use]
    pub fn bound_count(&self) -> usize {
        self.triggers.len()
    }

    /// Toggle the widget a trigger controls, creating it on first use.
    ///
    /// # Errors
    ///
    /// Propagates host failures from creation or the transition.
    pub fn toggle_from(&self, trigger: &D::Node) -> DuiResult<()> {
        match self.instance_for(trigger)? {
            Some(widget) => widget.toggle(),
            None => Ok(()),
        }
    }

    fn instance_for(&self, trigger: &D::Node) -> DuiResult<Option<AnchoredWidget<D>>> {
        if let Some(existing) = self.instance(trigger) {
            return Ok(Some(existing));
        }
        let Some(selector) = id_target(self.dom.attribute(trigger, &self.markup.target_attr()))
        else {
            tracing::debug!(kind = ?self.kind, trigger = ?trigger, "anchored trigger has no usable target");
            return Ok(None);
        };
        let Some(content) = self.dom.query(&selector)? else {
            tracing::debug!(kind = ?self.kind, selector = %selector, "anchored target not found");
            return Ok(None);
        };
        let overrides =
            AnchoredOverrides::from_attributes(&self.markup, |name| self.dom.attribute(trigger, name));
        let widget = AnchoredWidget::new(
            Rc::clone(&self.dom),
            Rc::clone(&self.bridge),
            self.kind,
            trigger.clone(),
            content,
            self.kind.defaults().merged(overrides),
        )?;
        widget.spawn_positioning();
        self.instances
            .borrow_mut()
            .insert(self.dom.key(trigger), widget.clone());
        Ok(Some(widget))
    }
}

impl<D: Dom> Family for AnchoredFamily<D> {
    fn kind(&self) -> FamilyKind {
        self.kind.family()
    }

    fn scan(&self) -> ScanReport {
        self.triggers.bind_clicks(
            self.dom.as_ref(),
            &self.markup.toggle_selector(self.kind.family()),
            || {
                let this = self.this.clone();
                Rc::new(move |event: &DomEvent<D::Node>| {
                    let (Some(family), Some(trigger)) = (this.upgrade(), &event.current_target)
                    else {
                        return;
                    };
                    if let Err(err) = family.toggle_from(trigger) {
                        tracing::warn!(kind = ?family.kind, error = %err, "anchored toggle failed");
                    }
                })
            },
        )
    }

    fn cleanup(&self) {
        self.triggers.release(self.dom.as_ref());
        let instances: Vec<_> = self
            .instances
            .borrow_mut()
            .drain()
            .map(|(_, widget)| widget)
            .collect();
        for widget in instances {
            widget.destroy();
        }
    }
}
