//! Dismissible alerts.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use crate::dom::{Dom, DomEvent};
use crate::error::{DuiError, DuiResult};
use crate::markup::{FamilyKind, Markup};
use crate::presentation::{self, classes};
use crate::scanner::{Bindings, Family, ScanReport};

/// Selector identifying an alert container.
pub const ALERT_SELECTOR: &str = "[role='alert']";

/// Programmatic alert over one element.
pub struct Alert<D: Dom> {
    dom: Rc<D>,
    element: D::Node,
    visible: Cell<bool>,
}

impl<D: Dom> Alert<D> {
    /// Wrap `element`; visibility is read from its `hidden` class.
    #[must_use]
    pub fn new(dom: Rc<D>, element: D::Node) -> Self {
        let visible = !dom.has_class(&element, classes::HIDDEN);
        Self {
            dom,
            element,
            visible: Cell::new(visible),
        }
    }

    /// Resolve `selector` and wrap the match.
    ///
    /// # Errors
    ///
    /// Returns [`DuiError::Resolution`] when nothing matches.
    pub fn from_selector(dom: Rc<D>, selector: &str) -> DuiResult<Self> {
        let element = dom
            .query(selector)?
            .ok_or_else(|| DuiError::resolution(selector))?;
        Ok(Self::new(dom, element))
    }

    /// Show; no-op when visible.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn show(&self) -> DuiResult<()> {
        if self.visible.get() {
            return Ok(());
        }
        presentation::alert(true).apply(self.dom.as_ref(), &self.element)?;
        self.visible.set(true);
        Ok(())
    }

    /// Hide; no-op when hidden.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn hide(&self) -> DuiResult<()> {
        if !self.visible.get() {
            return Ok(());
        }
        presentation::alert(false).apply(self.dom.as_ref(), &self.element)?;
        self.visible.set(false);
        Ok(())
    }

    /// Flip visibility.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn toggle(&self) -> DuiResult<()> {
        if self.visible.get() {
            self.hide()
        } else {
            self.show()
        }
    }

    /// Whether the alert is shown.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }
}

/// Hide the alert enclosing a dismiss button. No enclosing alert is a no-op.
///
/// # Errors
///
/// Propagates host failures.
pub fn dismiss_alert<D: Dom + ?Sized>(dom: &D, button: &D::Node) -> DuiResult<()> {
    match dom.closest(button, ALERT_SELECTOR)? {
        Some(alert) => presentation::alert(false).apply(dom, &alert),
        None => {
            tracing::debug!(button = ?button, "alert dismiss outside an alert");
            Ok(())
        }
    }
}

/// Declarative alert family (`data-dui-dismiss="alert"`).
pub struct AlertFamily<D: Dom> {
    dom: Rc<D>,
    markup: Markup,
    dismissers: Bindings<D::Node>,
    this: Weak<Self>,
}

impl<D: Dom> AlertFamily<D> {
    /// Family using `markup`.
    #[must_use]
    pub fn new(dom: Rc<D>, markup: Markup) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            dom,
            markup,
            dismissers: Bindings::new(FamilyKind::Alert),
            this: this.clone(),
        })
    }

    /// Number of wired dismiss buttons.
    #[must_use]
    pub fn bound_count(&self) -> usize {
        self.dismissers.len()
    }
}

impl<D: Dom> Family for AlertFamily<D> {
    fn kind(&self) -> FamilyKind {
        FamilyKind::Alert
    }

    fn scan(&self) -> ScanReport {
        self.dismissers.bind_clicks(
            self.dom.as_ref(),
            &self.markup.dismiss_selector(FamilyKind::Alert),
            || {
                let this = self.this.clone();
                Rc::new(move |event: &DomEvent<D::Node>| {
                    let (Some(family), Some(button)) = (this.upgrade(), &event.current_target)
                    else {
                        return;
                    };
                    if let Err(err) = dismiss_alert(family.dom.as_ref(), button) {
                        tracing::warn!(error = %err, "alert dismiss failed");
                    }
                })
            },
        )
    }

    fn cleanup(&self) {
        self.dismissers.release(self.dom.as_ref());
    }
}
