//! Collapsible sections driven by the trigger's `aria-expanded`.
//!
//! # Design
//! - The trigger's attribute is the only state; nothing is kept per instance.
//! - Expanding writes the content's natural height to `max-height`; collapsing writes `0`.
//! - An optional icon inside the trigger rotates in lockstep.

use std::rc::{Rc, Weak};

use crate::dom::{Dom, DomEvent};
use crate::error::{DuiError, DuiResult};
use crate::markup::{FamilyKind, Markup, id_target};
use crate::presentation::classes;
use crate::scanner::{Bindings, Family, ScanReport};

const ARIA_EXPANDED: &str = "aria-expanded";
const MAX_HEIGHT: &str = "max-height";

/// Whether the trigger currently reports expanded.
#[must_use]
pub fn is_expanded<D: Dom + ?Sized>(dom: &D, trigger: &D::Node) -> bool {
    dom.attribute(trigger, ARIA_EXPANDED).as_deref() == Some("true")
}

/// Write the expanded or collapsed state for a trigger/content pair.
///
/// # Errors
///
/// Propagates host failures.
pub fn set_expanded<D: Dom + ?Sized>(
    dom: &D,
    markup: &Markup,
    trigger: &D::Node,
    content: &D::Node,
    expanded: bool,
) -> DuiResult<()> {
    let height = if expanded {
        format!("{}px", dom.scroll_height(content))
    } else {
        "0".to_string()
    };
    dom.set_style(content, MAX_HEIGHT, &height)?;
    dom.set_attribute(trigger, ARIA_EXPANDED, if expanded { "true" } else { "false" })?;
    if let Some(icon) = dom.query_within(trigger, &markup.icon_selector())? {
        if expanded {
            dom.add_classes(&icon, &[classes::ROTATE_180])?;
        } else {
            dom.remove_classes(&icon, &[classes::ROTATE_180])?;
        }
    }
    Ok(())
}

/// Flip the section a trigger points at. Missing or non-id targets are no-ops.
///
/// # Errors
///
/// Propagates host failures.
pub fn toggle_collapse<D: Dom + ?Sized>(dom: &D, markup: &Markup, trigger: &D::Node) -> DuiResult<()> {
    let Some(selector) = id_target(dom.attribute(trigger, &markup.target_attr())) else {
        tracing::debug!(trigger = ?trigger, "collapse trigger has no usable target");
        return Ok(());
    };
    let Some(content) = dom.query(&selector)? else {
        tracing::debug!(selector = %selector, "collapse target not found");
        return Ok(());
    };
    set_expanded(dom, markup, trigger, &content, !is_expanded(dom, trigger))
}

/// Programmatic collapse over an explicit trigger/content pair.
pub struct Collapse<D: Dom> {
    dom: Rc<D>,
    markup: Markup,
    trigger: D::Node,
    content: D::Node,
}

impl<D: Dom> Collapse<D> {
    /// Wrap a pair with the default markup vocabulary.
    #[must_use]
    pub fn new(dom: Rc<D>, trigger: D::Node, content: D::Node) -> Self {
        Self {
            dom,
            markup: Markup::default(),
            trigger,
            content,
        }
    }

    /// Resolve both selectors, then wrap the pair.
    ///
    /// # Errors
    ///
    /// Returns [`DuiError::Resolution`] naming the selector that did not match.
    pub fn from_selectors(dom: Rc<D>, trigger: &str, content: &str) -> DuiResult<Self> {
        let trigger_node = dom
            .query(trigger)?
            .ok_or_else(|| DuiError::resolution(trigger))?;
        let content_node = dom
            .query(content)?
            .ok_or_else(|| DuiError::resolution(content))?;
        Ok(Self::new(dom, trigger_node, content_node))
    }

    /// Whether the section is expanded.
    #[must_use]
    pub fn is_expanded(&self) -> bool {
        is_expanded(self.dom.as_ref(), &self.trigger)
    }

    /// Expand; no-op when expanded.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn expand(&self) -> DuiResult<()> {
        if self.is_expanded() {
            return Ok(());
        }
        set_expanded(self.dom.as_ref(), &self.markup, &self.trigger, &self.content, true)
    }

    /// Collapse; no-op when collapsed.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn collapse(&self) -> DuiResult<()> {
        if !self.is_expanded() {
            return Ok(());
        }
        set_expanded(self.dom.as_ref(), &self.markup, &self.trigger, &self.content, false)
    }

    /// Flip the section.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn toggle(&self) -> DuiResult<()> {
        let expanded = !self.is_expanded();
        set_expanded(self.dom.as_ref(), &self.markup, &self.trigger, &self.content, expanded)
    }
}

/// Declarative collapse family.
pub struct CollapseFamily<D: Dom> {
    dom: Rc<D>,
    markup: Markup,
    triggers: Bindings<D::Node>,
    this: Weak<Self>,
}

impl<D: Dom> CollapseFamily<D> {
    /// Family using `markup`.
    #[must_use]
    pub fn new(dom: Rc<D>, markup: Markup) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            dom,
            markup,
            triggers: Bindings::new(FamilyKind::Collapse),
            this: this.clone(),
        })
    }

    /// Number of wired triggers.
    #[must_use]
    pub fn bound_count(&self) -> usize {
        self.triggers.len()
    }
}

impl<D: Dom> Family for CollapseFamily<D> {
    fn kind(&self) -> FamilyKind {
        FamilyKind::Collapse
    }

    fn scan(&self) -> ScanReport {
        self.triggers.bind_clicks(
            self.dom.as_ref(),
            &self.markup.toggle_selector(FamilyKind::Collapse),
            || {
                let this = self.this.clone();
                Rc::new(move |event: &DomEvent<D::Node>| {
                    let (Some(family), Some(trigger)) = (this.upgrade(), &event.current_target)
                    else {
                        return;
                    };
                    if let Err(err) = toggle_collapse(family.dom.as_ref(), &family.markup, trigger) {
                        tracing::warn!(error = %err, "collapse toggle failed");
                    }
                })
            },
        )
    }

    fn cleanup(&self) {
        self.triggers.release(self.dom.as_ref());
    }
}
