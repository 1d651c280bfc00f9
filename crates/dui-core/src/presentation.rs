//! Pure mapping from widget state to presentation classes and aria values.
//!
//! # Design
//! - State lives in explicit enums on each instance; the DOM only reflects it.
//! - The mapping is data so it can be asserted without a live DOM.

use crate::dom::Dom;
use crate::error::DuiResult;

use self::classes::{
    BLOCK, HIDDEN, OPACITY_0, OPACITY_100, POINTER_EVENTS_NONE, SCALE_95, SCALE_100,
};

/// Utility class vocabulary.
pub mod classes {
    /// Removes the element from layout.
    pub const HIDDEN: &str = "hidden";
    /// Forces block layout.
    pub const BLOCK: &str = "block";
    /// Fully transparent.
    pub const OPACITY_0: &str = "opacity-0";
    /// Fully opaque.
    pub const OPACITY_100: &str = "opacity-100";
    /// Ignores pointer input.
    pub const POINTER_EVENTS_NONE: &str = "pointer-events-none";
    /// Shrunk content (closed).
    pub const SCALE_95: &str = "scale-95";
    /// Full-size content (open).
    pub const SCALE_100: &str = "scale-100";
    /// Flipped collapse icon.
    pub const ROTATE_180: &str = "rotate-180";
}

/// Selector for a declarative modal's content node in either scale state.
pub const MODAL_CONTENT_SELECTOR: &str = ".scale-100, .scale-95";

/// Widget visibility.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Visibility {
    /// Not shown (initial).
    #[default]
    Hidden,
    /// Shown.
    Visible,
    /// Presentation already hidden; pointer blocking still pending.
    Closing,
}

impl Visibility {
    /// Whether the widget currently counts as open.
    #[must_use]
    pub const fn is_visible(self) -> bool {
        matches!(self, Self::Visible)
    }
}

/// Class and aria changes describing one state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Presentation {
    /// Classes to add.
    pub add: &'static [&'static str],
    /// Classes to remove.
    pub remove: &'static [&'static str],
    /// `aria-hidden` value, when the state sets one.
    pub aria_hidden: Option<bool>,
}

impl Presentation {
    /// Write this presentation onto `node`.
    ///
    /// # Errors
    ///
    /// Propagates host DOM failures.
    pub fn apply<D: Dom + ?Sized>(&self, dom: &D, node: &D::Node) -> DuiResult<()> {
        dom.remove_classes(node, self.remove)?;
        dom.add_classes(node, self.add)?;
        if let Some(hidden) = self.aria_hidden {
            dom.set_attribute(node, "aria-hidden", if hidden { "true" } else { "false" })?;
        }
        Ok(())
    }
}

/// Programmatic modal element.
#[must_use]
pub const fn modal(visible: bool) -> Presentation {
    if visible {
        Presentation {
            add: &[OPACITY_100, BLOCK],
            remove: &[HIDDEN, OPACITY_0, POINTER_EVENTS_NONE],
            aria_hidden: Some(false),
        }
    } else {
        Presentation {
            add: &[HIDDEN, OPACITY_0, POINTER_EVENTS_NONE],
            remove: &[OPACITY_100, BLOCK],
            aria_hidden: Some(true),
        }
    }
}

/// Declarative modal root.
#[must_use]
pub const fn timed_modal_root(state: Visibility) -> Presentation {
    match state {
        Visibility::Visible => Presentation {
            add: &[OPACITY_100],
            remove: &[OPACITY_0, POINTER_EVENTS_NONE],
            aria_hidden: Some(false),
        },
        Visibility::Closing => Presentation {
            add: &[OPACITY_0],
            remove: &[OPACITY_100],
            aria_hidden: Some(true),
        },
        Visibility::Hidden => Presentation {
            add: &[OPACITY_0, POINTER_EVENTS_NONE],
            remove: &[OPACITY_100],
            aria_hidden: Some(true),
        },
    }
}

/// Declarative modal content node.
#[must_use]
pub const fn timed_modal_content(visible: bool) -> Presentation {
    if visible {
        Presentation {
            add: &[SCALE_100],
            remove: &[SCALE_95],
            aria_hidden: None,
        }
    } else {
        Presentation {
            add: &[SCALE_95],
            remove: &[SCALE_100],
            aria_hidden: None,
        }
    }
}

/// Anchored content element; the `hidden` property is set alongside.
#[must_use]
pub const fn anchored(visible: bool) -> Presentation {
    if visible {
        Presentation {
            add: &[],
            remove: &[HIDDEN],
            aria_hidden: None,
        }
    } else {
        Presentation {
            add: &[HIDDEN],
            remove: &[],
            aria_hidden: None,
        }
    }
}

/// Alert element.
#[must_use]
pub const fn alert(visible: bool) -> Presentation {
    if visible {
        Presentation {
            add: &[],
            remove: &[HIDDEN],
            aria_hidden: Some(false),
        }
    } else {
        Presentation {
            add: &[HIDDEN],
            remove: &[],
            aria_hidden: Some(true),
        }
    }
}
