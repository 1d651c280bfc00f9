//! Attribute vocabulary for declarative wiring.
//!
//! # Design
//! - Every attribute name is derived from one prefix (`dui` by default) so a page can
//!   host two toolkits side by side.
//! - Selectors are built here and nowhere else.

/// Default attribute prefix (`data-dui-*`).
pub const DEFAULT_PREFIX: &str = "dui";

/// Widget families wired by the declarative scanners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FamilyKind {
    /// Modal dialogs.
    Modal,
    /// Anchored dropdown menus.
    Dropdown,
    /// Anchored popovers.
    Popover,
    /// Height-animated collapsible sections.
    Collapse,
    /// Dismissible alerts.
    Alert,
}

impl FamilyKind {
    /// Marker value used in `data-*-toggle` / `data-*-dismiss`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Modal => "modal",
            Self::Dropdown => "dropdown",
            Self::Popover => "popover",
            Self::Collapse => "collapse",
            Self::Alert => "alert",
        }
    }
}

/// Attribute names and selectors for one prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Markup {
    prefix: String,
}

impl Default for Markup {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl Markup {
    /// Build the vocabulary for `data-{prefix}-*` attributes.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Configured prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn attr(&self, name: &str) -> String {
        format!("data-{}-{name}", self.prefix)
    }

    /// Trigger marker attribute.
    #[must_use]
    pub fn toggle_attr(&self) -> String {
        self.attr("toggle")
    }

    /// Target id-selector attribute (`#id`).
    #[must_use]
    pub fn target_attr(&self) -> String {
        self.attr("target")
    }

    /// Dismiss marker attribute.
    #[must_use]
    pub fn dismiss_attr(&self) -> String {
        self.attr("dismiss")
    }

    /// Icon marker attribute for collapse triggers.
    #[must_use]
    pub fn icon_attr(&self) -> String {
        self.attr("icon")
    }

    /// Anchored placement override attribute.
    #[must_use]
    pub fn placement_attr(&self) -> String {
        self.attr("placement")
    }

    /// Anchored offset override attribute (`"skidding,distance"`).
    #[must_use]
    pub fn offset_attr(&self) -> String {
        self.attr("offset")
    }

    /// Modal backdrop override attribute.
    #[must_use]
    pub fn backdrop_attr(&self) -> String {
        self.attr("backdrop")
    }

    /// Modal keyboard-dismissal override attribute.
    #[must_use]
    pub fn keyboard_attr(&self) -> String {
        self.attr("keyboard")
    }

    /// Outside-click dismissal override attribute.
    #[must_use]
    pub fn outside_click_attr(&self) -> String {
        self.attr("outside-click")
    }

    /// Attribute tagging toolkit-created layers (backdrops).
    #[must_use]
    pub fn layer_attr(&self) -> String {
        self.attr("layer")
    }

    /// Selector for trigger elements of a family.
    #[must_use]
    pub fn toggle_selector(&self, family: FamilyKind) -> String {
        format!("[{}='{}']", self.toggle_attr(), family.as_str())
    }

    /// Selector for dismiss elements of a family.
    #[must_use]
    pub fn dismiss_selector(&self, family: FamilyKind) -> String {
        format!("[{}='{}']", self.dismiss_attr(), family.as_str())
    }

    /// Selector for icon sub-elements.
    #[must_use]
    pub fn icon_selector(&self) -> String {
        format!("[{}]", self.icon_attr())
    }

    /// Selector matching live backdrop layers.
    #[must_use]
    pub fn backdrop_selector(&self) -> String {
        format!("[{}='backdrop']", self.layer_attr())
    }
}

/// Accept only `#id` targets; anything else is treated as partially-authored markup.
#[must_use]
pub fn id_target(value: Option<String>) -> Option<String> {
    value.filter(|target| target.len() > 1 && target.starts_with('#'))
}
