//! Toolkit and per-widget configuration.
//!
//! # Design
//! - Widget configs are immutable after construction: defaults merged with caller overrides.
//! - Overrides arrive either as JSON (programmatic API) or as data attributes (declarative
//!   markup); both go through the same all-`Option` override structs.
//! - Unparseable attribute values are logged and ignored so half-authored markup still works.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DuiError, DuiResult};
use crate::markup::{DEFAULT_PREFIX, Markup};

/// Delay before a closing declarative modal blocks pointer events.
pub const DEFAULT_CLOSE_DELAY_MS: u32 = 300;
/// Upper bound accepted for the close delay.
pub const MAX_CLOSE_DELAY_MS: u32 = 10_000;
/// Default script used to load the positioning engine.
pub const DEFAULT_ENGINE_SCRIPT_URL: &str = "https://unpkg.com/@popperjs/core@2/dist/umd/popper.min.js";
/// Global the engine script installs on `window`.
pub const DEFAULT_ENGINE_GLOBAL: &str = "Popper";

/// Output format for the log subscriber.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Structured JSON lines.
    Json,
    /// Human-readable multi-line output.
    #[default]
    Pretty,
}

/// Library-wide settings applied at bootstrap.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolkitConfig {
    /// Prefix for every `data-*` attribute the scanners read.
    pub attribute_prefix: String,
    /// Delay before a closing declarative modal blocks pointer events.
    pub close_delay_ms: u32,
    /// Script URL injected to load the positioning engine.
    pub engine_script_url: String,
    /// Global object the engine script exposes.
    pub engine_global: String,
    /// Log filter directive.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            attribute_prefix: DEFAULT_PREFIX.to_string(),
            close_delay_ms: DEFAULT_CLOSE_DELAY_MS,
            engine_script_url: DEFAULT_ENGINE_SCRIPT_URL.to_string(),
            engine_global: DEFAULT_ENGINE_GLOBAL.to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
        }
    }
}

impl ToolkitConfig {
    /// Parse and validate a JSON document; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`DuiError::InvalidConfig`] when the document is malformed or a field
    /// fails validation.
    pub fn from_json(raw: &str) -> DuiResult<Self> {
        let config: Self = serde_json::from_str(raw).map_err(|err| DuiError::InvalidConfig {
            field: "toolkit",
            message: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check field invariants.
    ///
    /// # Errors
    ///
    /// Returns [`DuiError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> DuiResult<()> {
        let prefix_ok = !self.attribute_prefix.is_empty()
            && self
                .attribute_prefix
                .chars()
                .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-');
        if !prefix_ok {
            return Err(DuiError::InvalidConfig {
                field: "attributePrefix",
                message: "must be non-empty lowercase ascii, digits, or '-'".to_string(),
            });
        }
        if self.close_delay_ms > MAX_CLOSE_DELAY_MS {
            return Err(DuiError::InvalidConfig {
                field: "closeDelayMs",
                message: format!("must be at most {MAX_CLOSE_DELAY_MS}"),
            });
        }
        if self.engine_script_url.trim().is_empty() {
            return Err(DuiError::InvalidConfig {
                field: "engineScriptUrl",
                message: "must not be empty".to_string(),
            });
        }
        if self.engine_global.trim().is_empty() {
            return Err(DuiError::InvalidConfig {
                field: "engineGlobal",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Attribute vocabulary for the configured prefix.
    #[must_use]
    pub fn markup(&self) -> Markup {
        Markup::new(self.attribute_prefix.clone())
    }
}

/// Modal behaviour options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModalConfig {
    /// Mount a backdrop while visible.
    pub backdrop: bool,
    /// Close on `Escape`.
    pub keyboard: bool,
    /// Close when a click lands outside the modal content.
    pub close_on_outside_click: bool,
    /// Classes applied to the backdrop element.
    pub backdrop_classes: Vec<String>,
}

impl Default for ModalConfig {
    fn default() -> Self {
        Self {
            backdrop: true,
            keyboard: true,
            close_on_outside_click: true,
            backdrop_classes: ["fixed", "inset-0", "bg-black", "bg-opacity-50", "z-10"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

impl ModalConfig {
    /// Defaults merged with the provided overrides.
    #[must_use]
    pub fn merged(overrides: ModalOverrides) -> Self {
        let defaults = Self::default();
        Self {
            backdrop: overrides.backdrop.unwrap_or(defaults.backdrop),
            keyboard: overrides.keyboard.unwrap_or(defaults.keyboard),
            close_on_outside_click: overrides
                .close_on_outside_click
                .unwrap_or(defaults.close_on_outside_click),
            backdrop_classes: overrides
                .backdrop_classes
                .unwrap_or(defaults.backdrop_classes),
        }
    }

    /// Merge a JSON override document onto the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`DuiError::InvalidConfig`] when the document is malformed.
    pub fn from_json(raw: &str) -> DuiResult<Self> {
        let overrides: ModalOverrides =
            serde_json::from_str(raw).map_err(|err| DuiError::InvalidConfig {
                field: "modal",
                message: err.to_string(),
            })?;
        Ok(Self::merged(overrides))
    }
}

/// Caller-supplied modal overrides.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalOverrides {
    /// Backdrop override.
    pub backdrop: Option<bool>,
    /// Keyboard dismissal override.
    pub keyboard: Option<bool>,
    /// Outside-click dismissal override.
    pub close_on_outside_click: Option<bool>,
    /// Backdrop class list override.
    pub backdrop_classes: Option<Vec<String>>,
}

impl ModalOverrides {
    /// Read overrides from `data-*` attributes via the supplied lookup.
    pub fn from_attributes(markup: &Markup, lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            backdrop: bool_attr(&markup.backdrop_attr(), &lookup),
            keyboard: bool_attr(&markup.keyboard_attr(), &lookup),
            close_on_outside_click: bool_attr(&markup.outside_click_attr(), &lookup),
            backdrop_classes: None,
        }
    }
}

/// Anchored element placement relative to its reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Placement {
    /// Engine picks the side with the most space.
    Auto,
    /// Auto, aligned to the start.
    AutoStart,
    /// Auto, aligned to the end.
    AutoEnd,
    /// Above the reference.
    Top,
    /// Above, aligned to the start.
    TopStart,
    /// Above, aligned to the end.
    TopEnd,
    /// Below the reference.
    Bottom,
    /// Below, aligned to the start.
    BottomStart,
    /// Below, aligned to the end.
    BottomEnd,
    /// Right of the reference.
    Right,
    /// Right, aligned to the start.
    RightStart,
    /// Right, aligned to the end.
    RightEnd,
    /// Left of the reference.
    Left,
    /// Left, aligned to the start.
    LeftStart,
    /// Left, aligned to the end.
    LeftEnd,
}

impl Placement {
    const ALL: [Self; 15] = [
        Self::Auto,
        Self::AutoStart,
        Self::AutoEnd,
        Self::Top,
        Self::TopStart,
        Self::TopEnd,
        Self::Bottom,
        Self::BottomStart,
        Self::BottomEnd,
        Self::Right,
        Self::RightStart,
        Self::RightEnd,
        Self::Left,
        Self::LeftStart,
        Self::LeftEnd,
    ];

    /// Engine-facing placement name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::AutoStart => "auto-start",
            Self::AutoEnd => "auto-end",
            Self::Top => "top",
            Self::TopStart => "top-start",
            Self::TopEnd => "top-end",
            Self::Bottom => "bottom",
            Self::BottomStart => "bottom-start",
            Self::BottomEnd => "bottom-end",
            Self::Right => "right",
            Self::RightStart => "right-start",
            Self::RightEnd => "right-end",
            Self::Left => "left",
            Self::LeftStart => "left-start",
            Self::LeftEnd => "left-end",
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Placement {
    type Err = DuiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|placement| placement.as_str() == value)
            .ok_or_else(|| DuiError::InvalidConfig {
                field: "placement",
                message: format!("unknown placement '{value}'"),
            })
    }
}

/// Offset modifier: `[skidding, distance]` in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Offset {
    /// Shift along the reference edge.
    pub skidding: i32,
    /// Gap between reference and content.
    pub distance: i32,
}

impl Offset {
    /// Build an offset pair.
    #[must_use]
    pub const fn new(skidding: i32, distance: i32) -> Self {
        Self { skidding, distance }
    }
}

impl From<[i32; 2]> for Offset {
    fn from([skidding, distance]: [i32; 2]) -> Self {
        Self { skidding, distance }
    }
}

impl From<Offset> for [i32; 2] {
    fn from(offset: Offset) -> Self {
        [offset.skidding, offset.distance]
    }
}

impl FromStr for Offset {
    type Err = DuiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || DuiError::InvalidConfig {
            field: "offset",
            message: format!("expected 'skidding,distance', got '{value}'"),
        };
        let (skidding, distance) = value.split_once(',').ok_or_else(invalid)?;
        Ok(Self {
            skidding: skidding.trim().parse().map_err(|_| invalid())?,
            distance: distance.trim().parse().map_err(|_| invalid())?,
        })
    }
}

/// Anchored widget options (dropdowns, popovers).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchoredConfig {
    /// Placement requested from the engine.
    pub placement: Placement,
    /// Offset modifier handed to the engine.
    pub offset: Offset,
    /// Close when a click lands outside both reference and content.
    pub close_on_outside_click: bool,
}

impl AnchoredConfig {
    /// Dropdown defaults: `bottom-start`, `[0, 5]`.
    #[must_use]
    pub const fn dropdown() -> Self {
        Self {
            placement: Placement::BottomStart,
            offset: Offset::new(0, 5),
            close_on_outside_click: true,
        }
    }

    /// Popover defaults: `top`, `[0, 8]`.
    #[must_use]
    pub const fn popover() -> Self {
        Self {
            placement: Placement::Top,
            offset: Offset::new(0, 8),
            close_on_outside_click: true,
        }
    }

    /// Apply overrides on top of `self`.
    #[must_use]
    pub fn merged(self, overrides: AnchoredOverrides) -> Self {
        Self {
            placement: overrides.placement.unwrap_or(self.placement),
            offset: overrides.offset.unwrap_or(self.offset),
            close_on_outside_click: overrides
                .close_on_outside_click
                .unwrap_or(self.close_on_outside_click),
        }
    }

    /// Merge a JSON override document onto `self`.
    ///
    /// # Errors
    ///
    /// Returns [`DuiError::InvalidConfig`] when the document is malformed.
    pub fn merged_json(self, raw: &str) -> DuiResult<Self> {
        let overrides: AnchoredOverrides =
            serde_json::from_str(raw).map_err(|err| DuiError::InvalidConfig {
                field: "anchored",
                message: err.to_string(),
            })?;
        Ok(self.merged(overrides))
    }
}

/// Caller-supplied anchored overrides.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchoredOverrides {
    /// Placement override.
    pub placement: Option<Placement>,
    /// Offset override.
    pub offset: Option<Offset>,
    /// Outside-click dismissal override.
    pub close_on_outside_click: Option<bool>,
}

impl AnchoredOverrides {
    /// Read overrides from `data-*` attributes via the supplied lookup.
    pub fn from_attributes(markup: &Markup, lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            placement: parsed_attr(&markup.placement_attr(), &lookup),
            offset: parsed_attr(&markup.offset_attr(), &lookup),
            close_on_outside_click: bool_attr(&markup.outside_click_attr(), &lookup),
        }
    }
}

fn bool_attr(name: &str, lookup: &impl Fn(&str) -> Option<String>) -> Option<bool> {
    let value = lookup(name)?;
    match value.trim() {
        "" | "true" => Some(true),
        "false" => Some(false),
        other => {
            tracing::warn!(attribute = name, value = other, "ignoring non-boolean attribute");
            None
        }
    }
}

fn parsed_attr<T>(name: &str, lookup: &impl Fn(&str) -> Option<String>) -> Option<T>
where
    T: FromStr<Err = DuiError>,
{
    let value = lookup(name)?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            tracing::warn!(attribute = name, error = %err, "ignoring invalid attribute");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn modal_defaults_enable_everything() {
        let config = ModalConfig::default();
        assert!(config.backdrop && config.keyboard && config.close_on_outside_click);
        assert_eq!(config.backdrop_classes.first().map(String::as_str), Some("fixed"));
    }

    #[test]
    fn modal_json_overrides_merge_onto_defaults() -> DuiResult<()> {
        let config = ModalConfig::from_json(r#"{"backdrop":false,"backdropClasses":["veil"]}"#)?;
        assert!(!config.backdrop);
        assert!(config.keyboard);
        assert_eq!(config.backdrop_classes, vec!["veil".to_string()]);
        Ok(())
    }

    #[test]
    fn modal_attribute_overrides_ignore_garbage() {
        let markup = Markup::default();
        let overrides = ModalOverrides::from_attributes(
            &markup,
            lookup(&[("data-dui-backdrop", "false"), ("data-dui-keyboard", "maybe")]),
        );
        assert_eq!(overrides.backdrop, Some(false));
        assert_eq!(overrides.keyboard, None);
        let merged = ModalConfig::merged(overrides);
        assert!(!merged.backdrop);
        assert!(merged.keyboard);
    }

    #[test]
    fn anchored_defaults_differ_per_family() {
        assert_eq!(AnchoredConfig::dropdown().placement, Placement::BottomStart);
        assert_eq!(AnchoredConfig::dropdown().offset, Offset::new(0, 5));
        assert_eq!(AnchoredConfig::popover().placement, Placement::Top);
    }

    #[test]
    fn anchored_attribute_overrides_parse_placement_and_offset() {
        let markup = Markup::default();
        let overrides = AnchoredOverrides::from_attributes(
            &markup,
            lookup(&[
                ("data-dui-placement", "right-end"),
                ("data-dui-offset", "4, 12"),
                ("data-dui-outside-click", "false"),
            ]),
        );
        let config = AnchoredConfig::dropdown().merged(overrides);
        assert_eq!(config.placement, Placement::RightEnd);
        assert_eq!(config.offset, Offset::new(4, 12));
        assert!(!config.close_on_outside_click);
    }

    #[test]
    fn anchored_json_accepts_offset_pairs() -> DuiResult<()> {
        let config = AnchoredConfig::dropdown().merged_json(r#"{"placement":"left","offset":[2,3]}"#)?;
        assert_eq!(config.placement, Placement::Left);
        assert_eq!(config.offset, Offset::new(2, 3));
        Ok(())
    }

    #[test]
    fn placement_rejects_unknown_names() {
        assert!("sideways".parse::<Placement>().is_err());
        assert_eq!("top-start".parse::<Placement>(), Ok(Placement::TopStart));
    }

    #[test]
    fn offset_rejects_malformed_pairs() {
        assert!("5".parse::<Offset>().is_err());
        assert!("a,b".parse::<Offset>().is_err());
    }

    #[test]
    fn toolkit_config_validates_fields() {
        assert!(ToolkitConfig::default().validate().is_ok());
        assert!(matches!(
            ToolkitConfig::from_json(r#"{"attributePrefix":"Bad Prefix"}"#),
            Err(DuiError::InvalidConfig {
                field: "attributePrefix",
                ..
            })
        ));
        assert!(matches!(
            ToolkitConfig::from_json(r#"{"closeDelayMs":60000}"#),
            Err(DuiError::InvalidConfig {
                field: "closeDelayMs",
                ..
            })
        ));
    }

    #[test]
    fn toolkit_config_fills_missing_fields() -> DuiResult<()> {
        let config = ToolkitConfig::from_json(r#"{"attributePrefix":"acme","logFormat":"json"}"#)?;
        assert_eq!(config.close_delay_ms, DEFAULT_CLOSE_DELAY_MS);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.markup().toggle_attr(), "data-acme-toggle");
        Ok(())
    }
}
