//! Conversions at the JavaScript boundary that do not need a browser.
//!
//! # Design
//! - Option objects arrive as JSON text; absent, `null`, and `undefined` all mean
//!   "use the defaults".
//! - Widget targets are elements or selector strings; anything else, including a blank
//!   selector, is a resolution failure.
//! - The Popper options document is built from typed structs so placement and offset
//!   names stay in one place.

use dui_core::{
    AnchoredConfig, AnchoredKind, DuiError, DuiResult, ModalConfig, Offset, Placement,
    PositioningOptions, ToolkitConfig,
};
use serde::Serialize;

/// Global namespace object installed on `window`.
pub const NAMESPACE: &str = "Dui";

/// `document.readyState` value meaning the body is still being parsed.
pub const READY_STATE_LOADING: &str = "loading";

/// Whether bootstrap must wait for `DOMContentLoaded`.
#[must_use]
pub fn must_defer(ready_state: &str) -> bool {
    ready_state == READY_STATE_LOADING
}

fn provided(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|raw| !raw.is_empty() && *raw != "null" && *raw != "undefined")
}

/// Stand-in selector reported when a target is neither an element nor a string.
pub const UNRESOLVABLE_TARGET: &str = "<not an element or selector>";

/// Selector to query for a widget target that is not already an element.
///
/// `text` is the target's string value, if it has one.
///
/// # Errors
///
/// Returns [`DuiError::Resolution`] for non-string targets and blank selectors.
pub fn target_selector(text: Option<&str>) -> DuiResult<&str> {
    match text.map(str::trim) {
        Some(selector) if !selector.is_empty() => Ok(selector),
        Some(_) => Err(DuiError::resolution("<empty selector>")),
        None => Err(DuiError::resolution(UNRESOLVABLE_TARGET)),
    }
}

/// Toolkit settings from an optional JSON document.
///
/// # Errors
///
/// Returns [`DuiError::InvalidConfig`] when the document is malformed or invalid.
pub fn toolkit_config(raw: Option<&str>) -> DuiResult<ToolkitConfig> {
    provided(raw).map_or_else(|| Ok(ToolkitConfig::default()), ToolkitConfig::from_json)
}

/// Modal settings from an optional JSON override document.
///
/// # Errors
///
/// Returns [`DuiError::InvalidConfig`] when the document is malformed.
pub fn modal_config(raw: Option<&str>) -> DuiResult<ModalConfig> {
    provided(raw).map_or_else(|| Ok(ModalConfig::default()), ModalConfig::from_json)
}

/// Anchored settings for `kind` from an optional JSON override document.
///
/// # Errors
///
/// Returns [`DuiError::InvalidConfig`] when the document is malformed.
pub fn anchored_config(kind: AnchoredKind, raw: Option<&str>) -> DuiResult<AnchoredConfig> {
    let defaults = kind.defaults();
    match provided(raw) {
        Some(raw) => defaults.merged_json(raw),
        None => Ok(defaults),
    }
}

/// Options document handed to `createPopper`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PopperOptions {
    placement: Placement,
    modifiers: Vec<PopperModifier>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct PopperModifier {
    name: &'static str,
    options: OffsetOptions,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
struct OffsetOptions {
    offset: Offset,
}

impl From<&PositioningOptions> for PopperOptions {
    fn from(options: &PositioningOptions) -> Self {
        Self {
            placement: options.placement,
            modifiers: vec![PopperModifier {
                name: "offset",
                options: OffsetOptions {
                    offset: options.offset,
                },
            }],
        }
    }
}

impl PopperOptions {
    /// Serialise for `JSON.parse` on the JavaScript side.
    ///
    /// # Errors
    ///
    /// Returns [`DuiError::Dom`] if serialisation fails.
    pub fn to_json(&self) -> DuiResult<String> {
        serde_json::to_string(self)
            .map_err(|err| DuiError::dom("createPopper", format!("options: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn popper_options_carry_placement_and_offset() -> DuiResult<()> {
        let options = PopperOptions::from(&PositioningOptions {
            placement: Placement::BottomStart,
            offset: Offset::new(0, 5),
        });
        let value: serde_json::Value = serde_json::from_str(&options.to_json()?)
            .map_err(|err| DuiError::dom("test", err.to_string()))?;
        assert_eq!(
            value,
            json!({
                "placement": "bottom-start",
                "modifiers": [{ "name": "offset", "options": { "offset": [0, 5] } }]
            })
        );
        Ok(())
    }

    #[test]
    fn absent_options_mean_defaults() -> DuiResult<()> {
        assert_eq!(toolkit_config(None)?, ToolkitConfig::default());
        assert_eq!(modal_config(Some("undefined"))?, ModalConfig::default());
        assert_eq!(
            anchored_config(AnchoredKind::Popover, Some(" null "))?,
            AnchoredConfig::popover()
        );
        Ok(())
    }

    #[test]
    fn provided_options_are_merged() -> DuiResult<()> {
        let config = anchored_config(AnchoredKind::Dropdown, Some(r#"{"offset":[4,12]}"#))?;
        assert_eq!(config.offset, Offset::new(4, 12));
        assert_eq!(config.placement, Placement::BottomStart);
        assert!(modal_config(Some("{")).is_err());
        Ok(())
    }

    #[test]
    fn string_targets_are_trimmed_selectors() -> DuiResult<()> {
        assert_eq!(target_selector(Some("#menu"))?, "#menu");
        assert_eq!(target_selector(Some("  .card > button "))?, ".card > button");
        Ok(())
    }

    #[test]
    fn blank_and_non_string_targets_fail_resolution() {
        assert_eq!(
            target_selector(Some("   ")),
            Err(DuiError::resolution("<empty selector>"))
        );
        let err = target_selector(None).err();
        assert_eq!(err.as_ref().map(DuiError::kind), Some("resolution"));
        assert_eq!(err, Some(DuiError::resolution(UNRESOLVABLE_TARGET)));
    }

    #[test]
    fn only_loading_defers_bootstrap() {
        assert!(must_defer("loading"));
        assert!(!must_defer("interactive"));
        assert!(!must_defer("complete"));
    }
}
