//! `wasm-bindgen` surface: family init/cleanup functions, widget classes, and the
//! `window.Dui` namespace object.
//!
//! # Design
//! - Every export runs against the toolkit started by bootstrap; calling one before
//!   `init` starts the toolkit with default settings.
//! - Option objects cross the boundary as JSON text and are parsed by [`crate::interop`].
//! - Constructors take either an `Element` or a selector string for each target.
//! - Errors become JavaScript `Error`s whose `name` is the error kind.

use std::rc::Rc;

use dui_core::{
    Alert, AnchoredKind, AnchoredWidget, Collapse, Dom, DuiError, DuiResult, Family, Modal,
    Toolkit,
};
use js_sys::{Object, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::{JsCast, throw_val};
use web_sys::Element;

use crate::bootstrap::{start, with_toolkit};
use crate::interop::{
    NAMESPACE, anchored_config, modal_config, target_selector, toolkit_config,
};
use crate::web_dom::WebDom;

/// JavaScript `Error` named after the failure kind.
pub(crate) fn to_js_error(err: &DuiError) -> JsValue {
    let error = js_sys::Error::new(&err.to_string());
    error.set_name(err.kind());
    error.into()
}

/// JSON text for an options argument; `undefined` and `null` mean none.
fn options_json(options: &JsValue) -> Result<Option<String>, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(None);
    }
    if let Some(text) = options.as_string() {
        return Ok(Some(text));
    }
    Ok(js_sys::JSON::stringify(options)?.as_string())
}

/// Element named by a constructor argument: the element itself or the first selector match.
fn resolve(dom: &WebDom, target: &JsValue) -> DuiResult<Element> {
    if let Some(element) = target.dyn_ref::<Element>() {
        return Ok(element.clone());
    }
    let text = target.as_string();
    let selector = target_selector(text.as_deref())?;
    dom.query(selector)?
        .ok_or_else(|| DuiError::resolution(selector))
}

fn throw_on_error<T>(result: Result<T, JsValue>) -> T {
    result.unwrap_or_else(|err| throw_val(err))
}

/// Start (or restart) the toolkit with optional settings.
///
/// # Errors
///
/// Throws when the settings are invalid or the document is unavailable.
#[wasm_bindgen(js_name = init)]
pub fn init(config: JsValue) -> Result<(), JsValue> {
    let raw = options_json(&config)?;
    let config = toolkit_config(raw.as_deref()).map_err(|err| to_js_error(&err))?;
    start(config).map_err(|err| js_sys::Error::new(&format!("{err:#}")).into())
}

fn scan_family(family: &dyn Family) -> u32 {
    u32::try_from(family.scan().bound).unwrap_or(u32::MAX)
}

/// Bind any unbound modal triggers and dismiss buttons; returns how many were bound.
///
/// # Errors
///
/// Throws when the toolkit cannot start.
#[wasm_bindgen(js_name = initModal)]
pub fn init_modal() -> Result<u32, JsValue> {
    with_toolkit(|toolkit| Ok(scan_family(toolkit.modals().as_ref())))
}

/// Detach every modal binding and instance.
///
/// # Errors
///
/// Throws when the toolkit cannot start.
#[wasm_bindgen(js_name = cleanupModals)]
pub fn cleanup_modals() -> Result<(), JsValue> {
    with_toolkit(|toolkit| {
        toolkit.modals().cleanup();
        Ok(())
    })
}

/// Bind any unbound collapse triggers.
///
/// # Errors
///
/// Throws when the toolkit cannot start.
#[wasm_bindgen(js_name = initCollapse)]
pub fn init_collapse() -> Result<u32, JsValue> {
    with_toolkit(|toolkit| Ok(scan_family(toolkit.collapses().as_ref())))
}

/// Bind any unbound alert dismiss buttons.
///
/// # Errors
///
/// Throws when the toolkit cannot start.
#[wasm_bindgen(js_name = initAlert)]
pub fn init_alert() -> Result<u32, JsValue> {
    with_toolkit(|toolkit| Ok(scan_family(toolkit.alerts().as_ref())))
}

fn init_anchored(toolkit: &Toolkit<WebDom>, family: &dyn Family) -> u32 {
    if toolkit.bridge().is_ready() {
        scan_family(family)
    } else {
        toolkit.load_anchored();
        0
    }
}

/// Bind dropdown triggers, loading the positioning engine first when needed.
///
/// # Errors
///
/// Throws when the toolkit cannot start.
#[wasm_bindgen(js_name = initDropdowns)]
pub fn init_dropdowns() -> Result<u32, JsValue> {
    with_toolkit(|toolkit| Ok(init_anchored(toolkit, toolkit.dropdowns().as_ref())))
}

/// Detach every dropdown binding and instance.
///
/// # Errors
///
/// Throws when the toolkit cannot start.
#[wasm_bindgen(js_name = cleanupDropdowns)]
pub fn cleanup_dropdowns() -> Result<(), JsValue> {
    with_toolkit(|toolkit| {
        toolkit.dropdowns().cleanup();
        Ok(())
    })
}

/// Bind popover triggers, loading the positioning engine first when needed.
///
/// # Errors
///
/// Throws when the toolkit cannot start.
#[wasm_bindgen(js_name = initPopovers)]
pub fn init_popovers() -> Result<u32, JsValue> {
    with_toolkit(|toolkit| Ok(init_anchored(toolkit, toolkit.popovers().as_ref())))
}

/// Detach every popover binding and instance.
///
/// # Errors
///
/// Throws when the toolkit cannot start.
#[wasm_bindgen(js_name = cleanupPopovers)]
pub fn cleanup_popovers() -> Result<(), JsValue> {
    with_toolkit(|toolkit| {
        toolkit.popovers().cleanup();
        Ok(())
    })
}

/// Programmatic modal.
#[wasm_bindgen(js_name = Modal)]
pub struct ModalHandle {
    inner: Modal<WebDom>,
}

#[wasm_bindgen(js_class = Modal)]
impl ModalHandle {
    /// Wrap `target`, an element or a selector.
    ///
    /// # Errors
    ///
    /// Throws a `resolution` error when the target names no element.
    #[wasm_bindgen(constructor)]
    pub fn new(target: JsValue, options: JsValue) -> Result<Self, JsValue> {
        let raw = options_json(&options)?;
        with_toolkit(|toolkit| {
            let config = modal_config(raw.as_deref())?;
            let element = resolve(toolkit.dom(), &target)?;
            Modal::with_markup(
                Rc::clone(toolkit.dom()),
                toolkit.markup().clone(),
                element,
                config,
            )
        })
        .map(|inner| Self { inner })
    }

    /// Show the modal.
    ///
    /// # Errors
    ///
    /// Throws on host failures.
    pub fn show(&self) -> Result<(), JsValue> {
        self.inner.show().map_err(|err| to_js_error(&err))
    }

    /// Hide the modal.
    ///
    /// # Errors
    ///
    /// Throws on host failures.
    pub fn hide(&self) -> Result<(), JsValue> {
        self.inner.hide().map_err(|err| to_js_error(&err))
    }

    /// Flip visibility.
    ///
    /// # Errors
    ///
    /// Throws on host failures.
    pub fn toggle(&self) -> Result<(), JsValue> {
        self.inner.toggle().map_err(|err| to_js_error(&err))
    }

    /// Hide and release listeners.
    ///
    /// # Errors
    ///
    /// Throws on host failures.
    pub fn destroy(&self) -> Result<(), JsValue> {
        self.inner.destroy().map_err(|err| to_js_error(&err))
    }

    /// Whether the modal is shown.
    #[wasm_bindgen(getter, js_name = isVisible)]
    pub fn is_visible(&self) -> bool {
        self.inner.is_visible()
    }
}

fn anchored(
    kind: AnchoredKind,
    reference: &JsValue,
    content: &JsValue,
    options: &JsValue,
) -> Result<AnchoredWidget<WebDom>, JsValue> {
    let raw = options_json(options)?;
    with_toolkit(|toolkit| {
        let config = anchored_config(kind, raw.as_deref())?;
        let reference = resolve(toolkit.dom(), reference)?;
        let content = resolve(toolkit.dom(), content)?;
        let widget = AnchoredWidget::new(
            Rc::clone(toolkit.dom()),
            Rc::clone(toolkit.bridge()),
            kind,
            reference,
            content,
            config,
        )?;
        widget.spawn_positioning();
        Ok(widget)
    })
}

/// Programmatic dropdown.
#[wasm_bindgen(js_name = Dropdown)]
pub struct DropdownHandle {
    inner: AnchoredWidget<WebDom>,
}

#[wasm_bindgen(js_class = Dropdown)]
impl DropdownHandle {
    /// Anchor `content` to `reference`.
    ///
    /// # Errors
    ///
    /// Throws a `resolution` error naming the target that did not resolve.
    #[wasm_bindgen(constructor)]
    pub fn new(reference: JsValue, content: JsValue, options: JsValue) -> Result<Self, JsValue> {
        anchored(AnchoredKind::Dropdown, &reference, &content, &options).map(|inner| Self { inner })
    }

    /// Open the menu.
    ///
    /// # Errors
    ///
    /// Throws on host failures.
    pub fn open(&self) -> Result<(), JsValue> {
        self.inner.open().map_err(|err| to_js_error(&err))
    }

    /// Close the menu.
    ///
    /// # Errors
    ///
    /// Throws on host failures.
    pub fn close(&self) -> Result<(), JsValue> {
        self.inner.close().map_err(|err| to_js_error(&err))
    }

    /// Flip the menu.
    ///
    /// # Errors
    ///
    /// Throws on host failures.
    pub fn toggle(&self) -> Result<(), JsValue> {
        self.inner.toggle().map_err(|err| to_js_error(&err))
    }

    /// Release the positioning instance and listeners.
    pub fn destroy(&self) {
        self.inner.destroy();
    }

    /// Whether the menu is open.
    #[wasm_bindgen(getter, js_name = isOpen)]
    pub fn is_open(&self) -> bool {
        self.inner.is_open()
    }
}

/// Programmatic popover.
#[wasm_bindgen(js_name = Popover)]
pub struct PopoverHandle {
    inner: AnchoredWidget<WebDom>,
}

#[wasm_bindgen(js_class = Popover)]
impl PopoverHandle {
    /// Anchor `content` to `reference`.
    ///
    /// # Errors
    ///
    /// Throws a `resolution` error naming the target that did not resolve.
    #[wasm_bindgen(constructor)]
    pub fn new(reference: JsValue, content: JsValue, options: JsValue) -> Result<Self, JsValue> {
        anchored(AnchoredKind::Popover, &reference, &content, &options).map(|inner| Self { inner })
    }

    /// Show the popover.
    ///
    /// # Errors
    ///
    /// Throws on host failures.
    pub fn open(&self) -> Result<(), JsValue> {
        self.inner.open().map_err(|err| to_js_error(&err))
    }

    /// Hide the popover.
    ///
    /// # Errors
    ///
    /// Throws on host failures.
    pub fn close(&self) -> Result<(), JsValue> {
        self.inner.close().map_err(|err| to_js_error(&err))
    }

    /// Flip the popover.
    ///
    /// # Errors
    ///
    /// Throws on host failures.
    pub fn toggle(&self) -> Result<(), JsValue> {
        self.inner.toggle().map_err(|err| to_js_error(&err))
    }

    /// Release the positioning instance and listeners.
    pub fn destroy(&self) {
        self.inner.destroy();
    }

    /// Whether the popover is shown.
    #[wasm_bindgen(getter, js_name = isOpen)]
    pub fn is_open(&self) -> bool {
        self.inner.is_open()
    }
}

/// Programmatic collapse.
#[wasm_bindgen(js_name = Collapse)]
pub struct CollapseHandle {
    inner: Collapse<WebDom>,
}

#[wasm_bindgen(js_class = Collapse)]
impl CollapseHandle {
    /// Pair `trigger` with `content`.
    ///
    /// # Errors
    ///
    /// Throws a `resolution` error naming the target that did not resolve.
    #[wasm_bindgen(constructor)]
    pub fn new(trigger: JsValue, content: JsValue) -> Result<Self, JsValue> {
        with_toolkit(|toolkit| {
            let trigger = resolve(toolkit.dom(), &trigger)?;
            let content = resolve(toolkit.dom(), &content)?;
            Ok(Collapse::new(Rc::clone(toolkit.dom()), trigger, content))
        })
        .map(|inner| Self { inner })
    }

    /// Expand the content.
    ///
    /// # Errors
    ///
    /// Throws on host failures.
    pub fn expand(&self) -> Result<(), JsValue> {
        self.inner.expand().map_err(|err| to_js_error(&err))
    }

    /// Collapse the content.
    ///
    /// # Errors
    ///
    /// Throws on host failures.
    pub fn collapse(&self) -> Result<(), JsValue> {
        self.inner.collapse().map_err(|err| to_js_error(&err))
    }

    /// Flip the content.
    ///
    /// # Errors
    ///
    /// Throws on host failures.
    pub fn toggle(&self) -> Result<(), JsValue> {
        self.inner.toggle().map_err(|err| to_js_error(&err))
    }

    /// Whether the trigger reports expanded.
    #[wasm_bindgen(getter, js_name = isExpanded)]
    pub fn is_expanded(&self) -> bool {
        self.inner.is_expanded()
    }
}

/// Programmatic alert.
#[wasm_bindgen(js_name = Alert)]
pub struct AlertHandle {
    inner: Alert<WebDom>,
}

#[wasm_bindgen(js_class = Alert)]
impl AlertHandle {
    /// Wrap `target`, an element or a selector.
    ///
    /// # Errors
    ///
    /// Throws a `resolution` error when the target names no element.
    #[wasm_bindgen(constructor)]
    pub fn new(target: JsValue) -> Result<Self, JsValue> {
        with_toolkit(|toolkit| {
            let element = resolve(toolkit.dom(), &target)?;
            Ok(Alert::new(Rc::clone(toolkit.dom()), element))
        })
        .map(|inner| Self { inner })
    }

    /// Show the alert.
    ///
    /// # Errors
    ///
    /// Throws on host failures.
    pub fn show(&self) -> Result<(), JsValue> {
        self.inner.show().map_err(|err| to_js_error(&err))
    }

    /// Hide the alert.
    ///
    /// # Errors
    ///
    /// Throws on host failures.
    pub fn hide(&self) -> Result<(), JsValue> {
        self.inner.hide().map_err(|err| to_js_error(&err))
    }

    /// Flip the alert.
    ///
    /// # Errors
    ///
    /// Throws on host failures.
    pub fn toggle(&self) -> Result<(), JsValue> {
        self.inner.toggle().map_err(|err| to_js_error(&err))
    }

    /// Whether the alert is shown.
    #[wasm_bindgen(getter, js_name = isVisible)]
    pub fn is_visible(&self) -> bool {
        self.inner.is_visible()
    }
}

fn set(namespace: &Object, name: &str, value: &JsValue) -> Result<(), JsValue> {
    Reflect::set(namespace, &JsValue::from_str(name), value).map(drop)
}

fn set_scan(
    namespace: &Object,
    name: &str,
    scan: fn() -> Result<u32, JsValue>,
) -> Result<(), JsValue> {
    let closure = Closure::<dyn Fn() -> u32>::new(move || throw_on_error(scan()));
    set(namespace, name, &closure.into_js_value())
}

fn set_cleanup(
    namespace: &Object,
    name: &str,
    cleanup: fn() -> Result<(), JsValue>,
) -> Result<(), JsValue> {
    let closure = Closure::<dyn Fn()>::new(move || throw_on_error(cleanup()));
    set(namespace, name, &closure.into_js_value())
}

/// Install `window.Dui`.
///
/// Widget entries are factories: `Dui.Modal("#id", {})` or `Dui.Modal(element)` returns a
/// `Modal` instance.
pub(crate) fn install_namespace() -> Result<(), JsValue> {
    let namespace = Object::new();

    let init_closure =
        Closure::<dyn Fn(JsValue)>::new(move |config: JsValue| throw_on_error(init(config)));
    set(&namespace, "init", &init_closure.into_js_value())?;
    set_scan(&namespace, "initModal", init_modal)?;
    set_cleanup(&namespace, "cleanupModals", cleanup_modals)?;
    set_scan(&namespace, "initCollapse", init_collapse)?;
    set_scan(&namespace, "initAlert", init_alert)?;
    set_scan(&namespace, "initDropdowns", init_dropdowns)?;
    set_cleanup(&namespace, "cleanupDropdowns", cleanup_dropdowns)?;
    set_scan(&namespace, "initPopovers", init_popovers)?;
    set_cleanup(&namespace, "cleanupPopovers", cleanup_popovers)?;

    let modal = Closure::<dyn Fn(JsValue, JsValue) -> JsValue>::new(
        move |target: JsValue, options: JsValue| {
            JsValue::from(throw_on_error(ModalHandle::new(target, options)))
        },
    );
    set(&namespace, "Modal", &modal.into_js_value())?;
    let dropdown = Closure::<dyn Fn(JsValue, JsValue, JsValue) -> JsValue>::new(
        move |reference: JsValue, content: JsValue, options: JsValue| {
            JsValue::from(throw_on_error(DropdownHandle::new(reference, content, options)))
        },
    );
    set(&namespace, "Dropdown", &dropdown.into_js_value())?;
    let popover = Closure::<dyn Fn(JsValue, JsValue, JsValue) -> JsValue>::new(
        move |reference: JsValue, content: JsValue, options: JsValue| {
            JsValue::from(throw_on_error(PopoverHandle::new(reference, content, options)))
        },
    );
    set(&namespace, "Popover", &popover.into_js_value())?;
    let collapse = Closure::<dyn Fn(JsValue, JsValue) -> JsValue>::new(
        move |trigger: JsValue, content: JsValue| {
            JsValue::from(throw_on_error(CollapseHandle::new(trigger, content)))
        },
    );
    set(&namespace, "Collapse", &collapse.into_js_value())?;
    let alert = Closure::<dyn Fn(JsValue) -> JsValue>::new(move |target: JsValue| {
        JsValue::from(throw_on_error(AlertHandle::new(target)))
    });
    set(&namespace, "Alert", &alert.into_js_value())?;

    set(&gloo::utils::window(), NAMESPACE, &namespace)?;
    tracing::debug!(namespace = NAMESPACE, "namespace installed");
    Ok(())
}
