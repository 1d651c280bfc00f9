//! Page bootstrap: logging, toolkit construction, and the initial scan.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result, anyhow};
use dui_core::{DuiError, ToolkitConfig, Toolkit};
use gloo::events::EventListener;
use wasm_bindgen::JsValue;

use crate::exports::{install_namespace, to_js_error};
use crate::interop::must_defer;
use crate::popper::web_bridge;
use crate::telemetry::{LoggingConfig, init_logging};
use crate::web_dom::WebDom;

thread_local! {
    static TOOLKIT: RefCell<Option<Rc<Toolkit<WebDom>>>> = const { RefCell::new(None) };
}

fn active() -> Option<Rc<Toolkit<WebDom>>> {
    TOOLKIT.with(|slot| slot.borrow().clone())
}

/// Run `action` against the active toolkit, starting one with defaults if needed.
pub(crate) fn with_toolkit<T>(
    action: impl FnOnce(&Rc<Toolkit<WebDom>>) -> Result<T, DuiError>,
) -> Result<T, JsValue> {
    if active().is_none() {
        start(ToolkitConfig::default())
            .map_err(|err| JsValue::from(js_sys::Error::new(&format!("{err:#}"))))?;
    }
    let toolkit = active()
        .ok_or_else(|| JsValue::from(js_sys::Error::new("dui toolkit is not running")))?;
    action(&toolkit).map_err(|err| to_js_error(&err))
}

/// Build the toolkit for `config` and scan once the document is parsed.
///
/// A previously started toolkit is shut down first.
///
/// # Errors
///
/// Returns an error when the page has no document or change observation cannot start.
pub fn start(config: ToolkitConfig) -> Result<()> {
    if let Err(err) = init_logging(&LoggingConfig::from(&config)) {
        tracing::debug!(error = %err, "logging already initialised");
    }

    let dom = Rc::new(WebDom::new().context("failed to access the document")?);
    let ready_state = js_sys::Reflect::get(dom.document(), &JsValue::from_str("readyState"))
        .ok()
        .and_then(|value| value.as_string())
        .unwrap_or_default();
    let bridge = Rc::new(web_bridge(&config));
    let toolkit = Rc::new(Toolkit::new(Rc::clone(&dom), bridge, config));

    let previous = TOOLKIT.with(|slot| slot.borrow_mut().replace(Rc::clone(&toolkit)));
    if let Some(previous) = previous {
        tracing::info!("replacing previously started toolkit");
        previous.shutdown();
    }
    install_namespace().map_err(|err| anyhow!("failed to install namespace: {err:?}"))?;

    if must_defer(&ready_state) {
        tracing::debug!("document still loading; deferring scan");
        EventListener::once(dom.document(), "DOMContentLoaded", move |_| {
            if toolkit.is_shut_down() {
                tracing::debug!("toolkit replaced before the document finished loading");
                return;
            }
            if let Err(err) = toolkit.start() {
                tracing::error!(error = %err, "failed to start widgets");
            }
        })
        .forget();
        return Ok(());
    }

    toolkit
        .start()
        .map(drop)
        .map_err(|err| anyhow!("failed to start widgets: {err}"))
}

/// Entrypoint invoked by Trunk for wasm32 builds; starts with default settings.
pub fn run() {
    if let Err(err) = start(ToolkitConfig::default()) {
        tracing::error!(error = %err, "dui bootstrap failed");
        gloo::console::error!(format!("dui bootstrap failed: {err:#}"));
    }
}
