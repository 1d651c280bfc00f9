//! Popper-backed positioning engine and its script loader.
//!
//! # Design
//! - The engine is looked up on `window` at call time; nothing is cached across loads.
//! - The loader injects one `<script>` and resolves on `load`, `error`, or a timeout,
//!   whichever comes first.

use std::cell::RefCell;
use std::rc::Rc;

use dui_core::positioning::Positioned;
use dui_core::{
    DuiError, DuiResult, EngineLoader, PositioningBridge, PositioningEngine, PositioningOptions,
    ToolkitConfig,
};
use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::{Either, LocalBoxFuture, select};
use gloo::events::EventListener;
use gloo_timers::future::TimeoutFuture;
use js_sys::{Function, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlScriptElement};

use crate::interop::PopperOptions;
use crate::web_dom::js_error;

/// Upper bound on waiting for the engine script.
pub const ENGINE_LOAD_TIMEOUT_MS: u32 = 10_000;

fn lookup_global(global: &str) -> Option<JsValue> {
    Reflect::get(&gloo::utils::window(), &JsValue::from_str(global))
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())
}

fn method(target: &JsValue, name: &str) -> Option<Function> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok())
}

/// `window[global].createPopper`.
#[derive(Debug, Clone)]
pub struct PopperEngine {
    global: String,
}

impl PopperEngine {
    /// Engine exposed on `window[global]`.
    #[must_use]
    pub fn new(global: impl Into<String>) -> Self {
        Self {
            global: global.into(),
        }
    }
}

impl PositioningEngine<Element> for PopperEngine {
    fn create(
        &self,
        reference: &Element,
        content: &Element,
        options: &PositioningOptions,
    ) -> DuiResult<Box<dyn Positioned>> {
        let namespace = lookup_global(&self.global).ok_or(DuiError::EngineUnavailable)?;
        let create = method(&namespace, "createPopper").ok_or(DuiError::EngineUnavailable)?;
        let json = PopperOptions::from(options).to_json()?;
        let parsed = js_sys::JSON::parse(&json).map_err(|err| js_error("JSON.parse", &err))?;
        let instance = create
            .call3(&namespace, reference, content, &parsed)
            .map_err(|err| js_error("createPopper", &err))?;
        Ok(Box::new(PopperInstance { instance }))
    }
}

struct PopperInstance {
    instance: JsValue,
}

impl PopperInstance {
    fn invoke(&self, name: &'static str) {
        let Some(function) = method(&self.instance, name) else {
            tracing::warn!(method = name, "popper instance method missing");
            return;
        };
        if let Err(err) = function.call0(&self.instance) {
            tracing::warn!(method = name, error = %js_error(name, &err), "popper call failed");
        }
    }
}

impl Positioned for PopperInstance {
    fn update(&self) {
        self.invoke("update");
    }

    fn destroy(self: Box<Self>) {
        self.invoke("destroy");
    }
}

/// Loads the engine by injecting its script tag.
#[derive(Debug, Clone)]
pub struct ScriptLoader {
    url: String,
    global: String,
}

impl ScriptLoader {
    /// Loader for `url`, considered loaded once `window[global]` exists.
    #[must_use]
    pub fn new(url: impl Into<String>, global: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            global: global.into(),
        }
    }

    fn inject(&self) -> DuiResult<HtmlScriptElement> {
        let document = gloo::utils::document();
        let script = document
            .create_element("script")
            .map_err(|err| js_error("createElement", &err))?
            .dyn_into::<HtmlScriptElement>()
            .map_err(|_| DuiError::dom("createElement", "not a script element"))?;
        script.set_src(&self.url);
        script.set_async(true);
        let head = document
            .head()
            .ok_or_else(|| DuiError::dom("head", "document has no head"))?;
        head.append_child(&script)
            .map_err(|err| js_error("appendChild", &err))?;
        Ok(script)
    }
}

type LoadSignal = Rc<RefCell<Option<oneshot::Sender<Result<(), String>>>>>;

fn signal_on(script: &HtmlScriptElement, event: &'static str, signal: &LoadSignal) -> EventListener {
    let signal = Rc::clone(signal);
    EventListener::once(script, event, move |_| {
        if let Some(sender) = signal.borrow_mut().take() {
            let outcome = if event == "load" {
                Ok(())
            } else {
                Err(String::from("script failed to load"))
            };
            if sender.send(outcome).is_err() {
                tracing::debug!(event, "engine script settled after the load stopped waiting");
            }
        }
    })
}

impl EngineLoader for ScriptLoader {
    fn load(&self) -> LocalBoxFuture<'static, DuiResult<()>> {
        let loader = self.clone();
        async move {
            if lookup_global(&loader.global).is_some() {
                tracing::debug!(global = %loader.global, "positioning engine already present");
                return Ok(());
            }
            let script = loader.inject()?;
            let (sender, receiver) = oneshot::channel();
            let signal: LoadSignal = Rc::new(RefCell::new(Some(sender)));
            let on_load = signal_on(&script, "load", &signal);
            let on_error = signal_on(&script, "error", &signal);
            let timeout = TimeoutFuture::new(ENGINE_LOAD_TIMEOUT_MS).boxed_local();
            let outcome = match select(receiver, timeout).await {
                Either::Left((Ok(outcome), _)) => outcome,
                Either::Left((Err(_), _)) => Err(String::from("load listener dropped")),
                Either::Right(((), _)) => Err(format!("timed out after {ENGINE_LOAD_TIMEOUT_MS}ms")),
            };
            drop(on_load);
            drop(on_error);
            outcome.map_err(|detail| DuiError::DependencyLoad {
                detail: format!("{}: {detail}", loader.url),
            })?;
            if lookup_global(&loader.global).is_none() {
                return Err(DuiError::DependencyLoad {
                    detail: format!("{} did not define window.{}", loader.url, loader.global),
                });
            }
            Ok(())
        }
        .boxed_local()
    }
}

/// Bridge over Popper, loaded from the configured script URL.
#[must_use]
pub fn web_bridge(config: &ToolkitConfig) -> PositioningBridge<Element> {
    PositioningBridge::new(
        Rc::new(PopperEngine::new(config.engine_global.clone())),
        Rc::new(ScriptLoader::new(
            config.engine_script_url.clone(),
            config.engine_global.clone(),
        )),
    )
}
