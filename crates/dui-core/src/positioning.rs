//! Bridge to the external anchored-positioning engine.
//!
//! # Design
//! - The engine is loaded lazily, exactly once; every caller awaiting the load shares one
//!   future and observes the same outcome, failures included.
//! - Handles are owned by the widget that created them and consumed on destroy.
//! - A failed load only affects widgets that needed positioning.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};

use crate::config::{AnchoredConfig, Offset, Placement};
use crate::error::{DuiError, DuiResult};

/// Options handed to the engine when creating an instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PositioningOptions {
    /// Requested placement.
    pub placement: Placement,
    /// Offset modifier.
    pub offset: Offset,
}

impl From<&AnchoredConfig> for PositioningOptions {
    fn from(config: &AnchoredConfig) -> Self {
        Self {
            placement: config.placement,
            offset: config.offset,
        }
    }
}

/// A live engine instance tied to one reference/content pair.
pub trait Positioned {
    /// Recompute placement.
    fn update(&self);
    /// Release the instance.
    fn destroy(self: Box<Self>);
}

/// Engine capable of creating positioned instances.
pub trait PositioningEngine<N> {
    /// Create an instance positioning `content` against `reference`.
    ///
    /// # Errors
    ///
    /// Returns [`DuiError::EngineUnavailable`] when the engine is not installed.
    fn create(
        &self,
        reference: &N,
        content: &N,
        options: &PositioningOptions,
    ) -> DuiResult<Box<dyn Positioned>>;
}

/// One-shot loader for the engine.
pub trait EngineLoader {
    /// Start loading. Called at most once per bridge.
    fn load(&self) -> LocalBoxFuture<'static, DuiResult<()>>;
}

/// Load future shared by every waiter.
pub type SharedLoad = Shared<LocalBoxFuture<'static, DuiResult<()>>>;

/// Owned engine instance.
pub struct PositioningHandle {
    instance: Box<dyn Positioned>,
}

impl fmt::Debug for PositioningHandle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("PositioningHandle").finish_non_exhaustive()
    }
}

/// Lazy loader plus instance factory.
pub struct PositioningBridge<N> {
    engine: Rc<dyn PositioningEngine<N>>,
    loader: Rc<dyn EngineLoader>,
    load: RefCell<Option<SharedLoad>>,
    ready: Rc<Cell<bool>>,
}

impl<N> fmt::Debug for PositioningBridge<N> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("PositioningBridge")
            .field("ready", &self.ready.get())
            .field("load_started", &self.load.borrow().is_some())
            .finish_non_exhaustive()
    }
}

impl<N> PositioningBridge<N> {
    /// Bridge over `engine`, loaded through `loader`.
    #[must_use]
    pub fn new(engine: Rc<dyn PositioningEngine<N>>, loader: Rc<dyn EngineLoader>) -> Self {
        Self {
            engine,
            loader,
            load: RefCell::new(None),
            ready: Rc::new(Cell::new(false)),
        }
    }

    /// Whether the engine finished loading successfully.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.get()
    }

    /// Shared load future; the first call starts the load.
    pub fn ensure_loaded(&self) -> SharedLoad {
        let mut slot = self.load.borrow_mut();
        let shared = slot.get_or_insert_with(|| {
            tracing::debug!("loading positioning engine");
            let pending = self.loader.load();
            let ready = Rc::clone(&self.ready);
            async move {
                let outcome = pending.await;
                match &outcome {
                    Ok(()) => {
                        ready.set(true);
                        tracing::info!("positioning engine loaded");
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "positioning engine failed to load");
                    }
                }
                outcome
            }
            .boxed_local()
            .shared()
        });
        shared.clone()
    }

    /// Create an instance for the pair.
    ///
    /// # Errors
    ///
    /// Returns [`DuiError::EngineUnavailable`] before a successful load, or whatever the
    /// engine reports.
    pub fn create(
        &self,
        reference: &N,
        content: &N,
        options: &PositioningOptions,
    ) -> DuiResult<PositioningHandle> {
        if !self.is_ready() {
            return Err(DuiError::EngineUnavailable);
        }
        let instance = self.engine.create(reference, content, options)?;
        Ok(PositioningHandle { instance })
    }

    /// Recompute placement for `handle`.
    pub fn update(&self, handle: &PositioningHandle) {
        handle.instance.update();
    }

    /// Release `handle`.
    pub fn destroy(&self, handle: PositioningHandle) {
        handle.instance.destroy();
    }
}
