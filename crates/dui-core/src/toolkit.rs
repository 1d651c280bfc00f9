//! Application wiring: one explicit owner for every family, the scanner, and the bridge.
//!
//! # Design
//! - Built once by the host at startup; tests build as many as they like.
//! - Modal, collapse, and alert are scanned immediately. Dropdowns and popovers join the
//!   scanner only after the positioning engine loads; a load failure is logged and leaves
//!   the other families running.
//! - Shutdown is final: a pending engine load completes without binding anything and
//!   later `start` calls do nothing.

use std::cell::Cell;
use std::rc::Rc;

use futures::FutureExt;

use crate::config::ToolkitConfig;
use crate::dom::Dom;
use crate::error::DuiResult;
use crate::markup::Markup;
use crate::positioning::PositioningBridge;
use crate::scanner::{Family, ScanReport, Scanner};
use crate::widgets::alert::AlertFamily;
use crate::widgets::anchored::{AnchoredFamily, AnchoredKind};
use crate::widgets::collapse::CollapseFamily;
use crate::widgets::modal_family::ModalFamily;

/// Every declarative family plus the shared scanner and positioning bridge.
pub struct Toolkit<D: Dom> {
    dom: Rc<D>,
    config: ToolkitConfig,
    markup: Markup,
    bridge: Rc<PositioningBridge<D::Node>>,
    scanner: Rc<Scanner<D>>,
    modals: Rc<ModalFamily<D>>,
    collapses: Rc<CollapseFamily<D>>,
    alerts: Rc<AlertFamily<D>>,
    dropdowns: Rc<AnchoredFamily<D>>,
    popovers: Rc<AnchoredFamily<D>>,
    anchored_registered: Rc<Cell<bool>>,
    shut_down: Rc<Cell<bool>>,
}

impl<D: Dom> Toolkit<D> {
    /// Wire every family for `config`.
    #[must_use]
    pub fn new(dom: Rc<D>, bridge: Rc<PositioningBridge<D::Node>>, config: ToolkitConfig) -> Self {
        let markup = config.markup();
        let scanner = Scanner::new(Rc::clone(&dom));
        let modals =
            ModalFamily::with_close_delay(Rc::clone(&dom), markup.clone(), config.close_delay_ms);
        let collapses = CollapseFamily::new(Rc::clone(&dom), markup.clone());
        let alerts = AlertFamily::new(Rc::clone(&dom), markup.clone());
        let dropdowns = AnchoredFamily::new(
            Rc::clone(&dom),
            Rc::clone(&bridge),
            markup.clone(),
            AnchoredKind::Dropdown,
        );
        let popovers = AnchoredFamily::new(
            Rc::clone(&dom),
            Rc::clone(&bridge),
            markup.clone(),
            AnchoredKind::Popover,
        );
        scanner.register(Rc::clone(&alerts) as Rc<dyn Family>);
        scanner.register(Rc::clone(&collapses) as Rc<dyn Family>);
        scanner.register(Rc::clone(&modals) as Rc<dyn Family>);
        Self {
            dom,
            config,
            markup,
            bridge,
            scanner,
            modals,
            collapses,
            alerts,
            dropdowns,
            popovers,
            anchored_registered: Rc::new(Cell::new(false)),
            shut_down: Rc::new(Cell::new(false)),
        }
    }

    /// Initial scan, change observation, and deferred anchored wiring.
    ///
    /// # Errors
    ///
    /// Fails only when change observation cannot be installed; the initial scan has run.
    pub fn start(&self) -> DuiResult<ScanReport> {
        if self.shut_down.get() {
            tracing::debug!("toolkit already shut down; start ignored");
            return Ok(ScanReport::default());
        }
        let report = self.scanner.scan();
        tracing::info!(
            bound = report.bound,
            failed = report.failed,
            prefix = self.markup.prefix(),
            "declarative widgets initialised"
        );
        self.load_anchored();
        self.scanner.attach()?;
        Ok(report)
    }

    /// Start loading the engine and register dropdowns/popovers once it is ready.
    pub fn load_anchored(&self) {
        if self.shut_down.get() {
            return;
        }
        let load = self.bridge.ensure_loaded();
        let scanner = Rc::clone(&self.scanner);
        let dropdowns = Rc::clone(&self.dropdowns);
        let popovers = Rc::clone(&self.popovers);
        let registered = Rc::clone(&self.anchored_registered);
        let shut_down = Rc::clone(&self.shut_down);
        self.dom.spawn_local(
            async move {
                match load.await {
                    Ok(()) if shut_down.get() => {
                        tracing::debug!("engine loaded after shutdown; anchored widgets skipped");
                    }
                    Ok(()) => {
                        if !registered.replace(true) {
                            scanner.register(Rc::clone(&dropdowns) as Rc<dyn Family>);
                            scanner.register(Rc::clone(&popovers) as Rc<dyn Family>);
                        }
                        let mut report = dropdowns.scan();
                        report += popovers.scan();
                        tracing::info!(bound = report.bound, "anchored widgets initialised");
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "anchored widgets disabled");
                    }
                }
            }
            .boxed_local(),
        );
    }

    /// Stop observing, then clean up every family. The toolkit cannot be restarted.
    pub fn shutdown(&self) {
        self.shut_down.set(true);
        self.scanner.detach();
        self.scanner.cleanup();
    }

    /// Whether [`Toolkit::shutdown`] has run.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.get()
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ToolkitConfig {
        &self.config
    }

    /// Shared scanner.
    #[must_use]
    pub fn scanner(&self) -> &Rc<Scanner<D>> {
        &self.scanner
    }

    /// Shared positioning bridge.
    #[must_use]
    pub fn bridge(&self) -> &Rc<PositioningBridge<D::Node>> {
        &self.bridge
    }

    /// Host DOM.
    #[must_use]
    pub fn dom(&self) -> &Rc<D> {
        &self.dom
    }

    /// Markup vocabulary in use.
    #[must_use]
    pub fn markup(&self) -> &Markup {
        &self.markup
    }

    /// Modal family.
    #[must_use]
    pub fn modals(&self) -> &Rc<ModalFamily<D>> {
        &self.modals
    }

    /// Collapse family.
    #[must_use]
    pub fn collapses(&self) -> &Rc<CollapseFamily<D>> {
        &self.collapses
    }

    /// Alert family.
    #[must_use]
    pub fn alerts(&self) -> &Rc<AlertFamily<D>> {
        &self.alerts
    }

    /// Dropdown family.
    #[must_use]
    pub fn dropdowns(&self) -> &Rc<AnchoredFamily<D>> {
        &self.dropdowns
    }

    /// Popover family.
    #[must_use]
    pub fn popovers(&self) -> &Rc<AnchoredFamily<D>> {
        &self.popovers
    }
}
