//! Declarative scanning: bind markup-declared triggers and rescan on change.
//!
//! # Design
//! - Each widget family owns its registry, its trigger bindings, and the instances it
//!   created; nothing lives in module-level state.
//! - A scan is a whole-document query per marker; the registry bounds repeated scans to a
//!   set lookup per candidate.
//! - One failing candidate is logged and skipped; the rest of the scan continues.

use std::cell::{Cell, RefCell};
use std::ops::AddAssign;
use std::rc::{Rc, Weak};

use crate::dom::{Dom, EventKind, Handler, ListenTarget, ListenerId, ObserverId, Phase};
use crate::error::DuiResult;
use crate::markup::FamilyKind;
use crate::registry::Registry;

/// Outcome counters for one scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Elements newly wired.
    pub bound: usize,
    /// Elements already wired.
    pub skipped: usize,
    /// Elements or queries that failed.
    pub failed: usize,
}

impl AddAssign for ScanReport {
    fn add_assign(&mut self, other: Self) {
        self.bound += other.bound;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// A wired trigger or dismiss element.
#[derive(Clone, Debug)]
pub struct TriggerBinding<N> {
    /// Bound element.
    pub node: N,
    /// Family that bound it.
    pub family: FamilyKind,
    /// Event that activates it.
    pub event: EventKind,
    /// Listener to release on cleanup.
    pub listener: ListenerId,
}

/// A widget family with a declarative scan and a cleanup routine.
pub trait Family {
    /// Family marker.
    fn kind(&self) -> FamilyKind;
    /// Bind every not-yet-bound matching element.
    fn scan(&self) -> ScanReport;
    /// Detach every binding and tracked instance, then reset the registry.
    fn cleanup(&self);
}

/// Registry plus binding list shared by every family implementation.
#[derive(Debug)]
pub struct Bindings<N> {
    family: FamilyKind,
    registry: RefCell<Registry>,
    bound: RefCell<Vec<TriggerBinding<N>>>,
}

impl<N: Clone> Bindings<N> {
    /// Empty binding set for `family`.
    #[must_use]
    pub fn new(family: FamilyKind) -> Self {
        Self {
            family,
            registry: RefCell::new(Registry::new()),
            bound: RefCell::new(Vec::new()),
        }
    }

    /// Bind a click handler to every unbound match of `selector`.
    pub fn bind_clicks<D>(
        &self,
        dom: &D,
        selector: &str,
        make_handler: impl Fn() -> Handler<N>,
    ) -> ScanReport
    where
        D: Dom<Node = N> + ?Sized,
    {
        let mut report = ScanReport::default();
        let candidates = match dom.query_all(selector) {
            Ok(candidates) => candidates,
            Err(err) => {
                tracing::warn!(family = self.family.as_str(), selector, error = %err, "scan query failed");
                report.failed += 1;
                return report;
            }
        };
        for node in candidates {
            let key = dom.key(&node);
            if self.registry.borrow().has(key) {
                report.skipped += 1;
                continue;
            }
            match dom.listen(
                ListenTarget::Node(node.clone()),
                EventKind::Click,
                Phase::Bubble,
                make_handler(),
            ) {
                Ok(listener) => {
                    self.registry.borrow_mut().add(key);
                    self.bound.borrow_mut().push(TriggerBinding {
                        node,
                        family: self.family,
                        event: EventKind::Click,
                        listener,
                    });
                    report.bound += 1;
                }
                Err(err) => {
                    tracing::warn!(family = self.family.as_str(), error = %err, "failed to bind element");
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Release every listener, then forget membership.
    pub fn release<D>(&self, dom: &D)
    where
        D: Dom<Node = N> + ?Sized,
    {
        let bound = std::mem::take(&mut *self.bound.borrow_mut());
        for binding in &bound {
            dom.unlisten(binding.listener);
        }
        self.registry.borrow_mut().reset();
        tracing::debug!(family = self.family.as_str(), released = bound.len(), "bindings released");
    }

    /// Number of wired elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.borrow().len()
    }

    /// Whether nothing is wired.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.borrow().is_empty()
    }

    /// Snapshot of the current bindings.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TriggerBinding<N>> {
        self.bound.borrow().clone()
    }
}

/// Runs every registered family and re-runs them on document changes.
pub struct Scanner<D: Dom> {
    dom: Rc<D>,
    families: RefCell<Vec<Rc<dyn Family>>>,
    observer: Cell<Option<ObserverId>>,
    this: Weak<Self>,
}

impl<D: Dom> Scanner<D> {
    /// Scanner with no families.
    #[must_use]
    pub fn new(dom: Rc<D>) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            dom,
            families: RefCell::new(Vec::new()),
            observer: Cell::new(None),
            this: this.clone(),
        })
    }

    /// Add a family; later scans include it.
    pub fn register(&self, family: Rc<dyn Family>) {
        self.families.borrow_mut().push(family);
    }

    /// Registered family kinds, in scan order.
    #[must_use]
    pub fn kinds(&self) -> Vec<FamilyKind> {
        self.families.borrow().iter().map(|family| family.kind()).collect()
    }

    /// One pass over every family.
    pub fn scan(&self) -> ScanReport {
        let families = self.families.borrow().clone();
        let mut total = ScanReport::default();
        for family in families {
            let report = family.scan();
            if report.bound > 0 || report.failed > 0 {
                tracing::debug!(
                    family = family.kind().as_str(),
                    bound = report.bound,
                    failed = report.failed,
                    "scan pass"
                );
            }
            total += report;
        }
        total
    }

    /// Rescan after every batch of body mutations. Re-attaching replaces the old observer.
    ///
    /// # Errors
    ///
    /// Fails when the document has no body or the host cannot observe it.
    pub fn attach(&self) -> DuiResult<()> {
        self.detach();
        let body = self.dom.body()?;
        let this = self.this.clone();
        let id = self.dom.observe_subtree(
            &body,
            Rc::new(move || {
                if let Some(scanner) = this.upgrade() {
                    scanner.scan();
                }
            }),
        )?;
        self.observer.set(Some(id));
        Ok(())
    }

    /// Stop observing changes.
    pub fn detach(&self) {
        if let Some(id) = self.observer.take() {
            self.dom.disconnect(id);
        }
    }

    /// Whether a change observer is installed.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.observer.get().is_some()
    }

    /// Clean up every family.
    pub fn cleanup(&self) {
        let families = self.families.borrow().clone();
        for family in families {
            family.cleanup();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_accumulate() {
        let mut total = ScanReport::default();
        total += ScanReport {
            bound: 2,
            skipped: 1,
            failed: 0,
        };
        total += ScanReport {
            bound: 0,
            skipped: 3,
            failed: 1,
        };
        assert_eq!(
            total,
            ScanReport {
                bound: 2,
                skipped: 4,
                failed: 1
            }
        );
    }
}
