//! Recording positioning engine and controllable loader.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dui_core::positioning::Positioned;
use dui_core::{
    DuiError, DuiResult, EngineLoader, PositioningBridge, PositioningEngine, PositioningOptions,
};
use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;

use crate::dom::FakeNode;

/// One engine interaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineCall {
    /// Instance created for the pair.
    Create {
        /// Anchor node.
        reference: FakeNode,
        /// Positioned node.
        content: FakeNode,
        /// Requested options.
        options: PositioningOptions,
    },
    /// Instance recomputed.
    Update(FakeNode),
    /// Instance released.
    Destroy(FakeNode),
}

/// Engine that records every call.
#[derive(Debug, Default)]
pub struct FakeEngine {
    calls: Rc<RefCell<Vec<EngineCall>>>,
}

impl FakeEngine {
    /// Calls so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.borrow().clone()
    }

    /// Number of live instances (created minus destroyed).
    #[must_use]
    pub fn live(&self) -> usize {
        let calls = self.calls.borrow();
        let created = calls
            .iter()
            .filter(|call| matches!(call, EngineCall::Create { .. }))
            .count();
        let destroyed = calls
            .iter()
            .filter(|call| matches!(call, EngineCall::Destroy(_)))
            .count();
        created.saturating_sub(destroyed)
    }
}

struct FakeInstance {
    content: FakeNode,
    calls: Rc<RefCell<Vec<EngineCall>>>,
}

impl Positioned for FakeInstance {
    fn update(&self) {
        self.calls.borrow_mut().push(EngineCall::Update(self.content));
    }

    fn destroy(self: Box<Self>) {
        self.calls.borrow_mut().push(EngineCall::Destroy(self.content));
    }
}

impl PositioningEngine<FakeNode> for FakeEngine {
    fn create(
        &self,
        reference: &FakeNode,
        content: &FakeNode,
        options: &PositioningOptions,
    ) -> DuiResult<Box<dyn Positioned>> {
        self.calls.borrow_mut().push(EngineCall::Create {
            reference: *reference,
            content: *content,
            options: *options,
        });
        Ok(Box::new(FakeInstance {
            content: *content,
            calls: Rc::clone(&self.calls),
        }))
    }
}

/// Loader that counts invocations and resolves on command.
#[derive(Debug)]
pub struct FakeLoader {
    loads: Cell<usize>,
    outcome: DuiResult<()>,
    gate: RefCell<Option<oneshot::Receiver<()>>>,
}

impl FakeLoader {
    /// Loader that succeeds immediately.
    #[must_use]
    pub fn ready() -> Rc<Self> {
        Rc::new(Self {
            loads: Cell::new(0),
            outcome: Ok(()),
            gate: RefCell::new(None),
        })
    }

    /// Loader that fails with `detail`.
    #[must_use]
    pub fn failing(detail: &str) -> Rc<Self> {
        Rc::new(Self {
            loads: Cell::new(0),
            outcome: Err(DuiError::DependencyLoad {
                detail: detail.to_string(),
            }),
            gate: RefCell::new(None),
        })
    }

    /// Loader that succeeds once the returned sender fires.
    #[must_use]
    pub fn gated() -> (Rc<Self>, oneshot::Sender<()>) {
        let (sender, receiver) = oneshot::channel();
        let loader = Rc::new(Self {
            loads: Cell::new(0),
            outcome: Ok(()),
            gate: RefCell::new(Some(receiver)),
        });
        (loader, sender)
    }

    /// How many times the bridge asked for a load.
    #[must_use]
    pub fn loads(&self) -> usize {
        self.loads.get()
    }
}

impl EngineLoader for FakeLoader {
    fn load(&self) -> LocalBoxFuture<'static, DuiResult<()>> {
        self.loads.set(self.loads.get() + 1);
        let gate = self.gate.borrow_mut().take();
        let outcome = self.outcome.clone();
        async move {
            if let Some(gate) = gate {
                gate.await.map_err(|_| DuiError::DependencyLoad {
                    detail: "load abandoned".to_string(),
                })?;
            }
            outcome
        }
        .boxed_local()
    }
}

/// Bridge wired to a fresh [`FakeEngine`] and `loader`.
#[must_use]
pub fn fake_bridge(loader: &Rc<FakeLoader>) -> (Rc<PositioningBridge<FakeNode>>, Rc<FakeEngine>) {
    let engine = Rc::new(FakeEngine::default());
    let bridge = PositioningBridge::new(
        Rc::clone(&engine) as Rc<dyn PositioningEngine<FakeNode>>,
        Rc::clone(loader) as Rc<dyn EngineLoader>,
    );
    (Rc::new(bridge), engine)
}
