#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

//! Shared test helpers for the widget suites.
//! Layout: dom.rs (in-memory host DOM), selector.rs (selector subset), positioning.rs
//! (recording engine and gated loader), logging.rs (test subscriber).

pub mod dom;
pub mod logging;
pub mod positioning;
mod selector;

pub use dom::{FakeDom, FakeNode, NodeSnapshot};
pub use logging::init_test_logging;
pub use positioning::{EngineCall, FakeEngine, FakeLoader, fake_bridge};
