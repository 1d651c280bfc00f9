#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, unreachable_pub)]
#![allow(clippy::module_name_repetitions)]
//! DOM-free core of the `dui` widget toolkit.
//!
//! Widgets (modal, dropdown, popover, collapse, alert) are wired either declaratively, by
//! scanning `data-dui-*` markup, or programmatically through small wrappers. The page is
//! reached only through the [`dom::Dom`] host trait and the positioning engine only
//! through [`positioning::PositioningEngine`], so everything here runs in native tests.

pub mod config;
pub mod dom;
pub mod error;
pub mod markup;
pub mod positioning;
pub mod presentation;
pub mod registry;
pub mod scanner;
pub mod toolkit;
pub mod widgets;

pub use config::{AnchoredConfig, ModalConfig, Offset, Placement, ToolkitConfig};
pub use dom::{Dom, DomEvent, EventKind, ListenTarget, NodeKey, Phase};
pub use error::{DuiError, DuiResult};
pub use markup::{FamilyKind, Markup};
pub use positioning::{EngineLoader, PositioningBridge, PositioningEngine, PositioningOptions};
pub use presentation::Visibility;
pub use registry::Registry;
pub use scanner::{Family, ScanReport, Scanner};
pub use toolkit::Toolkit;
pub use widgets::alert::Alert;
pub use widgets::anchored::{AnchoredKind, AnchoredWidget};
pub use widgets::collapse::Collapse;
pub use widgets::modal::Modal;
