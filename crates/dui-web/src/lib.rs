#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
//! Browser host for the `dui` widget toolkit.
//!
//! Implements the core's `Dom` and positioning traits over `web-sys`, installs the
//! tracing-to-console subscriber, runs the bootstrap scan, and exposes the JavaScript
//! surface (`window.Dui` plus the exported widget classes). Only the conversions in
//! [`interop`] compile natively.

pub mod interop;

#[cfg(target_arch = "wasm32")]
mod bootstrap;
#[cfg(target_arch = "wasm32")]
pub mod exports;
#[cfg(target_arch = "wasm32")]
pub mod popper;
#[cfg(target_arch = "wasm32")]
pub mod telemetry;
#[cfg(target_arch = "wasm32")]
pub mod web_dom;

#[cfg(target_arch = "wasm32")]
pub use bootstrap::{run, start};
