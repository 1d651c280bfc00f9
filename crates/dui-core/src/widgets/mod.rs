//! Widget state machines, programmatic wrappers, and declarative families.
pub mod alert;
pub mod anchored;
mod backdrop;
pub mod collapse;
pub mod modal;
pub mod modal_family;
