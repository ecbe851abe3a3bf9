//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`amp-runtime`, `amp-media`, `amp-engine`). Host
//! applications can depend on `amp-workspace` and enable the documented
//! features without needing to wire each crate individually.

#[cfg(feature = "engine")]
pub use amp_engine as engine;
