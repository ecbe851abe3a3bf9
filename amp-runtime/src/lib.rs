//! # Runtime Module
//!
//! Provides foundational runtime infrastructure for the playback core:
//! - Logging and tracing infrastructure
//! - Event bus for playback lifecycle notifications
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the other workspace crates
//! depend on. It establishes the logging conventions and the event
//! broadcasting mechanism through which hosts observe player lifecycles.

pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
