//! Core engine-facing contracts.
//!
//! This module defines the interface between the runtime (platform loop)
//! and the application driving it.

mod app;

pub use app::{App, AppControl};
