//! Reporting around inference sessions
//!
//! This module provides the observer implementations the CLI attaches to a
//! [`crate::restarts::RestartController`]:
//! - Progress bar over finished restarts
//! - JSON Lines log of every restart summary

pub mod observers;

pub use observers::{JsonlObserver, ProgressObserver};

pub use crate::ports::Observer;
