//! Ports (trait boundaries) between the inference core and its reporting.

pub mod observer;

pub use observer::Observer;
