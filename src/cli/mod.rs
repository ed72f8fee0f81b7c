//! CLI infrastructure for the MACE toolkit
//!
//! This module provides the command-line interface for running inference on
//! an annotation table and scoring predictions against a gold standard.

pub mod commands;
pub mod logging;
pub mod output;
