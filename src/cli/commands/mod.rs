//! Subcommands of the `mace` binary.

pub mod evaluate;
pub mod run;
