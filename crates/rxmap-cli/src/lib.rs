//! Library components of the `rxnorm-mapper` command.

pub mod dashboard;
pub mod logging;
pub mod settings;
