//! Mapping orchestration.
//!
//! [`MappingEngine`] drives each source row through the pipeline:
//! 1. **Context**: build a [`rxmap_model::ProductContext`] from the row
//! 2. **Propose**: ask the model for an RxNorm concept
//! 3. **Validate**: check the candidates against RxNav
//! 4. **Finalize**: set the final status and review flag
//!
//! Records are processed one at a time with a fixed pause between them.

pub mod engine;
pub mod pacing;
pub mod progress;
pub mod settings;

pub use engine::MappingEngine;
pub use pacing::{FixedDelay, Pacer};
pub use progress::{BatchProgress, NoProgress, ProgressObserver};
pub use settings::PipelineSettings;
