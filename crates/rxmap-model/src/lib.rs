pub mod error;
pub mod product;
pub mod proposal;
pub mod record;
pub mod statistics;
pub mod validation;

pub use error::{ModelError, Result};
pub use product::ProductContext;
pub use proposal::{CONFIDENCE_MAX, CONFIDENCE_MIN, ConceptProposal};
pub use record::{AI_MAPPING_FAILED, FinalStatus, MappingRecord, ProcessingStage};
pub use statistics::RunStatistics;
pub use validation::{MatchKind, ValidationResult};
