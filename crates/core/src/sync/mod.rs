mod engine;
mod error;
mod outcome;

pub use engine::SyncEngine;
pub use error::{SyncError, SyncStageError};
pub use outcome::{SubjectOutcome, SyncReport};
