use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by engine operations.
///
/// Storage failures mean nothing was persisted by the failed call and it is safe to
/// retry. Every other variant is a rejected request that left storage untouched.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Exercise not found: {category} #{index}")]
    ExerciseNotFound { category: String, index: usize },

    #[error("Exercise not found in library: {0}")]
    LibraryExerciseNotFound(String),

    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Invalid category name: {0:?}")]
    InvalidCategory(String),

    #[error("Category already exists: {0}")]
    DuplicateCategory(String),

    #[error("Rest days have no exercises")]
    RestHasNoExercises,
}

impl EngineError {
    /// True for errors caused by the request rather than the backend.
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Store(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ExerciseNotFound { .. }
                | Self::LibraryExerciseNotFound(_)
                | Self::CategoryNotFound(_)
        )
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
