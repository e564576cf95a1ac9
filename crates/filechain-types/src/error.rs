use thiserror::Error;

/// Errors produced by type construction and caller-side validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("file name must not be empty")]
    EmptyName,

    #[error("content address must not be empty")]
    EmptyContentAddress,

    #[error("difficulty {requested} out of range: at most {max} leading zeros fit a digest")]
    DifficultyOutOfRange { requested: u32, max: u32 },
}
