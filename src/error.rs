use crate::parser::SourceKind;
use thiserror::Error;

/// Contract violations raised by an extractor.
///
/// Missing keys are never errors; only a root of the wrong JSON type is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("{kind} extractor expects a JSON {expected} at the root, found {found}")]
    UnexpectedRoot {
        kind: SourceKind,
        expected: &'static str,
        found: &'static str,
    },
}

pub type ExtractResult<T> = std::result::Result<T, ExtractError>;
