//! Error handling module for hlspack

use thiserror::Error;

use crate::domain::errors::{DomainError, ErrorKind};
use crate::domain::model::Stage;

/// Main error type for packaging operations
#[derive(Error, Debug)]
pub enum PackError {
    /// A pipeline stage failed; the working directory is left as-is
    #[error("Stage '{stage}' failed [{kind}]")]
    Stage {
        stage: Stage,
        kind: ErrorKind,
        #[source]
        source: DomainError,
    },

    /// The job could not be set up
    #[error("Invalid job")]
    InvalidJob(#[source] DomainError),

    /// Configuration could not be loaded or validated
    #[error("Invalid configuration")]
    Config(#[source] DomainError),
}

impl PackError {
    /// Wrap a domain error raised while attempting `stage`
    pub fn stage(stage: Stage, source: DomainError) -> Self {
        PackError::Stage {
            stage,
            kind: source.kind(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PackError::Stage { kind, .. } => *kind,
            PackError::InvalidJob(e) | PackError::Config(e) => e.kind(),
        }
    }

    /// Stage that was being attempted, if the failure happened inside the pipeline
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            PackError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Result type alias for packaging operations
pub type PackResult<T> = std::result::Result<T, PackError>;
