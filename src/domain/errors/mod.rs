// Domain errors - Error types for the domain layer

use std::fmt;

/// Domain-specific error types
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Copy, mkdir, read or write failure
    Io(String),
    /// Randomness source failure
    Crypto(String),
    /// External engine launch failure, timeout or non-zero exit
    Process(String),
    /// Archive write or finalize failure
    Archive(String),
    /// Invalid arguments or configuration
    BadArgs(String),
}

/// Error kind names surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    IoError,
    CryptoError,
    ProcessError,
    ArchiveError,
    BadArgs,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::IoError => "IO_ERROR",
            ErrorKind::CryptoError => "CRYPTO_ERROR",
            ErrorKind::ProcessError => "PROCESS_ERROR",
            ErrorKind::ArchiveError => "ARCHIVE_ERROR",
            ErrorKind::BadArgs => "BAD_ARGS",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DomainError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Io(_) => ErrorKind::IoError,
            DomainError::Crypto(_) => ErrorKind::CryptoError,
            DomainError::Process(_) => ErrorKind::ProcessError,
            DomainError::Archive(_) => ErrorKind::ArchiveError,
            DomainError::BadArgs(_) => ErrorKind::BadArgs,
        }
    }

    /// Wrap an I/O error with a short description of what was attempted
    pub fn io(action: impl fmt::Display, err: std::io::Error) -> Self {
        DomainError::Io(format!("{}: {}", action, err))
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::Io(msg) => write!(f, "I/O failure: {}", msg),
            DomainError::Crypto(msg) => write!(f, "Key generation failure: {}", msg),
            DomainError::Process(msg) => write!(f, "Transcoder failure: {}", msg),
            DomainError::Archive(msg) => write!(f, "Archive failure: {}", msg),
            DomainError::BadArgs(msg) => write!(f, "Bad arguments: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}
