// OS randomness adapter - Key material from the operating system CSPRNG

use crate::domain::errors::*;
use crate::ports::*;
use rand::rngs::OsRng;
use rand::RngCore;

/// Randomness adapter backed by `OsRng`
pub struct OsRandomAdapter;

impl OsRandomAdapter {
    /// Create new OS randomness adapter
    pub fn new() -> Result<Self, DomainError> {
        Ok(Self)
    }
}

impl RandomPort for OsRandomAdapter {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), DomainError> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| DomainError::Crypto(format!("OS randomness unavailable: {}", e)))
    }
}
