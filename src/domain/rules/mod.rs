// Domain rules - Naming and validation policies

use crate::domain::errors::*;
use crate::domain::model::*;

const MAX_JOB_ID_LEN: usize = 64;

/// Shortest accepted HLS segment, in seconds
pub const MIN_SEGMENT_DURATION: u32 = 1;
/// Longest accepted HLS segment, in seconds
pub const MAX_SEGMENT_DURATION: u32 = 600;

/// Naming and validation rules for job artifacts
pub struct JobRules;

impl JobRules {
    /// Job ids become directory names, so only a safe alphabet is accepted
    pub fn validate_job_id(raw: &str) -> Result<(), DomainError> {
        if raw.is_empty() {
            return Err(DomainError::BadArgs("Job id cannot be empty".to_string()));
        }
        if raw.len() > MAX_JOB_ID_LEN {
            return Err(DomainError::BadArgs(format!(
                "Job id longer than {} characters",
                MAX_JOB_ID_LEN
            )));
        }
        if let Some(bad) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(DomainError::BadArgs(format!(
                "Invalid character '{}' in job id. Allowed: letters, digits, '-' and '_'",
                bad
            )));
        }
        Ok(())
    }

    /// Directory name for a job: `<job id>-<original file name>`
    pub fn working_dir_name(job_id: &JobId, file_name: &str) -> String {
        format!("{}-{}", job_id, file_name)
    }

    /// IV fields must be 32 lowercase hex characters
    pub fn is_valid_iv_hex(value: &str) -> bool {
        value.len() == IV_LEN * 2
            && value
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    }

    /// Segment files are named by ordinal index: `0.ts`, `1.ts`, ...
    pub fn is_segment_file_name(name: &str) -> bool {
        match name.strip_suffix(".ts") {
            Some(stem) => !stem.is_empty() && stem.chars().all(|c| c.is_ascii_digit()),
            None => false,
        }
    }

    /// In-flight files never count as artifacts
    pub fn is_partial_file_name(name: &str) -> bool {
        name.starts_with(PARTIAL_PREFIX)
    }

    /// Segment duration accepted by the engine configuration
    pub fn validate_segment_duration(seconds: u32) -> Result<(), DomainError> {
        if !(MIN_SEGMENT_DURATION..=MAX_SEGMENT_DURATION).contains(&seconds) {
            return Err(DomainError::BadArgs(format!(
                "Segment duration must be between {} and {} seconds, got {}",
                MIN_SEGMENT_DURATION, MAX_SEGMENT_DURATION, seconds
            )));
        }
        Ok(())
    }
}
