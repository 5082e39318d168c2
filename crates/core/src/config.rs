//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Environment variables are read by the binaries only; the helpers
//! here turn optional raw values into typed settings.

use crate::constants::{DEFAULT_FIRST_LOGICAL_ID, DEFAULT_SEED_COUNT, MAX_SEED_COUNT};
use crate::store::LogicalId;
use crate::{PatientError, PatientResult};
use std::str::FromStr;

/// Core configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreConfig {
    first_logical_id: LogicalId,
    seed_demo_data: bool,
    seed_count: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            first_logical_id: LogicalId::new(DEFAULT_FIRST_LOGICAL_ID),
            seed_demo_data: true,
            seed_count: DEFAULT_SEED_COUNT,
        }
    }
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`PatientError::InvalidInput`] if `seed_count` exceeds [`MAX_SEED_COUNT`], or if
    /// seeding is enabled and the ids from `first_logical_id` up to `u64::MAX` cannot hold
    /// `seed_count` patients.
    pub fn new(
        first_logical_id: LogicalId,
        seed_demo_data: bool,
        seed_count: usize,
    ) -> PatientResult<Self> {
        if seed_count > MAX_SEED_COUNT {
            return Err(PatientError::InvalidInput(format!(
                "seed count {seed_count} exceeds maximum of {MAX_SEED_COUNT}"
            )));
        }

        let last_seeded = (seed_count as u64)
            .checked_sub(1)
            .map(|offset| first_logical_id.value().checked_add(offset));
        if seed_demo_data && matches!(last_seeded, Some(None)) {
            return Err(PatientError::InvalidInput(format!(
                "first logical id {first_logical_id} leaves no room for {seed_count} demo patients"
            )));
        }

        Ok(Self {
            first_logical_id,
            seed_demo_data,
            seed_count,
        })
    }

    pub fn first_logical_id(&self) -> LogicalId {
        self.first_logical_id
    }

    pub fn seed_demo_data(&self) -> bool {
        self.seed_demo_data
    }

    pub fn seed_count(&self) -> usize {
        self.seed_count
    }
}

/// Parse an optional raw value, treating `None` and empty/whitespace as "use the default".
fn parse_env_value<T: FromStr>(name: &str, value: Option<String>) -> PatientResult<Option<T>> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(|v| {
            v.parse::<T>()
                .map_err(|_| PatientError::InvalidInput(format!("invalid value for {name}: '{v}'")))
        })
        .transpose()
}

/// Parse the seed-demo flag (`true`/`false`). Defaults to `true`.
pub fn seed_demo_from_env_value(value: Option<String>) -> PatientResult<bool> {
    Ok(parse_env_value("FHIRSTARTER_SEED_DEMO", value)?.unwrap_or(true))
}

/// Parse the seed count. Defaults to [`DEFAULT_SEED_COUNT`].
pub fn seed_count_from_env_value(value: Option<String>) -> PatientResult<usize> {
    Ok(parse_env_value("FHIRSTARTER_SEED_COUNT", value)?.unwrap_or(DEFAULT_SEED_COUNT))
}

/// Parse the first logical id. Defaults to [`DEFAULT_FIRST_LOGICAL_ID`].
pub fn first_logical_id_from_env_value(value: Option<String>) -> PatientResult<LogicalId> {
    Ok(LogicalId::new(
        parse_env_value("FHIRSTARTER_FIRST_ID", value)?.unwrap_or(DEFAULT_FIRST_LOGICAL_ID),
    ))
}
