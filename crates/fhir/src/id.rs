//! Resource identity as it appears on the wire.
//!
//! FHIR addresses a resource version as `[Type/]id[/_history/version]`. This module parses that
//! form into its parts; turning the id part into a numeric logical id is left to the caller via
//! [`IdType::id_part_as_long`], since what a bad id means (unknown vs. malformed request) depends
//! on the operation.

use crate::{FhirError, FhirResult};
use std::fmt;
use std::str::FromStr;

const HISTORY_SEGMENT: &str = "_history";

/// A possibly type-qualified, possibly versioned resource id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IdType {
    resource_type: Option<String>,
    id_part: String,
    version_id_part: Option<String>,
}

impl IdType {
    /// Builds an id from already-split parts.
    pub fn new(id_part: impl Into<String>, version_id_part: Option<String>) -> Self {
        Self {
            resource_type: None,
            id_part: id_part.into(),
            version_id_part,
        }
    }

    /// Returns a copy qualified with `resource_type`.
    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    /// Parses `123`, `123/_history/4`, `Patient/123` or `Patient/123/_history/4`.
    ///
    /// Leading and trailing slashes are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidId`] when the value is empty or has any other shape.
    pub fn parse(value: &str) -> FhirResult<Self> {
        let segments: Vec<&str> = value.trim().trim_matches('/').split('/').collect();

        let (resource_type, id_part, version_id_part) = match segments.as_slice() {
            [id] => (None, *id, None),
            [id, HISTORY_SEGMENT, version] => (None, *id, Some(*version)),
            [resource_type, id] => (Some(*resource_type), *id, None),
            [resource_type, id, HISTORY_SEGMENT, version] => {
                (Some(*resource_type), *id, Some(*version))
            }
            _ => return Err(FhirError::InvalidId(value.to_string())),
        };

        if id_part.is_empty() || version_id_part.is_some_and(str::is_empty) {
            return Err(FhirError::InvalidId(value.to_string()));
        }

        Ok(Self {
            resource_type: resource_type.map(str::to_string),
            id_part: id_part.to_string(),
            version_id_part: version_id_part.map(str::to_string),
        })
    }

    pub fn resource_type(&self) -> Option<&str> {
        self.resource_type.as_deref()
    }

    pub fn id_part(&self) -> &str {
        &self.id_part
    }

    pub fn version_id_part(&self) -> Option<&str> {
        self.version_id_part.as_deref()
    }

    /// Parses the id part as a numeric logical id.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidId`] if the id part is not an unsigned decimal integer.
    pub fn id_part_as_long(&self) -> FhirResult<u64> {
        self.id_part
            .parse::<u64>()
            .map_err(|_| FhirError::InvalidId(self.to_string()))
    }

    /// The same id without resource type or version.
    pub fn to_unqualified_versionless(&self) -> Self {
        Self::new(self.id_part.clone(), None)
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(resource_type) = &self.resource_type {
            write!(f, "{resource_type}/")?;
        }
        write!(f, "{}", self.id_part)?;
        if let Some(version) = &self.version_id_part {
            write!(f, "/{HISTORY_SEGMENT}/{version}")?;
        }
        Ok(())
    }
}

impl FromStr for IdType {
    type Err = FhirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
