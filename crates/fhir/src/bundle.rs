//! Search-set `Bundle` wrapping search results.

use crate::{FhirResult, Patient};
use serde::Serialize;

/// One matched resource in a search set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BundleEntry {
    /// Absolute or base-relative URL of the resource.
    pub full_url: Option<String>,
    pub resource: Patient,
}

/// A `searchset` bundle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bundle {
    pub entry: Vec<BundleEntry>,
}

impl Bundle {
    pub const RESOURCE_TYPE: &'static str = "Bundle";

    pub fn searchset(entry: Vec<BundleEntry>) -> Self {
        Self { entry }
    }

    /// Number of matches; search results are not paged, so this is the entry count.
    pub fn total(&self) -> usize {
        self.entry.len()
    }

    pub fn render(&self) -> FhirResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_wire()?)?)
    }

    fn to_wire(&self) -> FhirResult<BundleWire<'_>> {
        let entry = self
            .entry
            .iter()
            .map(|e| {
                Ok(BundleEntryWire {
                    full_url: e.full_url.as_deref(),
                    resource: e.resource.to_json_value()?,
                })
            })
            .collect::<FhirResult<Vec<_>>>()?;

        Ok(BundleWire {
            resource_type: Self::RESOURCE_TYPE,
            bundle_type: "searchset",
            total: self.total(),
            entry,
        })
    }
}

#[derive(Serialize)]
struct BundleWire<'a> {
    #[serde(rename = "resourceType")]
    resource_type: &'static str,
    #[serde(rename = "type")]
    bundle_type: &'static str,
    total: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    entry: Vec<BundleEntryWire<'a>>,
}

#[derive(Serialize)]
struct BundleEntryWire<'a> {
    #[serde(rename = "fullUrl", skip_serializing_if = "Option::is_none")]
    full_url: Option<&'a str>,
    resource: serde_json::Value,
}
