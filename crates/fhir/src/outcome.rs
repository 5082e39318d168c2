//! `OperationOutcome`: structured diagnostics returned alongside failures.

use crate::FhirResult;
use serde::Serialize;

/// How serious an issue is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Fatal,
    Error,
    Warning,
    Information,
}

/// Coarse classification of an issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    Invalid,
    Required,
    NotFound,
    NotSupported,
    Processing,
    Exception,
}

/// A single issue within an [`OperationOutcome`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationOutcomeIssue {
    pub severity: IssueSeverity,
    pub code: IssueType,
    /// Human-readable detail, rendered as `details.text`.
    pub details: Option<String>,
    /// Additional diagnostic text, e.g. the offending id.
    pub diagnostics: Option<String>,
}

/// A collection of issues describing the outcome of an operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OperationOutcome {
    pub issue: Vec<OperationOutcomeIssue>,
}

impl OperationOutcome {
    pub const RESOURCE_TYPE: &'static str = "OperationOutcome";

    /// Outcome with a single issue carrying `details` text.
    pub fn single(severity: IssueSeverity, code: IssueType, details: impl Into<String>) -> Self {
        Self {
            issue: vec![OperationOutcomeIssue {
                severity,
                code,
                details: Some(details.into()),
                diagnostics: None,
            }],
        }
    }

    /// Adds diagnostics to the most recent issue.
    pub fn with_diagnostics(mut self, diagnostics: impl Into<String>) -> Self {
        if let Some(last) = self.issue.last_mut() {
            last.diagnostics = Some(diagnostics.into());
        }
        self
    }

    pub fn render(&self) -> FhirResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_wire())?)
    }

    fn to_wire(&self) -> OperationOutcomeWire<'_> {
        OperationOutcomeWire {
            resource_type: Self::RESOURCE_TYPE,
            issue: self
                .issue
                .iter()
                .map(|i| IssueWire {
                    severity: i.severity,
                    code: i.code,
                    details: i
                        .details
                        .as_deref()
                        .map(|text| CodeableConceptWire { text }),
                    diagnostics: i.diagnostics.as_deref(),
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct OperationOutcomeWire<'a> {
    #[serde(rename = "resourceType")]
    resource_type: &'static str,
    issue: Vec<IssueWire<'a>>,
}

#[derive(Serialize)]
struct IssueWire<'a> {
    severity: IssueSeverity,
    code: IssueType,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<CodeableConceptWire<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostics: Option<&'a str>,
}

#[derive(Serialize)]
struct CodeableConceptWire<'a> {
    text: &'a str,
}
