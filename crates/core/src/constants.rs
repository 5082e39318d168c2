//! Constants used throughout the core crate.

/// First logical id handed out by a freshly started server.
pub const DEFAULT_FIRST_LOGICAL_ID: u64 = 51;

/// Number of demo patients created at startup when seeding is enabled.
pub const DEFAULT_SEED_COUNT: usize = 10;

/// Upper bound on the configured seed count.
pub const MAX_SEED_COUNT: usize = 10_000;

/// Default REST listen address.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:8080";

/// Default path under which FHIR resources are served.
pub const DEFAULT_BASE_PATH: &str = "/fhir";

/// Logical id of the demo organisation referenced by seeded patients.
pub const DEMO_ORGANIZATION_ID: u64 = 1;
