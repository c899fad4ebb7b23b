// Utility modules for the ClickShield backend

pub mod check_errors;
pub mod safe_browsing_client;
pub mod url_validator;

pub use check_errors::{CheckError, CheckErrorResponse, CheckResult};
pub use safe_browsing_client::{SafeBrowsingClient, ThreatLookup, ThreatLookupError};
pub use url_validator::{expand_variants, is_hostname_valid, UrlValidator, ValidationError};
