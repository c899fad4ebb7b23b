pub mod safe_browsing;
pub mod verdict;

// Re-export common types
pub use safe_browsing::{FindThreatMatchesRequest, FindThreatMatchesResponse, ThreatMatch};
pub use verdict::{CachedVerdict, Confidence, ThreatType, Verdict};
