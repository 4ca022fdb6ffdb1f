//! Composite key search over a paginated project.

mod criteria;
mod engine;

pub use criteria::{DateBound, NormalizedCriteria, SearchCriteria, TranslationStatus};
pub use engine::{Evaluation, SearchResult, TranslationSummary, evaluate_key, search_keys};

/// Results returned when the caller does not ask for a limit.
pub const DEFAULT_SEARCH_LIMIT: i64 = 50;
/// Upper bound applied to any requested limit.
pub const MAX_SEARCH_LIMIT: i64 = 200;
